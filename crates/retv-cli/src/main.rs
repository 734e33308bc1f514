//! retv — defect reconciliation for the sewer management feature service.
//!
//! ## Commands
//!
//! - `archive`: correlate a completed repair to the defects its prior
//!   flagged inspections observed, confirm, and retire them
//! - `grades`: fetch a submission's graded defects and group them by
//!   severity for review
//!
//! Connection settings come from the environment: `RETV_SERVICE_URL` and,
//! for secured services, `RETV_SERVICE_TOKEN`.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use retv_core::{
    ApprovalGate, ArchiveWorkflow, AutoApprove, BatchSummary, Categorizer, Decision,
};
use retv_service::{FeatureService, RestFeatureService};

#[derive(Parser)]
#[command(name = "retv")]
#[command(author = "Asset Data Services")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile repairs with flagged inspections and retire superseded defects", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive the defects superseded by a completed repair
    Archive {
        /// Repair work-order identifier, e.g. "2023-SNL71"
        #[arg(short, long)]
        repair_id: String,

        /// Skip the confirmation prompt and proceed
        #[arg(long)]
        yes: bool,
    },

    /// Review a submission's defects grouped by severity grade
    Grades {
        /// Inspection submission name
        #[arg(short, long)]
        submission: String,
    },
}

/// Blocking console confirmation. Invoked once per archive run, after the
/// candidate summary is printed and before any record is mutated.
struct ConsoleGate;

impl ApprovalGate for ConsoleGate {
    fn decide(&self, summary: &BatchSummary) -> Decision {
        println!("Inspections impacted: {}", summary.inspections);
        println!(
            "Defects impacted: {} ({} already archived, will be skipped)",
            summary.candidates, summary.already_archived
        );
        print!("Proceed? [y/N] ");
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return Decision::Declined;
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Decision::Approved,
            _ => Decision::Declined,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    retv_core::init_tracing(cli.json, level);

    let service: Arc<dyn FeatureService> = Arc::new(
        RestFeatureService::from_env().context("Failed to create feature-service client")?,
    );

    match cli.command {
        Commands::Archive { repair_id, yes } => cmd_archive(service, &repair_id, yes).await,
        Commands::Grades { submission } => cmd_grades(service, &submission).await,
    }
}

async fn cmd_archive(
    service: Arc<dyn FeatureService>,
    repair_id: &str,
    yes: bool,
) -> Result<()> {
    let workflow = ArchiveWorkflow::new(service);
    let report = if yes {
        workflow.run(repair_id, &AutoApprove).await?
    } else {
        workflow.run(repair_id, &ConsoleGate).await?
    };
    print!("{}", report.render_text());
    Ok(())
}

async fn cmd_grades(service: Arc<dyn FeatureService>, submission: &str) -> Result<()> {
    let review = Categorizer::new(service)
        .fetch_and_categorize(submission)
        .await?;
    print!("{}", review.render_text());
    Ok(())
}
