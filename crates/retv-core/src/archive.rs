//! Archival workflow — confirmation-gated batch retirement of defects.
//!
//! Split into an explicit request/response boundary:
//! - [`ArchiveWorkflow::prepare`] correlates a repair to its candidate
//!   defects and returns a pending [`ArchivePlan`] with a batch summary.
//! - [`ArchiveWorkflow::commit`] executes a plan: per-record updates,
//!   strictly sequential, best-effort (one failure never aborts the rest).
//! - [`ArchiveWorkflow::run`] composes the two around a single
//!   [`ApprovalGate`] consultation for interactive use.
//!
//! Re-archiving is detected and skipped, so committing the same repair twice
//! is harmless: the second run reports every candidate as skipped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use retv_service::{Collection, FeatureService};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::gate::ApprovalGate;
use crate::reconcile::{Reconciler, Reconciliation};

/// Counts presented to the gate before any record is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Prior flagged inspections on the repaired segment.
    pub inspections: usize,
    /// Candidate defects collected across those inspections.
    pub candidates: usize,
    /// Candidates the commit phase will skip as already archived.
    pub already_archived: usize,
}

/// A pending archival batch: correlated candidates awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivePlan {
    /// Identifier for this plan instance.
    pub plan_id: Uuid,

    /// When the plan was prepared.
    pub created_at: DateTime<Utc>,

    /// The full correlation result backing this plan.
    pub reconciliation: Reconciliation,

    /// Counts shown at the confirmation step.
    pub summary: BatchSummary,
}

impl ArchivePlan {
    /// Whether there is anything to commit (repair complete).
    pub fn is_actionable(&self) -> bool {
        self.reconciliation.is_complete()
    }
}

/// How an archival run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The batch was confirmed and executed.
    Committed,
    /// The gate declined; no records were mutated.
    HaltedByUser,
    /// The repair is not complete; no records were mutated and the gate was
    /// never consulted.
    RepairNotComplete,
}

/// Per-record result of the commit phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Status transitioned to archived.
    Updated { object_id: i64 },
    /// Already archived before this batch; not resubmitted.
    SkippedAlreadyArchived { object_id: i64 },
    /// The update was rejected or the submission failed; the batch
    /// continued.
    Failed { object_id: i64, cause: String },
}

impl RecordOutcome {
    pub fn object_id(&self) -> i64 {
        match self {
            RecordOutcome::Updated { object_id }
            | RecordOutcome::SkippedAlreadyArchived { object_id }
            | RecordOutcome::Failed { object_id, .. } => *object_id,
        }
    }
}

/// Final report of an archival run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveReport {
    /// Plan this report concludes.
    pub plan_id: Uuid,

    /// The repair the batch belonged to.
    pub repair_id: String,

    /// How the run ended.
    pub disposition: Disposition,

    /// Candidates the plan held, whether or not the batch ran.
    pub total_candidates: usize,

    /// Per-record outcomes, in batch order. Empty unless committed.
    pub outcomes: Vec<RecordOutcome>,
}

impl ArchiveReport {
    /// Candidates whose status transitioned to archived.
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Updated { .. }))
            .count()
    }

    /// Candidates skipped because they were already archived.
    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::SkippedAlreadyArchived { .. }))
            .count()
    }

    /// Failed updates with their causes.
    pub fn failures(&self) -> Vec<&RecordOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Failed { .. }))
            .collect()
    }

    /// Human-readable outcome report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Archive report for repair {}\n", self.repair_id));
        let disposition = match self.disposition {
            Disposition::Committed => "committed",
            Disposition::HaltedByUser => "operation halted by user",
            Disposition::RepairNotComplete => "repair not complete",
        };
        out.push_str(&format!("- disposition: {}\n", disposition));
        out.push_str(&format!("- candidates: {}\n", self.total_candidates));
        if self.disposition == Disposition::Committed {
            out.push_str(&format!("- updated: {}\n", self.updated_count()));
            out.push_str(&format!(
                "- skipped (already archived): {}\n",
                self.skipped_count()
            ));
            let failures = self.failures();
            out.push_str(&format!("- failed: {}\n", failures.len()));
            for failure in failures {
                if let RecordOutcome::Failed { object_id, cause } = failure {
                    out.push_str(&format!("  - defect {}: {}\n", object_id, cause));
                }
            }
        }
        out
    }
}

/// Confirmation-gated batch archival over the feature-service boundary.
pub struct ArchiveWorkflow {
    service: Arc<dyn FeatureService>,
    reconciler: Reconciler,
}

impl ArchiveWorkflow {
    pub fn new(service: Arc<dyn FeatureService>) -> Self {
        let reconciler = Reconciler::new(service.clone());
        ArchiveWorkflow {
            service,
            reconciler,
        }
    }

    /// Correlate a repair and stage a pending plan.
    ///
    /// Propagates `RepairNotFound`; a not-complete repair yields a
    /// non-actionable plan that `commit` will refuse to act on.
    pub async fn prepare(&self, repair_id: &str) -> Result<ArchivePlan> {
        let reconciliation = self.reconciler.reconcile(repair_id).await?;
        let summary = BatchSummary {
            inspections: reconciliation.inspections.len(),
            candidates: reconciliation.candidates.len(),
            already_archived: reconciliation.already_archived_count(),
        };
        let plan = ArchivePlan {
            plan_id: Uuid::new_v4(),
            created_at: Utc::now(),
            reconciliation,
            summary,
        };
        info!(
            plan_id = %plan.plan_id,
            inspections = plan.summary.inspections,
            candidates = plan.summary.candidates,
            "archive plan prepared"
        );
        Ok(plan)
    }

    /// Execute a confirmed plan.
    ///
    /// Candidates are processed strictly sequentially so per-record
    /// accounting stays attributable. A rejected update or a transport
    /// failure on one record becomes that record's `Failed` outcome; the
    /// remaining batch always runs.
    pub async fn commit(&self, plan: ArchivePlan) -> Result<ArchiveReport> {
        let total_candidates = plan.reconciliation.candidates.len();
        if !plan.is_actionable() {
            warn!(repair_id = %plan.reconciliation.repair_id, "refusing to commit: repair not complete");
            return Ok(ArchiveReport {
                plan_id: plan.plan_id,
                repair_id: plan.reconciliation.repair_id,
                disposition: Disposition::RepairNotComplete,
                total_candidates,
                outcomes: Vec::new(),
            });
        }

        info!(count = total_candidates, "archiving defects");
        let mut outcomes = Vec::with_capacity(total_candidates);
        for defect in &plan.reconciliation.candidates {
            if defect.is_archived() {
                info!(object_id = defect.object_id, "defect already archived, skipping");
                outcomes.push(RecordOutcome::SkippedAlreadyArchived {
                    object_id: defect.object_id,
                });
                continue;
            }

            let outcome = self
                .service
                .update(Collection::Defects, &defect.archived_record())
                .await;
            outcomes.push(match outcome {
                Ok(result) if result.success => {
                    info!(object_id = defect.object_id, "defect archived");
                    RecordOutcome::Updated {
                        object_id: defect.object_id,
                    }
                }
                Ok(result) => {
                    let cause = result
                        .error
                        .unwrap_or_else(|| "update rejected by service".to_string());
                    warn!(object_id = defect.object_id, cause = %cause, "defect update failed");
                    RecordOutcome::Failed {
                        object_id: defect.object_id,
                        cause,
                    }
                }
                Err(err) => {
                    let cause = err.to_string();
                    warn!(object_id = defect.object_id, cause = %cause, "defect update failed");
                    RecordOutcome::Failed {
                        object_id: defect.object_id,
                        cause,
                    }
                }
            });
        }

        let report = ArchiveReport {
            plan_id: plan.plan_id,
            repair_id: plan.reconciliation.repair_id,
            disposition: Disposition::Committed,
            total_candidates,
            outcomes,
        };
        info!(
            updated = report.updated_count(),
            skipped = report.skipped_count(),
            failed = report.failures().len(),
            "archive batch committed"
        );
        Ok(report)
    }

    /// Prepare, consult the gate exactly once, then commit or halt.
    ///
    /// The gate is never consulted for a not-complete repair.
    pub async fn run(&self, repair_id: &str, gate: &dyn ApprovalGate) -> Result<ArchiveReport> {
        let plan = self.prepare(repair_id).await?;
        if !plan.is_actionable() {
            return self.commit(plan).await;
        }

        if !gate.decide(&plan.summary).is_approved() {
            info!(repair_id = %repair_id, "operation halted by user");
            return Ok(ArchiveReport {
                plan_id: plan.plan_id,
                repair_id: plan.reconciliation.repair_id,
                disposition: Disposition::HaltedByUser,
                total_candidates: plan.reconciliation.candidates.len(),
                outcomes: Vec::new(),
            });
        }

        self.commit(plan).await
    }
}
