//! retv core library.
//!
//! Reconciles physical-asset inspection records with defect records in the
//! remote feature dataset:
//! - `reconcile`: maps a completed repair to the prior flagged inspections
//!   of its segment and the defects they observed
//! - `archive`: confirmation-gated batch retirement of those defects
//! - `categorize`: severity-grade bucketing of a submission's defects
//!
//! All service access goes through the `retv_service::FeatureService`
//! boundary; the core holds no persistent state of its own.

pub mod archive;
pub mod categorize;
pub mod domain;
pub mod error;
pub mod gate;
pub mod reconcile;
pub mod telemetry;

// Domain entities
pub use domain::{
    Defect, DefectStatus, GradeCounts, Inspection, InspectionStatus, Repair, RepairStatus,
    COMPLETE_MARKER, RETV_MARKER,
};

// Errors
pub use error::{ReconError, Result};

// Engines and workflows
pub use archive::{
    ArchivePlan, ArchiveReport, ArchiveWorkflow, BatchSummary, Disposition, RecordOutcome,
};
pub use categorize::{categorize, Categorizer, GradeBuckets, SubmissionReview};
pub use gate::{ApprovalGate, AutoApprove, AutoDecline, CountingGate, Decision};
pub use reconcile::{
    segment_for_line_to_point, Diagnostic, Outcome, Reconciler, Reconciliation,
};

pub use telemetry::init_tracing;
