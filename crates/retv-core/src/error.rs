//! Error taxonomy for the reconciliation core.
//!
//! "Repair not complete" is deliberately absent here — it is a valid,
//! reportable outcome (`reconcile::Outcome::NotComplete`), not an error.
//! Likewise a rejected per-record update during an archival batch is
//! captured in the batch report, never raised.

use retv_service::ServiceError;

/// Errors produced by the reconciliation core.
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    /// No repair record matches the given identifier.
    #[error("repair not found: {0}")]
    RepairNotFound(String),

    /// No graded defect records match the given submission identifier.
    #[error("no graded defects found for submission: {0}")]
    SubmissionNotFound(String),

    /// A service record was missing a required attribute.
    #[error("malformed service record, missing field: {field}")]
    MissingField { field: String },

    /// A service record attribute carried an unusable value.
    #[error("malformed service record, field {field} has invalid value: {value}")]
    InvalidField { field: String, value: String },

    /// Query or update transport failure at the service boundary.
    #[error("feature service error: {0}")]
    Service(ServiceError),
}

impl From<ServiceError> for ReconError {
    fn from(err: ServiceError) -> Self {
        // Record-shape problems keep their identity; everything else is a
        // service failure.
        match err {
            ServiceError::MissingField { field } => ReconError::MissingField { field },
            ServiceError::InvalidField { field, value } => {
                ReconError::InvalidField { field, value }
            }
            other => ReconError::Service(other),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, ReconError>;
