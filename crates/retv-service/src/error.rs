//! Error types for the feature-service boundary.

use thiserror::Error;

/// Errors produced by the feature-service layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A required attribute was absent (or null) on a service record.
    #[error("record missing required field: {field}")]
    MissingField { field: String },

    /// An attribute was present but carried a value the caller cannot use.
    #[error("record field {field} has invalid value: {value}")]
    InvalidField { field: String, value: String },

    /// Transport-level failure talking to the service.
    #[error("service transport failed: {0}")]
    Transport(String),

    /// The service answered, but with a body we could not interpret.
    #[error("malformed service response: {0}")]
    Malformed(String),

    /// The record handed to `update` carried no object id.
    #[error("update record has no object id")]
    NoObjectId,
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Malformed(err.to_string())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
