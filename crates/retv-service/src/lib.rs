//! Feature-service boundary for retv.
//!
//! This crate defines the contract between the reconciliation core and the
//! remote feature dataset:
//! - `FeatureService`: filtered queries and per-record attribute updates
//! - `RawRecord`: one service record as a field-name → value mapping
//! - `Filter`: typed equality/comparison predicates rendered to a where clause
//!
//! The trait is async and backend-agnostic. `RestFeatureService` talks to the
//! hosted dataset over its REST API; an in-memory fake is provided for
//! testing via the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod fakes;
pub mod filter;
pub mod record;
pub mod rest;

pub use error::{ServiceError, ServiceResult};
pub use filter::Filter;
pub use record::{RawRecord, OBJECT_ID_FIELD};
pub use rest::{LayerMap, RestFeatureService, ServiceConfig};

/// The named record collections ("layers") the reconciliation core touches.
///
/// The hosted dataset exposes these as numeric layer indices; `LayerMap`
/// owns that mapping so the core can speak in names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Graded defect observations, keyed by object id.
    Defects,
    /// Repair work orders, one per maintenance action.
    Repairs,
    /// Televised survey submissions, one per inspection run.
    Inspections,
}

impl Collection {
    /// Stable name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Defects => "defects",
            Collection::Repairs => "repairs",
            Collection::Inspections => "inspections",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-record result of an attribute update.
///
/// A failed outcome is a normal return value — the service reports it per
/// record and the caller decides what to do. `Err` from `update` is reserved
/// for transport-level failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateOutcome {
    /// Object id of the record the outcome applies to.
    pub object_id: i64,
    /// Whether the service accepted the update.
    pub success: bool,
    /// Service-reported cause when `success` is false.
    pub error: Option<String>,
}

/// Remote feature dataset access.
///
/// Guarantees:
/// - `query` returns zero or more records; an empty result is not an error.
/// - `update` submits exactly one record's attributes and reports the
///   outcome for that record only. No cross-record atomicity is offered by
///   the service, so callers issue one call per record.
/// - Neither method retries. Retry policy, if any, lives in implementations.
#[async_trait]
pub trait FeatureService: Send + Sync {
    /// Run a filtered query against a collection.
    async fn query(&self, collection: Collection, filter: &Filter)
        -> ServiceResult<Vec<RawRecord>>;

    /// Submit one record's changed attributes. The record must carry its
    /// object id.
    async fn update(&self, collection: Collection, record: &RawRecord)
        -> ServiceResult<UpdateOutcome>;
}
