//! Repair work orders.

use retv_service::RawRecord;
use serde::{Deserialize, Serialize};

use crate::domain::status::RepairStatus;
use crate::error::Result;

pub const REPAIR_ID_FIELD: &str = "RepairID";
pub const STATUS_FIELD: &str = "Status";
pub const SEGMENT_ID_FIELD: &str = "SEGMENT_ID";

/// A maintenance action tied to one segment. Read-only: sourced from the
/// service, never mutated by this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    /// Work-order identifier, e.g. `2023-SNL71`.
    pub repair_id: String,

    /// Completion status.
    pub status: RepairStatus,

    /// The segment this repair was performed on.
    pub segment_id: String,
}

impl Repair {
    /// Typed view over one raw repair record.
    pub fn from_record(record: &RawRecord) -> Result<Self> {
        Ok(Repair {
            repair_id: record.str_field(REPAIR_ID_FIELD)?.to_string(),
            status: RepairStatus::from(record.str_field(STATUS_FIELD)?.to_string()),
            segment_id: record.str_field(SEGMENT_ID_FIELD)?.to_string(),
        })
    }

    /// Whether the repair has been completed.
    pub fn is_complete(&self) -> bool {
        self.status == RepairStatus::Complete
    }
}
