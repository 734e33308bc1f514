//! Status markers and their wire values.

use serde::{Deserialize, Serialize};

/// Wire marker for "superseded by a newer survey" — carried by both
/// re-inspection-flagged inspections and archived defects. The embedded
/// apostrophe is part of the production value.
pub const RETV_MARKER: &str = "re-tv'd";

/// Wire marker for a finished repair.
pub const COMPLETE_MARKER: &str = "Complete";

/// Status of a repair work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RepairStatus {
    Pending,
    Complete,
    /// Any other value the dataset carries; preserved verbatim.
    Other(String),
}

impl From<String> for RepairStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            COMPLETE_MARKER => RepairStatus::Complete,
            "Pending" => RepairStatus::Pending,
            _ => RepairStatus::Other(s),
        }
    }
}

impl From<RepairStatus> for String {
    fn from(status: RepairStatus) -> Self {
        match status {
            RepairStatus::Complete => COMPLETE_MARKER.to_string(),
            RepairStatus::Pending => "Pending".to_string(),
            RepairStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepairStatus::Complete => write!(f, "{COMPLETE_MARKER}"),
            RepairStatus::Pending => write!(f, "Pending"),
            RepairStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Status of an inspection submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InspectionStatus {
    /// Superseded survey flagged for re-inspection (`re-tv'd`).
    FlaggedForReinspection,
    Other(String),
}

impl From<String> for InspectionStatus {
    fn from(s: String) -> Self {
        if s == RETV_MARKER {
            InspectionStatus::FlaggedForReinspection
        } else {
            InspectionStatus::Other(s)
        }
    }
}

impl From<InspectionStatus> for String {
    fn from(status: InspectionStatus) -> Self {
        match status {
            InspectionStatus::FlaggedForReinspection => RETV_MARKER.to_string(),
            InspectionStatus::Other(s) => s,
        }
    }
}

/// Status of a defect record — the only field the core ever mutates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DefectStatus {
    Active,
    /// Retired by a completed repair (`re-tv'd` on the wire).
    Archived,
    Other(String),
}

impl DefectStatus {
    /// Whether this defect has already been archived.
    pub fn is_archived(&self) -> bool {
        matches!(self, DefectStatus::Archived)
    }
}

impl From<String> for DefectStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            RETV_MARKER => DefectStatus::Archived,
            "Active" => DefectStatus::Active,
            _ => DefectStatus::Other(s),
        }
    }
}

impl From<DefectStatus> for String {
    fn from(status: DefectStatus) -> Self {
        match status {
            DefectStatus::Archived => RETV_MARKER.to_string(),
            DefectStatus::Active => "Active".to_string(),
            DefectStatus::Other(s) => s,
        }
    }
}
