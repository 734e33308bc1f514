//! Televised inspection submissions.

use retv_service::RawRecord;
use serde::{Deserialize, Serialize};

use crate::domain::status::InspectionStatus;
use crate::error::Result;

pub const NAME_FIELD: &str = "InspectionName";
pub const SEGMENT_ID_FIELD: &str = "SEGMENT_ID";
pub const STATUS_FIELD: &str = "STATUS";
pub const LINE_TO_POINT_FIELD: &str = "LineToPoint";

const COUNT_FIELDS: [&str; 6] = [
    "Count_Level0",
    "Count_Level1",
    "Count_Level2",
    "Count_Level3",
    "Count_Level4",
    "Count_Level5",
];

/// Per-grade defect counts recorded on an inspection, six ordered severity
/// buckets from grade 0 to grade 5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCounts {
    pub level0: u32,
    pub level1: u32,
    pub level2: u32,
    pub level3: u32,
    pub level4: u32,
    pub level5: u32,
}

impl GradeCounts {
    /// Count for one grade; `None` for grades outside 0–5.
    pub fn level(&self, grade: u8) -> Option<u32> {
        match grade {
            0 => Some(self.level0),
            1 => Some(self.level1),
            2 => Some(self.level2),
            3 => Some(self.level3),
            4 => Some(self.level4),
            5 => Some(self.level5),
            _ => None,
        }
    }

    /// Sum across all six grades.
    pub fn total(&self) -> u32 {
        self.level0 + self.level1 + self.level2 + self.level3 + self.level4 + self.level5
    }
}

/// A recorded survey event on a segment, carrying the line-to-point key used
/// to correlate defects back to the segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    /// Submission name, e.g. `43 - O&M 6-9`.
    pub name: String,

    /// Segment the survey covered.
    pub segment_id: String,

    /// Survey status; `FlaggedForReinspection` marks it superseded.
    pub status: InspectionStatus,

    /// Spatial-reference key shared with the defect records of this survey.
    pub line_to_point: String,

    /// Per-grade defect counts for the submission.
    pub grade_counts: GradeCounts,
}

impl Inspection {
    /// Typed view over one raw inspection record.
    pub fn from_record(record: &RawRecord) -> Result<Self> {
        let counts = GradeCounts {
            level0: record.u32_field(COUNT_FIELDS[0])?,
            level1: record.u32_field(COUNT_FIELDS[1])?,
            level2: record.u32_field(COUNT_FIELDS[2])?,
            level3: record.u32_field(COUNT_FIELDS[3])?,
            level4: record.u32_field(COUNT_FIELDS[4])?,
            level5: record.u32_field(COUNT_FIELDS[5])?,
        };
        Ok(Inspection {
            name: record.str_field(NAME_FIELD)?.to_string(),
            segment_id: record.str_field(SEGMENT_ID_FIELD)?.to_string(),
            status: InspectionStatus::from(record.str_field(STATUS_FIELD)?.to_string()),
            line_to_point: record.str_field(LINE_TO_POINT_FIELD)?.to_string(),
            grade_counts: counts,
        })
    }

    /// Whether this survey has been superseded and awaits re-inspection.
    pub fn is_flagged(&self) -> bool {
        self.status == InspectionStatus::FlaggedForReinspection
    }
}
