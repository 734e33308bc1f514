//! Graded defect records.

use retv_service::{RawRecord, OBJECT_ID_FIELD};
use serde::{Deserialize, Serialize};

use crate::domain::status::{DefectStatus, RETV_MARKER};
use crate::error::{ReconError, Result};

pub const INSPECTION_NAME_FIELD: &str = "InspectionName";
pub const LINE_TO_POINT_FIELD: &str = "LineToPoint";
pub const GRADE_FIELD: &str = "Grade";
pub const CODE_FIELD: &str = "PACP_Code";
pub const DISTANCE_FIELD: &str = "Distance";
pub const STATUS_FIELD: &str = "Status";

/// A graded anomaly observed during a survey, correlated to its inspection
/// (and through it, its segment) by the line-to-point key.
///
/// `status` is the only field the core ever mutates, and only through
/// [`Defect::archived_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    /// Service record key.
    pub object_id: i64,

    /// Spatial-reference key back to the owning inspection.
    pub line_to_point: String,

    /// Severity grade 0–5; `None` means ungraded.
    pub grade: Option<u8>,

    /// PACP observation code, e.g. `FL` or `RFJ`.
    pub code: String,

    /// Distance along the segment, in survey units.
    pub distance: f64,

    /// Current lifecycle status.
    pub status: DefectStatus,
}

impl Defect {
    /// Typed view over one raw defect record.
    ///
    /// A grade outside 0–5 is rejected; an absent or null grade is a valid
    /// ungraded defect.
    pub fn from_record(record: &RawRecord) -> Result<Self> {
        let grade = match record.opt_int_field(GRADE_FIELD)? {
            None => None,
            Some(g) if (0..=5).contains(&g) => Some(g as u8),
            Some(g) => {
                return Err(ReconError::InvalidField {
                    field: GRADE_FIELD.to_string(),
                    value: g.to_string(),
                })
            }
        };
        Ok(Defect {
            object_id: record.object_id()?,
            line_to_point: record.str_field(LINE_TO_POINT_FIELD)?.to_string(),
            grade,
            code: record.str_field(CODE_FIELD)?.to_string(),
            distance: record.float_field(DISTANCE_FIELD)?,
            status: DefectStatus::from(record.str_field(STATUS_FIELD)?.to_string()),
        })
    }

    /// Whether this defect has already been archived.
    pub fn is_archived(&self) -> bool {
        self.status.is_archived()
    }

    /// Attribute update that retires this defect: its object id plus the
    /// archived status marker, nothing else.
    pub fn archived_record(&self) -> RawRecord {
        RawRecord::new()
            .with(OBJECT_ID_FIELD, self.object_id)
            .with(STATUS_FIELD, RETV_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RawRecord {
        RawRecord::new()
            .with(OBJECT_ID_FIELD, 41)
            .with(LINE_TO_POINT_FIELD, "LTP-1")
            .with(GRADE_FIELD, 3)
            .with(CODE_FIELD, "FL")
            .with(DISTANCE_FIELD, 12.5)
            .with(STATUS_FIELD, "Active")
    }

    #[test]
    fn test_from_record() {
        let defect = Defect::from_record(&record()).unwrap();
        assert_eq!(defect.object_id, 41);
        assert_eq!(defect.grade, Some(3));
        assert_eq!(defect.code, "FL");
        assert!(!defect.is_archived());
    }

    #[test]
    fn test_null_grade_is_ungraded() {
        let mut rec = record();
        rec.set(GRADE_FIELD, serde_json::Value::Null);
        let defect = Defect::from_record(&rec).unwrap();
        assert_eq!(defect.grade, None);
    }

    #[test]
    fn test_out_of_range_grade_rejected() {
        let mut rec = record();
        rec.set(GRADE_FIELD, 7);
        let err = Defect::from_record(&rec).unwrap_err();
        assert!(matches!(err, ReconError::InvalidField { field, .. } if field == GRADE_FIELD));
    }

    #[test]
    fn test_archived_record_touches_status_only() {
        let defect = Defect::from_record(&record()).unwrap();
        let update = defect.archived_record();
        assert_eq!(update.object_id().unwrap(), 41);
        assert_eq!(update.str_field(STATUS_FIELD).unwrap(), RETV_MARKER);
        assert!(update.get(GRADE_FIELD).is_none());
        assert!(update.get(DISTANCE_FIELD).is_none());
    }

    #[test]
    fn test_archived_status_parsed() {
        let mut rec = record();
        rec.set(STATUS_FIELD, RETV_MARKER);
        let defect = Defect::from_record(&rec).unwrap();
        assert!(defect.is_archived());
    }
}
