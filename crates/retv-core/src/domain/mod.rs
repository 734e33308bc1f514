//! Domain models for retv.
//!
//! Canonical typed views over the raw service records:
//! - `Repair`: a maintenance work order tied to one segment
//! - `Inspection`: a televised survey submission with per-grade defect counts
//! - `Defect`: a graded anomaly correlated to an inspection by line-to-point
//!
//! Each wraps exactly one raw record; construction fails when a required
//! attribute is absent or malformed. Models never touch the service.

pub mod defect;
pub mod inspection;
pub mod repair;
pub mod status;

pub use defect::Defect;
pub use inspection::{GradeCounts, Inspection};
pub use repair::Repair;
pub use status::{DefectStatus, InspectionStatus, RepairStatus, COMPLETE_MARKER, RETV_MARKER};
