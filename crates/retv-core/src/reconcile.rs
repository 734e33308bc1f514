//! Correlation engine: repair → segment → flagged inspections → defects.
//!
//! Given a completed repair, derives the affected segment, the prior
//! inspections on that segment flagged for re-inspection, and the defect
//! records those inspections observed (matched by the shared line-to-point
//! key). Collection never mutates anything; the skip/update decision for
//! already-archived candidates belongs to the archival workflow.

use std::collections::HashSet;
use std::sync::Arc;

use retv_service::{Collection, FeatureService, Filter};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{defect, inspection, repair, Defect, Inspection, Repair, RETV_MARKER};
use crate::error::{ReconError, Result};

/// Terminal outcome of a reconcile call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The repair is complete; candidates were collected.
    Complete,
    /// The repair exists but is not complete. Valid and reportable — not an
    /// error, and nothing was collected.
    NotComplete { status: String },
}

/// Non-fatal observations made while collecting candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Candidate is already archived; the commit phase will skip it.
    AlreadyArchived { object_id: i64 },
    /// The same defect was reached through more than one flagged inspection
    /// sharing a line-to-point key; only the first encounter is kept.
    DuplicateDropped { object_id: i64, inspection: String },
}

/// Result of correlating one repair to its candidate defects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The repair that was reconciled.
    pub repair_id: String,

    /// Segment the repair was performed on.
    pub segment_id: String,

    /// Whether candidates were collected or the repair was not complete.
    pub outcome: Outcome,

    /// Prior inspections of the segment flagged for re-inspection,
    /// in service order.
    pub inspections: Vec<Inspection>,

    /// Candidate defects in encounter order, deduplicated by object id.
    /// Already-archived candidates are included; see `diagnostics`.
    pub candidates: Vec<Defect>,

    /// Observations recorded during collection.
    pub diagnostics: Vec<Diagnostic>,
}

impl Reconciliation {
    /// Whether the repair was complete and collection ran.
    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Complete
    }

    /// Number of candidates the commit phase will skip as already archived.
    pub fn already_archived_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::AlreadyArchived { .. }))
            .count()
    }
}

/// Correlation engine over the feature-service boundary.
pub struct Reconciler {
    service: Arc<dyn FeatureService>,
}

impl Reconciler {
    pub fn new(service: Arc<dyn FeatureService>) -> Self {
        Reconciler { service }
    }

    /// Correlate a repair to the defects its completion supersedes.
    ///
    /// # Errors
    ///
    /// `RepairNotFound` when no repair matches the id; record-shape and
    /// transport errors propagate. No retry is attempted here.
    pub async fn reconcile(&self, repair_id: &str) -> Result<Reconciliation> {
        info!(repair_id = %repair_id, "querying for repair");
        let repairs = self
            .service
            .query(
                Collection::Repairs,
                &Filter::eq(repair::REPAIR_ID_FIELD, repair_id),
            )
            .await?;
        let repair_record = repairs
            .first()
            .ok_or_else(|| ReconError::RepairNotFound(repair_id.to_string()))?;
        let repair = Repair::from_record(repair_record)?;

        if !repair.is_complete() {
            warn!(repair_id = %repair_id, status = %repair.status, "repair not complete");
            return Ok(Reconciliation {
                repair_id: repair.repair_id,
                segment_id: repair.segment_id,
                outcome: Outcome::NotComplete {
                    status: repair.status.to_string(),
                },
                inspections: Vec::new(),
                candidates: Vec::new(),
                diagnostics: Vec::new(),
            });
        }

        info!(segment_id = %repair.segment_id, "querying for prior flagged inspections");
        let flagged = Filter::eq(inspection::SEGMENT_ID_FIELD, &repair.segment_id)
            .and(Filter::eq(inspection::STATUS_FIELD, RETV_MARKER));
        let inspections: Vec<Inspection> = self
            .service
            .query(Collection::Inspections, &flagged)
            .await?
            .iter()
            .map(Inspection::from_record)
            .collect::<Result<_>>()?;
        info!(count = inspections.len(), "inspections impacted");

        let mut candidates: Vec<Defect> = Vec::new();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();

        for inspection in &inspections {
            info!(inspection = %inspection.name, line_to_point = %inspection.line_to_point, "collecting defects");
            let matched = self
                .service
                .query(
                    Collection::Defects,
                    &Filter::eq(defect::LINE_TO_POINT_FIELD, &inspection.line_to_point),
                )
                .await?;
            for record in &matched {
                let defect = Defect::from_record(record)?;
                if !seen.insert(defect.object_id) {
                    diagnostics.push(Diagnostic::DuplicateDropped {
                        object_id: defect.object_id,
                        inspection: inspection.name.clone(),
                    });
                    continue;
                }
                if defect.is_archived() {
                    info!(object_id = defect.object_id, "defect already archived, will be skipped");
                    diagnostics.push(Diagnostic::AlreadyArchived {
                        object_id: defect.object_id,
                    });
                }
                candidates.push(defect);
            }
        }
        info!(count = candidates.len(), "defects impacted");

        Ok(Reconciliation {
            repair_id: repair.repair_id,
            segment_id: repair.segment_id,
            outcome: Outcome::Complete,
            inspections,
            candidates,
            diagnostics,
        })
    }
}

/// Resolve a line-to-point key to its segment through the inspection that
/// carries it.
///
/// Segment affiliation is not stored on defect records; it is established
/// transitively through this join. Kept as its own step so a schema change
/// that stores segment on defects directly replaces one function.
pub async fn segment_for_line_to_point(
    service: &dyn FeatureService,
    line_to_point: &str,
) -> Result<Option<String>> {
    let matches = service
        .query(
            Collection::Inspections,
            &Filter::eq(inspection::LINE_TO_POINT_FIELD, line_to_point),
        )
        .await?;
    match matches.first() {
        Some(record) => Ok(Some(
            record.str_field(inspection::SEGMENT_ID_FIELD)?.to_string(),
        )),
        None => Ok(None),
    }
}
