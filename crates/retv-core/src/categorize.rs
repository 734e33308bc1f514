//! Grade-based categorization of defect sets.
//!
//! [`categorize`] is pure: one call, one input sequence, one set of buckets.
//! Nothing accumulates across calls. [`Categorizer::fetch_and_categorize`]
//! composes the service query for a submission's graded defects with the
//! pure partition, resolving each defect's segment through the explicit
//! line-to-point join.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use retv_service::{Collection, FeatureService, Filter};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{defect, Defect};
use crate::error::{ReconError, Result};
use crate::reconcile::segment_for_line_to_point;

/// Defects partitioned by severity grade: six ordered numeric buckets plus
/// one for ungraded records. Each bucket preserves input encounter order;
/// every input defect lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeBuckets {
    pub grade0: Vec<Defect>,
    pub grade1: Vec<Defect>,
    pub grade2: Vec<Defect>,
    pub grade3: Vec<Defect>,
    pub grade4: Vec<Defect>,
    pub grade5: Vec<Defect>,
    pub ungraded: Vec<Defect>,
}

impl GradeBuckets {
    /// Bucket for a grade value; grades outside 0–5 map to an empty slice
    /// (model construction rejects them before they get here).
    pub fn bucket(&self, grade: Option<u8>) -> &[Defect] {
        match grade {
            Some(0) => &self.grade0,
            Some(1) => &self.grade1,
            Some(2) => &self.grade2,
            Some(3) => &self.grade3,
            Some(4) => &self.grade4,
            Some(5) => &self.grade5,
            Some(_) => &[],
            None => &self.ungraded,
        }
    }

    /// Buckets in review order: most severe first, ungraded last.
    pub fn iter_severity_first(&self) -> impl Iterator<Item = (Option<u8>, &[Defect])> + '_ {
        [
            (Some(5), self.grade5.as_slice()),
            (Some(4), self.grade4.as_slice()),
            (Some(3), self.grade3.as_slice()),
            (Some(2), self.grade2.as_slice()),
            (Some(1), self.grade1.as_slice()),
            (Some(0), self.grade0.as_slice()),
            (None, self.ungraded.as_slice()),
        ]
        .into_iter()
    }

    /// Total defects across all buckets.
    pub fn total(&self) -> usize {
        self.iter_severity_first().map(|(_, b)| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Partition a defect sequence by severity grade.
pub fn categorize(defects: Vec<Defect>) -> GradeBuckets {
    let mut buckets = GradeBuckets::default();
    for defect in defects {
        match defect.grade {
            Some(0) => buckets.grade0.push(defect),
            Some(1) => buckets.grade1.push(defect),
            Some(2) => buckets.grade2.push(defect),
            Some(3) => buckets.grade3.push(defect),
            Some(4) => buckets.grade4.push(defect),
            Some(5) => buckets.grade5.push(defect),
            // Construction caps grades at 5; anything else is ungraded.
            Some(_) | None => buckets.ungraded.push(defect),
        }
    }
    buckets
}

/// Graded defects of one inspection submission, bucketed for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReview {
    /// The submission that was reviewed.
    pub submission_id: String,

    /// Segment resolved for each defect through its line-to-point key;
    /// `None` when no inspection carries the key.
    pub segments: BTreeMap<i64, Option<String>>,

    /// The partitioned defect set.
    pub buckets: GradeBuckets,
}

impl SubmissionReview {
    /// Total defects reviewed.
    pub fn total(&self) -> usize {
        self.buckets.total()
    }

    /// Human-readable review, most severe bucket first.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Defect review for submission {}\n", self.submission_id));
        out.push_str(&format!("Total defects: {}\n", self.total()));
        for (grade, bucket) in self.buckets.iter_severity_first() {
            if bucket.is_empty() {
                continue;
            }
            match grade {
                Some(g) => out.push_str(&format!("\nLevel {} defects\n", g)),
                None => out.push_str("\nUngraded defects\n"),
            }
            for defect in bucket {
                let segment = self
                    .segments
                    .get(&defect.object_id)
                    .and_then(|s| s.as_deref())
                    .unwrap_or("?");
                let grade = defect
                    .grade
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "-".to_string());
                out.push_str(&format!(
                    "- Line: {} || Grade: {} || Code: {} || Distance: {}\n",
                    segment, grade, defect.code, defect.distance
                ));
            }
        }
        out
    }
}

/// Categorization engine over the feature-service boundary.
pub struct Categorizer {
    service: Arc<dyn FeatureService>,
}

impl Categorizer {
    pub fn new(service: Arc<dyn FeatureService>) -> Self {
        Categorizer { service }
    }

    /// Fetch a submission's graded defects and bucket them by grade.
    ///
    /// # Errors
    ///
    /// `SubmissionNotFound` when the query returns no records; record-shape
    /// and transport errors propagate.
    pub async fn fetch_and_categorize(&self, submission_id: &str) -> Result<SubmissionReview> {
        info!(submission_id = %submission_id, "fetching defects");
        let filter = Filter::eq(defect::INSPECTION_NAME_FIELD, submission_id)
            .and(Filter::ge(defect::GRADE_FIELD, 0));
        let records = self.service.query(Collection::Defects, &filter).await?;
        if records.is_empty() {
            return Err(ReconError::SubmissionNotFound(submission_id.to_string()));
        }

        let defects: Vec<Defect> = records
            .iter()
            .map(Defect::from_record)
            .collect::<Result<_>>()?;
        info!(count = defects.len(), "categorizing defects by grade");

        // One join per distinct line-to-point key.
        let mut segment_cache: HashMap<String, Option<String>> = HashMap::new();
        let mut segments = BTreeMap::new();
        for d in &defects {
            let segment = match segment_cache.get(&d.line_to_point) {
                Some(cached) => cached.clone(),
                None => {
                    let resolved =
                        segment_for_line_to_point(self.service.as_ref(), &d.line_to_point).await?;
                    if resolved.is_none() {
                        warn!(
                            object_id = d.object_id,
                            line_to_point = %d.line_to_point,
                            "no inspection matches line-to-point"
                        );
                    }
                    segment_cache.insert(d.line_to_point.clone(), resolved.clone());
                    resolved
                }
            };
            segments.insert(d.object_id, segment);
        }

        Ok(SubmissionReview {
            submission_id: submission_id.to_string(),
            segments,
            buckets: categorize(defects),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::DefectStatus;

    fn defect(object_id: i64, grade: Option<u8>) -> Defect {
        Defect {
            object_id,
            line_to_point: "LTP-1".to_string(),
            grade,
            code: "FL".to_string(),
            distance: 1.0,
            status: DefectStatus::Active,
        }
    }

    #[test]
    fn test_partition_law() {
        let input = vec![
            defect(1, Some(5)),
            defect(2, None),
            defect(3, Some(0)),
            defect(4, Some(5)),
            defect(5, Some(3)),
        ];
        let buckets = categorize(input.clone());

        // No loss, no duplication across buckets.
        assert_eq!(buckets.total(), input.len());
        for d in &input {
            let bucket = buckets.bucket(d.grade);
            assert_eq!(
                bucket.iter().filter(|b| b.object_id == d.object_id).count(),
                1
            );
        }
    }

    #[test]
    fn test_buckets_preserve_encounter_order() {
        let buckets = categorize(vec![defect(4, Some(5)), defect(1, Some(5)), defect(9, Some(5))]);
        let ids: Vec<i64> = buckets.grade5.iter().map(|d| d.object_id).collect();
        assert_eq!(ids, vec![4, 1, 9]);
    }

    #[test]
    fn test_null_grade_lands_in_ungraded_only() {
        let buckets = categorize(vec![defect(1, None)]);
        assert_eq!(buckets.ungraded.len(), 1);
        assert!(buckets.grade0.is_empty());
        assert_eq!(buckets.bucket(None).len(), 1);
    }

    #[test]
    fn test_empty_input_empty_buckets() {
        let buckets = categorize(Vec::new());
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_severity_first_order() {
        let grades: Vec<Option<u8>> = categorize(Vec::new())
            .iter_severity_first()
            .map(|(g, _)| g)
            .collect();
        assert_eq!(
            grades,
            vec![Some(5), Some(4), Some(3), Some(2), Some(1), Some(0), None]
        );
    }
}
