//! Behavioral contract tests for the reconcile/archive/categorize workflows.
//!
//! Everything runs against `MemoryFeatureService`, which evaluates the same
//! filter predicates production queries render.

use std::sync::Arc;

use retv_core::{
    ArchiveWorkflow, AutoApprove, AutoDecline, Categorizer, CountingGate, Diagnostic, Disposition,
    Outcome, ReconError, Reconciler, RecordOutcome, RETV_MARKER,
};
use retv_service::fakes::MemoryFeatureService;
use retv_service::{Collection, RawRecord};

// ===========================================================================
// Fixtures
// ===========================================================================

fn repair(object_id: i64, repair_id: &str, status: &str, segment_id: &str) -> RawRecord {
    RawRecord::new()
        .with("OBJECTID", object_id)
        .with("RepairID", repair_id)
        .with("Status", status)
        .with("SEGMENT_ID", segment_id)
}

fn inspection(
    object_id: i64,
    name: &str,
    segment_id: &str,
    status: &str,
    line_to_point: &str,
) -> RawRecord {
    RawRecord::new()
        .with("OBJECTID", object_id)
        .with("InspectionName", name)
        .with("SEGMENT_ID", segment_id)
        .with("STATUS", status)
        .with("LineToPoint", line_to_point)
        .with("Count_Level0", 0)
        .with("Count_Level1", 0)
        .with("Count_Level2", 0)
        .with("Count_Level3", 1)
        .with("Count_Level4", 0)
        .with("Count_Level5", 0)
}

fn defect(
    object_id: i64,
    submission: &str,
    line_to_point: &str,
    grade: Option<i64>,
    status: &str,
) -> RawRecord {
    let record = RawRecord::new()
        .with("OBJECTID", object_id)
        .with("InspectionName", submission)
        .with("LineToPoint", line_to_point)
        .with("PACP_Code", "FL")
        .with("Distance", 12.5)
        .with("Status", status);
    match grade {
        Some(g) => record.with("Grade", g),
        None => record.with("Grade", serde_json::Value::Null),
    }
}

/// The worked scenario: repair R-1 (Complete) on segment S-9; inspection I-1
/// flagged with line-to-point LTP-1; defect D1 (grade 3, Active) and D2
/// (ungraded, already archived) on LTP-1.
fn scenario_service() -> Arc<MemoryFeatureService> {
    let svc = MemoryFeatureService::new();
    svc.seed(
        Collection::Repairs,
        vec![repair(1, "R-1", "Complete", "S-9")],
    );
    svc.seed(
        Collection::Inspections,
        vec![inspection(10, "I-1", "S-9", RETV_MARKER, "LTP-1")],
    );
    svc.seed(
        Collection::Defects,
        vec![
            defect(41, "I-1", "LTP-1", Some(3), "Active"),
            defect(42, "I-1", "LTP-1", None, RETV_MARKER),
        ],
    );
    Arc::new(svc)
}

// ===========================================================================
// Correlation engine contracts
// ===========================================================================

#[tokio::test]
async fn reconcile_unknown_repair_is_not_found() {
    let svc = scenario_service();
    let reconciler = Reconciler::new(svc);

    let err = reconciler.reconcile("missing-id").await.unwrap_err();
    assert!(matches!(err, ReconError::RepairNotFound(id) if id == "missing-id"));
}

#[tokio::test]
async fn reconcile_not_complete_is_tagged_and_empty() {
    let svc = Arc::new(MemoryFeatureService::new());
    svc.seed(
        Collection::Repairs,
        vec![repair(1, "R-2", "Pending", "S-3")],
    );

    let result = Reconciler::new(svc).reconcile("R-2").await.unwrap();
    assert_eq!(
        result.outcome,
        Outcome::NotComplete {
            status: "Pending".to_string()
        }
    );
    assert!(result.candidates.is_empty());
    assert!(result.inspections.is_empty());
}

#[tokio::test]
async fn reconcile_no_flagged_inspections_is_empty_not_error() {
    let svc = Arc::new(MemoryFeatureService::new());
    svc.seed(
        Collection::Repairs,
        vec![repair(1, "R-3", "Complete", "S-5")],
    );
    // One inspection on the segment, but not flagged.
    svc.seed(
        Collection::Inspections,
        vec![inspection(10, "I-9", "S-5", "Accepted", "LTP-9")],
    );

    let result = Reconciler::new(svc).reconcile("R-3").await.unwrap();
    assert_eq!(result.outcome, Outcome::Complete);
    assert!(result.inspections.is_empty());
    assert!(result.candidates.is_empty());
}

#[tokio::test]
async fn reconcile_scenario_returns_both_candidates_in_order() {
    let svc = scenario_service();
    let result = Reconciler::new(svc).reconcile("R-1").await.unwrap();

    assert_eq!(result.segment_id, "S-9");
    assert_eq!(result.inspections.len(), 1);
    let ids: Vec<i64> = result.candidates.iter().map(|d| d.object_id).collect();
    assert_eq!(ids, vec![41, 42]);

    // D2 is flagged during collection, not dropped.
    assert_eq!(result.already_archived_count(), 1);
    assert!(result
        .diagnostics
        .contains(&Diagnostic::AlreadyArchived { object_id: 42 }));
}

#[tokio::test]
async fn reconcile_dedups_across_inspections_sharing_a_key() {
    let svc = scenario_service();
    // A second flagged inspection on the same segment with the same
    // line-to-point key revisits the same defects.
    svc.seed(
        Collection::Inspections,
        vec![inspection(11, "I-2", "S-9", RETV_MARKER, "LTP-1")],
    );

    let result = Reconciler::new(svc).reconcile("R-1").await.unwrap();
    assert_eq!(result.inspections.len(), 2);

    let ids: Vec<i64> = result.candidates.iter().map(|d| d.object_id).collect();
    assert_eq!(ids, vec![41, 42], "each defect collected exactly once");
    assert!(result.diagnostics.contains(&Diagnostic::DuplicateDropped {
        object_id: 41,
        inspection: "I-2".to_string()
    }));
}

// ===========================================================================
// Archival workflow contracts
// ===========================================================================

#[tokio::test]
async fn archive_scenario_updates_active_and_skips_archived() {
    let svc = scenario_service();
    let workflow = ArchiveWorkflow::new(svc.clone());

    let report = workflow.run("R-1", &AutoApprove).await.unwrap();
    assert_eq!(report.disposition, Disposition::Committed);
    assert_eq!(report.total_candidates, 2);
    assert_eq!(report.updated_count(), 1);
    assert_eq!(report.skipped_count(), 1);
    assert!(report.failures().is_empty());
    assert_eq!(svc.update_calls(), 1, "only D1 is submitted");

    // Outcomes keep batch order.
    let ids: Vec<i64> = report.outcomes.iter().map(|o| o.object_id()).collect();
    assert_eq!(ids, vec![41, 42]);

    // D1 now carries the archived marker in the dataset.
    let stored = svc.records(Collection::Defects);
    let d1 = stored
        .iter()
        .find(|r| r.object_id().unwrap() == 41)
        .unwrap();
    assert_eq!(d1.str_field("Status").unwrap(), RETV_MARKER);
}

#[tokio::test]
async fn archive_is_idempotent_across_runs() {
    let svc = scenario_service();
    let workflow = ArchiveWorkflow::new(svc.clone());

    let first = workflow.run("R-1", &AutoApprove).await.unwrap();
    assert_eq!(first.updated_count(), 1);

    let second = workflow.run("R-1", &AutoApprove).await.unwrap();
    assert_eq!(second.disposition, Disposition::Committed);
    assert_eq!(second.updated_count(), 0);
    assert_eq!(
        second.skipped_count(),
        second.total_candidates,
        "second run skips everything"
    );
    assert_eq!(svc.update_calls(), 1, "no additional updates on re-run");
}

#[tokio::test]
async fn declined_gate_halts_with_zero_updates() {
    let svc = scenario_service();
    let workflow = ArchiveWorkflow::new(svc.clone());

    let report = workflow.run("R-1", &AutoDecline).await.unwrap();
    assert_eq!(report.disposition, Disposition::HaltedByUser);
    assert_eq!(report.total_candidates, 2);
    assert!(report.outcomes.is_empty());
    assert_eq!(svc.update_calls(), 0);
    assert!(report.render_text().contains("halted by user"));
}

#[tokio::test]
async fn gate_is_consulted_exactly_once_per_run() {
    let svc = scenario_service();
    let workflow = ArchiveWorkflow::new(svc);

    let gate = CountingGate::new(AutoApprove);
    workflow.run("R-1", &gate).await.unwrap();
    assert_eq!(gate.calls(), 1);
}

#[tokio::test]
async fn gate_is_never_consulted_for_incomplete_repair() {
    let svc = Arc::new(MemoryFeatureService::new());
    svc.seed(
        Collection::Repairs,
        vec![repair(1, "R-2", "Pending", "S-3")],
    );
    let workflow = ArchiveWorkflow::new(svc.clone());

    let gate = CountingGate::new(AutoApprove);
    let report = workflow.run("R-2", &gate).await.unwrap();
    assert_eq!(report.disposition, Disposition::RepairNotComplete);
    assert_eq!(gate.calls(), 0);
    assert_eq!(svc.update_calls(), 0);
    assert!(report.render_text().contains("repair not complete"));
}

#[tokio::test]
async fn one_failed_update_does_not_abort_the_batch() {
    let svc = Arc::new(MemoryFeatureService::new());
    svc.seed(
        Collection::Repairs,
        vec![repair(1, "R-1", "Complete", "S-9")],
    );
    svc.seed(
        Collection::Inspections,
        vec![inspection(10, "I-1", "S-9", RETV_MARKER, "LTP-1")],
    );
    svc.seed(
        Collection::Defects,
        vec![
            defect(41, "I-1", "LTP-1", Some(3), "Active"),
            defect(42, "I-1", "LTP-1", Some(4), "Active"),
        ],
    );
    svc.fail_updates_for(41);

    let workflow = ArchiveWorkflow::new(svc.clone());
    let report = workflow.run("R-1", &AutoApprove).await.unwrap();

    assert_eq!(report.disposition, Disposition::Committed);
    assert_eq!(report.updated_count(), 1);
    assert_eq!(report.failures().len(), 1);
    assert_eq!(svc.update_calls(), 2, "batch continued past the failure");
    match report.failures()[0] {
        RecordOutcome::Failed { object_id, cause } => {
            assert_eq!(*object_id, 41);
            assert!(!cause.is_empty());
        }
        other => panic!("expected failure outcome, got {other:?}"),
    }
    assert!(report.render_text().contains("defect 41"));
}

#[tokio::test]
async fn commit_refuses_non_actionable_plan() {
    let svc = Arc::new(MemoryFeatureService::new());
    svc.seed(
        Collection::Repairs,
        vec![repair(1, "R-2", "Pending", "S-3")],
    );
    let workflow = ArchiveWorkflow::new(svc.clone());

    let plan = workflow.prepare("R-2").await.unwrap();
    assert!(!plan.is_actionable());

    let report = workflow.commit(plan).await.unwrap();
    assert_eq!(report.disposition, Disposition::RepairNotComplete);
    assert_eq!(svc.update_calls(), 0);
}

// ===========================================================================
// Categorization contracts
// ===========================================================================

#[tokio::test]
async fn fetch_and_categorize_buckets_by_grade() {
    let svc = Arc::new(MemoryFeatureService::new());
    svc.seed(
        Collection::Inspections,
        vec![inspection(10, "I-1", "S-9", RETV_MARKER, "LTP-1")],
    );
    svc.seed(
        Collection::Defects,
        vec![
            defect(41, "I-1", "LTP-1", Some(5), "Active"),
            defect(42, "I-1", "LTP-1", Some(3), "Active"),
            defect(43, "I-1", "LTP-1", Some(5), "Active"),
            defect(44, "I-1", "LTP-1", Some(0), "Active"),
            // Ungraded: excluded by the grade >= 0 fetch filter.
            defect(45, "I-1", "LTP-1", None, "Active"),
            // Different submission: excluded by the name filter.
            defect(46, "I-2", "LTP-1", Some(5), "Active"),
        ],
    );

    let review = Categorizer::new(svc)
        .fetch_and_categorize("I-1")
        .await
        .unwrap();

    assert_eq!(review.total(), 4);
    let grade5: Vec<i64> = review.buckets.grade5.iter().map(|d| d.object_id).collect();
    assert_eq!(grade5, vec![41, 43], "encounter order preserved");
    assert_eq!(review.buckets.grade3.len(), 1);
    assert_eq!(review.buckets.grade0.len(), 1);
    assert!(review.buckets.ungraded.is_empty());

    // Segment resolved through the line-to-point join.
    assert_eq!(review.segments[&41].as_deref(), Some("S-9"));

    let text = review.render_text();
    assert!(text.contains("Level 5 defects"));
    assert!(text.contains("Line: S-9"));
}

#[tokio::test]
async fn fetch_and_categorize_unknown_submission_is_not_found() {
    let svc = Arc::new(MemoryFeatureService::new());
    let err = Categorizer::new(svc)
        .fetch_and_categorize("nope")
        .await
        .unwrap_err();
    assert!(matches!(err, ReconError::SubmissionNotFound(id) if id == "nope"));
}

#[tokio::test]
async fn fetch_and_categorize_tolerates_unmatched_line_to_point() {
    let svc = Arc::new(MemoryFeatureService::new());
    // Defect whose key no inspection carries: segment stays unresolved,
    // the review still succeeds.
    svc.seed(
        Collection::Defects,
        vec![defect(41, "I-1", "LTP-orphan", Some(2), "Active")],
    );

    let review = Categorizer::new(svc)
        .fetch_and_categorize("I-1")
        .await
        .unwrap();
    assert_eq!(review.total(), 1);
    assert_eq!(review.segments[&41], None);
    assert!(review.render_text().contains("Line: ?"));
}
