//! In-memory fake for the feature-service trait (testing only).
//!
//! `MemoryFeatureService` satisfies the `FeatureService` contract without a
//! network: collections are seeded vectors of records and filters are
//! evaluated locally through `Filter::matches`, so tests run against the
//! same predicates production queries render.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ServiceError, ServiceResult};
use crate::filter::Filter;
use crate::record::RawRecord;
use crate::{Collection, FeatureService, UpdateOutcome};

/// In-memory feature service backed by per-collection record vectors.
#[derive(Debug, Default)]
pub struct MemoryFeatureService {
    collections: Mutex<HashMap<Collection, Vec<RawRecord>>>,
    failing_updates: Mutex<HashSet<i64>>,
    update_calls: AtomicUsize,
}

impl MemoryFeatureService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records to a collection.
    pub fn seed(&self, collection: Collection, records: Vec<RawRecord>) {
        let mut collections = self.collections.lock().unwrap();
        collections.entry(collection).or_default().extend(records);
    }

    /// Make updates for the given object id report failure.
    pub fn fail_updates_for(&self, object_id: i64) {
        self.failing_updates.lock().unwrap().insert(object_id);
    }

    /// Number of `update` calls received so far.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of a collection's current records.
    pub fn records(&self, collection: Collection) -> Vec<RawRecord> {
        let collections = self.collections.lock().unwrap();
        collections.get(&collection).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl FeatureService for MemoryFeatureService {
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> ServiceResult<Vec<RawRecord>> {
        let collections = self.collections.lock().unwrap();
        let records = collections.get(&collection).cloned().unwrap_or_default();
        Ok(records.into_iter().filter(|r| filter.matches(r)).collect())
    }

    async fn update(
        &self,
        collection: Collection,
        record: &RawRecord,
    ) -> ServiceResult<UpdateOutcome> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let object_id = record.object_id().map_err(|_| ServiceError::NoObjectId)?;

        if self.failing_updates.lock().unwrap().contains(&object_id) {
            return Ok(UpdateOutcome {
                object_id,
                success: false,
                error: Some("update rejected".to_string()),
            });
        }

        let mut collections = self.collections.lock().unwrap();
        let records = collections.entry(collection).or_default();
        let stored = records
            .iter_mut()
            .find(|r| r.object_id().map(|id| id == object_id).unwrap_or(false));

        match stored {
            Some(existing) => {
                for (field, value) in record.fields() {
                    existing.set(field, value.clone());
                }
                Ok(UpdateOutcome {
                    object_id,
                    success: true,
                    error: None,
                })
            }
            None => Ok(UpdateOutcome {
                object_id,
                success: false,
                error: Some(format!("no record with object id {object_id}")),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_applies_filter() {
        let svc = MemoryFeatureService::new();
        svc.seed(
            Collection::Repairs,
            vec![
                RawRecord::new().with("OBJECTID", 1).with("RepairID", "R-1"),
                RawRecord::new().with("OBJECTID", 2).with("RepairID", "R-2"),
            ],
        );

        let hits = svc
            .query(Collection::Repairs, &Filter::eq("RepairID", "R-2"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].str_field("RepairID").unwrap(), "R-2");
    }

    #[tokio::test]
    async fn test_query_empty_collection_is_empty_not_error() {
        let svc = MemoryFeatureService::new();
        let hits = svc
            .query(Collection::Defects, &Filter::eq("LineToPoint", "LTP-1"))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let svc = MemoryFeatureService::new();
        svc.seed(
            Collection::Defects,
            vec![RawRecord::new().with("OBJECTID", 7).with("Status", "Active")],
        );

        let update = RawRecord::new().with("OBJECTID", 7).with("Status", "re-tv'd");
        let outcome = svc.update(Collection::Defects, &update).await.unwrap();
        assert!(outcome.success);

        let stored = svc.records(Collection::Defects);
        assert_eq!(stored[0].str_field("Status").unwrap(), "re-tv'd");
        assert_eq!(svc.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_record_fails_per_record() {
        let svc = MemoryFeatureService::new();
        let update = RawRecord::new().with("OBJECTID", 99).with("Status", "re-tv'd");
        let outcome = svc.update(Collection::Defects, &update).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("99"));
    }

    #[tokio::test]
    async fn test_forced_failure() {
        let svc = MemoryFeatureService::new();
        svc.seed(
            Collection::Defects,
            vec![RawRecord::new().with("OBJECTID", 7).with("Status", "Active")],
        );
        svc.fail_updates_for(7);

        let update = RawRecord::new().with("OBJECTID", 7).with("Status", "re-tv'd");
        let outcome = svc.update(Collection::Defects, &update).await.unwrap();
        assert!(!outcome.success);
        // Record untouched on failure.
        assert_eq!(
            svc.records(Collection::Defects)[0].str_field("Status").unwrap(),
            "Active"
        );
    }
}
