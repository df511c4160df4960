//! In-process `SharedStore` backing — the single-replica fallback. An
//! ordered index plus a `DashMap` of records duplicates each published
//! record into every active subscription's buffered queue via
//! `tokio::sync::broadcast`, matching the teacher's field-per-collection
//! `RwLock`/map idiom for concurrent in-memory state
//! (`phantom-core-mitre/src/storage/local.rs`'s `LocalStorage`).

use super::{SharedStore, Subscription};
use crate::error::StoreError;
use crate::models::EnhancedAnalysisRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Insertion-ordered record map with fan-out publish. The external
/// contract (`SaveAndPublish`, `Recent`, `ByID`, `Subscribe`) is identical
/// to the Redis-backed store; only the persistence medium differs.
pub struct InProcessStore {
    records: DashMap<String, EnhancedAnalysisRecord>,
    /// `(detected_at, id)` tuples give "newest-first, ties broken by id
    /// ascending" for free from `BTreeSet`'s natural ordering, walked in
    /// reverse for `Recent`.
    order: RwLock<BTreeSet<(DateTime<Utc>, String)>>,
    sender: broadcast::Sender<EnhancedAnalysisRecord>,
}

impl InProcessStore {
    /// `buffer_capacity` bounds each subscriber's queue depth.
    pub fn new(buffer_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_capacity.max(1));
        Self {
            records: DashMap::new(),
            order: RwLock::new(BTreeSet::new()),
            sender,
        }
    }
}

impl Default for InProcessStore {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl SharedStore for InProcessStore {
    async fn save_and_publish(&self, record: EnhancedAnalysisRecord) -> Result<(), StoreError> {
        self.order.write().insert((record.signal.detected_at, record.id.clone()));
        self.records.insert(record.id.clone(), record.clone());

        // `send` only errors when there are no active subscribers, which is
        // not a publish failure under this backing's contract — the record
        // stays saved and future subscribers simply won't see it (they
        // weren't subscribed at publish time; this store never replays
        // historical records to a new subscriber).
        let _ = self.sender.send(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Vec<EnhancedAnalysisRecord> {
        self.order
            .read()
            .iter()
            .rev()
            .take(limit)
            .filter_map(|(_, id)| self.records.get(id).map(|r| r.clone()))
            .collect()
    }

    async fn by_id(&self, id: &str) -> Option<EnhancedAnalysisRecord> {
        self.records.get(id).map(|r| r.clone())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.sender.subscribe(), Arc::new(AtomicU64::new(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::sample_record;

    #[tokio::test]
    async fn recent_orders_newest_first_with_id_tiebreak() {
        let store = InProcessStore::new(16);
        let base = Utc::now();
        let mut a = sample_record("b");
        a.signal.detected_at = base;
        a.id = "b".into();
        let mut b = sample_record("a");
        b.signal.detected_at = base;
        b.id = "a".into();
        let mut c = sample_record("z");
        c.signal.detected_at = base + chrono::Duration::seconds(1);
        c.id = "z".into();

        store.save_and_publish(a).await.unwrap();
        store.save_and_publish(b).await.unwrap();
        store.save_and_publish(c).await.unwrap();

        let recent = store.recent(10).await;
        let ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "b"], "newest detected_at first, ties by id ascending");
    }

    #[tokio::test]
    async fn by_id_returns_saved_record() {
        let store = InProcessStore::new(16);
        store.save_and_publish(sample_record("r1")).await.unwrap();
        let found = store.by_id("r1").await;
        assert!(found.is_some());
        assert_eq!(found.unwrap().id, "r1");
        assert!(store.by_id("missing").await.is_none());
    }

    #[tokio::test]
    async fn subscriber_receives_records_published_after_subscribing_only() {
        let store = InProcessStore::new(16);
        store.save_and_publish(sample_record("before")).await.unwrap();

        let mut sub = store.subscribe();
        store.save_and_publish(sample_record("after")).await.unwrap();

        let received = sub.recv().await.expect("publish after subscribe must be delivered");
        assert_eq!(received.id, "after");
    }

    #[tokio::test]
    async fn independent_subscribers_each_receive_every_record() {
        let store = InProcessStore::new(16);
        let mut sub_a = store.subscribe();
        let mut sub_b = store.subscribe();

        store.save_and_publish(sample_record("r1")).await.unwrap();

        assert_eq!(sub_a.recv().await.unwrap().id, "r1");
        assert_eq!(sub_b.recv().await.unwrap().id, "r1");
    }

    #[tokio::test]
    async fn recent_respects_limit() {
        let store = InProcessStore::new(16);
        for i in 0..5 {
            store.save_and_publish(sample_record(&format!("r{i}"))).await.unwrap();
        }
        assert_eq!(store.recent(2).await.len(), 2);
    }
}
