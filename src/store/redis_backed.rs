//! Redis-backed `SharedStore` — the backing required for multi-replica
//! correctness. Records live under `record:{id}` keys, insertion order is
//! tracked in a sorted set keyed by `detected_at`, and publication goes out
//! over the `threats:events` channel. Grounded on
//! `phantom-mitre-core/src/data_stores/redis_store.rs`'s `ConnectionManager`
//! + key-prefix idiom; the pub/sub half has no direct analog in the example
//! pack; `redis::Client::get_async_pubsub` is the crate's own documented
//! entry point for it.

use super::{SharedStore, Subscription, EVENTS_CHANNEL};
use crate::error::StoreError;
use crate::models::EnhancedAnalysisRecord;
use async_trait::async_trait;
use futures::StreamExt;
use log::warn;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const ORDER_KEY: &str = "threats:order";
const RECORD_KEY_PREFIX: &str = "record:";
const RECONNECT_BACKOFF: Duration = Duration::from_millis(500);

pub struct RedisStore {
    connection_manager: ConnectionManager,
    sender: broadcast::Sender<EnhancedAnalysisRecord>,
}

impl RedisStore {
    /// Opens the connection manager, then spawns a single background task
    /// that owns the one broker pub/sub connection and re-broadcasts every
    /// message locally: a single reader multiplexed out to in-process
    /// subscribers, never one broker connection per client.
    pub async fn connect(broker_url: &str, buffer_capacity: usize) -> Result<Self, StoreError> {
        let client = Client::open(broker_url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let connection_manager = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let (sender, _) = broadcast::channel(buffer_capacity.max(1));
        tokio::spawn(run_pubsub_forwarder(client, sender.clone()));

        Ok(Self { connection_manager, sender })
    }

    fn record_key(id: &str) -> String {
        format!("{RECORD_KEY_PREFIX}{id}")
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn save_and_publish(&self, record: EnhancedAnalysisRecord) -> Result<(), StoreError> {
        let mut conn = self.connection_manager.clone();
        let payload = serde_json::to_string(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let key = Self::record_key(&record.id);
        let score = record.signal.detected_at.timestamp_millis() as f64;

        conn.set::<_, _, ()>(&key, &payload)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        conn.zadd::<_, _, _, ()>(ORDER_KEY, &record.id, score)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if let Err(e) = conn.publish::<_, _, ()>(EVENTS_CHANNEL, &payload).await {
            // The record must never be observably saved without being
            // published — retract both writes.
            let _: Result<(), _> = conn.del(&key).await;
            let _: Result<(), _> = conn.zrem(ORDER_KEY, &record.id).await;
            return Err(StoreError::PublishFailed(e.to_string()));
        }

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Vec<EnhancedAnalysisRecord> {
        let mut conn = self.connection_manager.clone();
        let ids: Vec<String> = match conn.zrevrange(ORDER_KEY, 0, (limit.max(1) - 1) as isize).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("redis zrevrange for {ORDER_KEY} failed: {e}");
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.by_id(&id).await {
                records.push(record);
            }
        }
        records
    }

    async fn by_id(&self, id: &str) -> Option<EnhancedAnalysisRecord> {
        let mut conn = self.connection_manager.clone();
        let payload: Option<String> = conn.get(Self::record_key(id)).await.ok()?;
        payload.and_then(|p| serde_json::from_str(&p).ok())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.sender.subscribe(), Arc::new(AtomicU64::new(0)))
    }
}

/// Owns the one broker pub/sub connection and reconnects with a fixed
/// backoff on transient disconnect. A reconnect never replays missed
/// records — clients needing consistency call `Recent` before subscribing.
async fn run_pubsub_forwarder(client: Client, sender: broadcast::Sender<EnhancedAnalysisRecord>) {
    loop {
        match client.get_async_pubsub().await {
            Ok(mut pubsub) => {
                if let Err(e) = pubsub.subscribe(EVENTS_CHANNEL).await {
                    warn!("redis pubsub subscribe to {EVENTS_CHANNEL} failed: {e}");
                    tokio::time::sleep(RECONNECT_BACKOFF).await;
                    continue;
                }
                let mut stream = pubsub.on_message();
                while let Some(msg) = stream.next().await {
                    let payload: String = match msg.get_payload() {
                        Ok(p) => p,
                        Err(e) => {
                            warn!("redis pubsub payload decode failed: {e}");
                            continue;
                        }
                    };
                    match serde_json::from_str::<EnhancedAnalysisRecord>(&payload) {
                        Ok(record) => {
                            let _ = sender.send(record);
                        }
                        Err(e) => warn!("redis pubsub payload did not parse as a record: {e}"),
                    }
                }
                // `on_message` stream ended: the connection dropped.
            }
            Err(e) => warn!("redis pubsub connection failed: {e}"),
        }
        tokio::time::sleep(RECONNECT_BACKOFF).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::sample_record;

    /// These exercise a real broker and are skipped unless one is running;
    /// set `REDIS_TEST_URL` to point at it. The in-process backing's test
    /// suite (`store::inprocess::tests`) covers the same contract without
    /// an external dependency.
    fn broker_url() -> Option<String> {
        std::env::var("REDIS_TEST_URL").ok()
    }

    #[tokio::test]
    #[ignore = "requires a running redis instance reachable at REDIS_TEST_URL"]
    async fn round_trips_a_record_through_save_and_by_id() {
        let Some(url) = broker_url() else { return };
        let store = RedisStore::connect(&url, 64).await.unwrap();
        let record = sample_record("redis-r1");
        store.save_and_publish(record.clone()).await.unwrap();

        let fetched = store.by_id("redis-r1").await.unwrap();
        assert_eq!(fetched.id, record.id);
    }

    #[tokio::test]
    #[ignore = "requires a running redis instance reachable at REDIS_TEST_URL"]
    async fn subscriber_observes_a_published_record() {
        let Some(url) = broker_url() else { return };
        let store = RedisStore::connect(&url, 64).await.unwrap();
        let mut sub = store.subscribe();

        // Give the forwarder task time to complete its SUBSCRIBE before we publish.
        tokio::time::sleep(Duration::from_millis(200)).await;
        store.save_and_publish(sample_record("redis-r2")).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(5), sub.recv())
            .await
            .expect("subscriber should observe the publish within 5s")
            .expect("channel should not close");
        assert_eq!(received.id, "redis-r2");
    }

    #[tokio::test]
    #[ignore = "requires a running redis instance reachable at REDIS_TEST_URL"]
    async fn subscriber_on_one_replica_observes_a_publish_from_another() {
        let Some(url) = broker_url() else { return };
        let replica_a = RedisStore::connect(&url, 64).await.unwrap();
        let replica_c = RedisStore::connect(&url, 64).await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let mut subscription = replica_a.subscribe();

        let record = sample_record("redis-multi-replica");
        replica_c.save_and_publish(record.clone()).await.unwrap();

        let observed = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
            .await
            .expect("replica A's subscriber should observe the record within 5s")
            .expect("the broker connection should not close");
        assert_eq!(observed.id, record.id);

        let fetched_from_a = replica_a.by_id("redis-multi-replica").await;
        assert_eq!(fetched_from_a.unwrap().id, record.id);
    }
}
