//! SharedStore — single source of truth for analysis records across
//! replicas, with fan-out publish to every replica's subscribers over the
//! `threats:events` channel.
//!
//! Two backings share this trait: [`inprocess::InProcessStore`], the
//! single-replica fallback, and, behind the `redis-store` feature,
//! [`redis_backed::RedisStore`] for multi-replica correctness. Both expose
//! the identical external contract, the way `phantom-core-cve`'s
//! `data_stores::traits::CVEDataStore` lets `LocalDataStore` and a
//! networked backend sit behind one trait.

pub mod inprocess;
#[cfg(feature = "redis-store")]
pub mod redis_backed;

pub use inprocess::InProcessStore;
#[cfg(feature = "redis-store")]
pub use redis_backed::RedisStore;

use crate::error::StoreError;
use crate::models::EnhancedAnalysisRecord;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// The single pub/sub channel name every backing publishes
/// `EnhancedAnalysisRecord`s on.
pub const EVENTS_CHANNEL: &str = "threats:events";

#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Atomically records the entry and publishes it. If the publish step
    /// fails, the stored entry must be retracted so the store never
    /// carries an unpublished record.
    async fn save_and_publish(&self, record: EnhancedAnalysisRecord) -> Result<(), StoreError>;

    /// Newest-first, ties broken by id ascending.
    async fn recent(&self, limit: usize) -> Vec<EnhancedAnalysisRecord>;

    /// Must return the same record across all replicas.
    async fn by_id(&self, id: &str) -> Option<EnhancedAnalysisRecord>;

    /// Yields every record published after the call; never replays history.
    fn subscribe(&self) -> Subscription;
}

/// One client's view of the publish stream. Wraps a `tokio::sync::broadcast`
/// receiver: the channel's own lagged-receiver semantics already give the
/// "oldest record dropped, counter incremented" discipline a slow subscriber
/// needs, so no bespoke ring buffer is needed.
pub struct Subscription {
    receiver: broadcast::Receiver<EnhancedAnalysisRecord>,
    dropped: Arc<AtomicU64>,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<EnhancedAnalysisRecord>, dropped: Arc<AtomicU64>) -> Self {
        Self { receiver, dropped }
    }

    /// Awaits the next record. Returns `None` only once the publishing side
    /// has been dropped (store shutdown); a lagging subscriber never sees
    /// an error here, it transparently skips to the next available record.
    pub async fn recv(&mut self) -> Option<EnhancedAnalysisRecord> {
        loop {
            match self.receiver.recv().await {
                Ok(record) => return Some(record),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.dropped.fetch_add(skipped, Ordering::Relaxed);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Count of records dropped from this subscriber's buffer due to
    /// overflow.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Shared fixture builder for the store backing test suites
/// (`inprocess`, `redis_backed`).
#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{EnhancedAnalysisRecord, FPRecommendation, FPScore, FindingsByAgent, InvestigationTimeline, ResponsePlan, Severity, ThreatSignal, ThreatType, ResponseAction, ActionType, Urgency, Impact};
    use chrono::Utc;
    use std::collections::HashMap;

    pub(crate) fn sample_record(id: &str) -> EnhancedAnalysisRecord {
        let signal = ThreatSignal {
            id: id.to_string(),
            threat_type: ThreatType::BotTraffic,
            customer_name: "acme".into(),
            customer_id: "c1".into(),
            source_ip: "1.2.3.4".into(),
            user_agent: None,
            request_count: 10,
            time_window_minutes: 5,
            detected_at: Utc::now(),
            raw_data: Default::default(),
        };
        EnhancedAnalysisRecord {
            id: id.to_string(),
            signal,
            findings: FindingsByAgent::new(),
            fp_score: FPScore {
                score: 0.1,
                confidence: 0.5,
                indicators: vec![],
                historical_fp_rate: None,
                similar_resolved_as_fp: 0,
                similar_resolved_as_real: 0,
                recommendation: FPRecommendation::LikelyRealThreat,
                explanation: "test".into(),
            },
            response_plan: ResponsePlan {
                primary_action: ResponseAction {
                    action_type: ActionType::Monitor,
                    urgency: Urgency::Low,
                    target: "1.2.3.4".into(),
                    reason: "test".into(),
                    confidence: 0.6,
                    auto_executable: true,
                    requires_approval: false,
                    estimated_impact: Impact::Low,
                    rollback_possible: true,
                    parameters: HashMap::new(),
                },
                secondary_actions: vec![],
                escalation_path: vec![],
                sla_minutes: 60,
                auto_escalate_after_minutes: 30,
                notes: "test".into(),
            },
            timeline: InvestigationTimeline {
                events: vec![],
                start_time: Utc::now(),
                end_time: Utc::now(),
                duration_ms: 0,
            },
            severity: Severity::Low,
            executive_summary: "test".into(),
            customer_narrative: "test".into(),
            mitre_tactics: vec![],
            mitre_techniques: vec![],
            requires_human_review: false,
            review_reason: None,
            total_processing_time_ms: 5,
            analyzed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::sample_record;

    #[tokio::test]
    async fn lagged_subscriber_skips_to_next_record_and_counts_drops() {
        let (tx, rx) = broadcast::channel(2);
        let dropped = Arc::new(AtomicU64::new(0));
        let mut sub = Subscription::new(rx, dropped);

        for i in 0..5 {
            let _ = tx.send(sample_record(&format!("r{i}")));
        }

        let next = sub.recv().await.expect("subscriber should still receive a record");
        assert!(sub.dropped_count() > 0, "overflowing the channel must count as drops");
        assert_eq!(next.id, "r3", "a lagged receiver resumes at the oldest record still buffered");
    }

    #[tokio::test]
    async fn closed_channel_yields_none() {
        let (tx, rx) = broadcast::channel(4);
        let sub_dropped = Arc::new(AtomicU64::new(0));
        let mut sub = Subscription::new(rx, sub_dropped);
        drop(tx);
        assert!(sub.recv().await.is_none());
    }
}
