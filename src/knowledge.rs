//! KnowledgeStore — read-only lookups the Coordinator uses to build
//! per-analyst context bags. Failures are reported via `ok: false` rather
//! than an error type, so the Coordinator can decide recoverability
//! per-source.

use crate::models::{CustomerConfig, InfraEvent, IntelItem, SimilarIncident, ThreatType};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Wraps a lookup's result with a success flag so the caller can
/// distinguish "empty" from "the source failed".
#[derive(Debug, Clone)]
pub struct LookupResult<T> {
    pub ok: bool,
    pub data: T,
}

impl<T: Default> LookupResult<T> {
    pub fn failed() -> Self {
        Self {
            ok: false,
            data: T::default(),
        }
    }

    pub fn succeeded(data: T) -> Self {
        Self { ok: true, data }
    }
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn similar_incidents(&self, threat_type: ThreatType, customer_name: &str) -> LookupResult<Vec<SimilarIncident>>;
    async fn customer_config(&self, customer_name: &str) -> LookupResult<Option<CustomerConfig>>;
    async fn recent_infra_events(&self, minutes: i64) -> LookupResult<Vec<InfraEvent>>;
    async fn relevant_intel(&self, customer_name: &str, threat_type: ThreatType) -> LookupResult<Vec<IntelItem>>;
}

/// In-memory reference implementation. Sub-millisecond, side-effect-free.
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    incidents: DashMap<(String, String), Vec<SimilarIncident>>,
    customer_configs: DashMap<String, CustomerConfig>,
    infra_events: Arc<DashMap<(), Vec<InfraEvent>>>,
    intel: DashMap<String, Vec<IntelItem>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_similar_incidents(&self, threat_type: ThreatType, customer_name: &str, incidents: Vec<SimilarIncident>) {
        self.incidents
            .insert((threat_type.as_str().to_string(), customer_name.to_string()), incidents);
    }

    pub fn seed_customer_config(&self, customer_name: &str, config: CustomerConfig) {
        self.customer_configs.insert(customer_name.to_string(), config);
    }

    pub fn seed_infra_events(&self, events: Vec<InfraEvent>) {
        self.infra_events.insert((), events);
    }

    pub fn seed_intel(&self, customer_name: &str, items: Vec<IntelItem>) {
        self.intel.insert(customer_name.to_string(), items);
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn similar_incidents(&self, threat_type: ThreatType, customer_name: &str) -> LookupResult<Vec<SimilarIncident>> {
        let key = (threat_type.as_str().to_string(), customer_name.to_string());
        LookupResult::succeeded(self.incidents.get(&key).map(|v| v.clone()).unwrap_or_default())
    }

    async fn customer_config(&self, customer_name: &str) -> LookupResult<Option<CustomerConfig>> {
        LookupResult::succeeded(self.customer_configs.get(customer_name).map(|v| v.clone()))
    }

    async fn recent_infra_events(&self, minutes: i64) -> LookupResult<Vec<InfraEvent>> {
        let cutoff = Utc::now() - Duration::minutes(minutes);
        let events = self
            .infra_events
            .get(&())
            .map(|v| v.iter().filter(|e| e.occurred_at >= cutoff).cloned().collect())
            .unwrap_or_default();
        LookupResult::succeeded(events)
    }

    async fn relevant_intel(&self, customer_name: &str, _threat_type: ThreatType) -> LookupResult<Vec<IntelItem>> {
        LookupResult::succeeded(self.intel.get(customer_name).map(|v| v.clone()).unwrap_or_default())
    }
}
