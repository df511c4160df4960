//! Analyst — five heterogeneous analyzers sharing one contract. Context
//! shape is variant-specific; failure handling and the mock/live split are
//! identical across variants and implemented once here.

pub mod historical;
pub mod config_analyst;
pub mod devops;
pub mod context;
pub mod priority;

pub use historical::HistoricalAnalyst;
pub use config_analyst::ConfigAnalyst;
pub use devops::DevopsAnalyst;
pub use context::ContextAnalyst;
pub use priority::PriorityAnalyst;

use crate::models::{AgentFinding, CustomerConfig, InfraEvent, IntelItem, SimilarIncident, ThreatSignal};
use crate::reasoning::ReasoningProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;

/// Per-analyst context bag. Each variant only ever receives the shape it
/// was built for.
#[derive(Debug, Clone, Default)]
pub struct HistoricalContext {
    pub similar_incidents: Vec<SimilarIncident>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigContext {
    pub customer_config: Option<CustomerConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct DevopsContext {
    pub infra_events: Vec<InfraEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct IntelContext {
    pub intel: Vec<IntelItem>,
}

#[async_trait]
pub trait Analyst: Send + Sync {
    fn name(&self) -> &'static str;
}

/// Whether the calling analyst should skip the `ReasoningProvider` entirely
/// and return its pre-formed stub.
pub enum ReasoningMode {
    Mock,
    Live(std::sync::Arc<dyn ReasoningProvider>),
}

/// Shared mechanics: either return the mock stub or call the provider and
/// parse its response, falling back to the sentinel on any failure. Every
/// analyst variant's `analyze` delegates here after building its prompt.
pub(crate) async fn run(
    agent_name: &'static str,
    mode: &ReasoningMode,
    system_role: &str,
    user_prompt: &str,
) -> AgentFinding {
    let started = Instant::now();
    match mode {
        ReasoningMode::Mock => mock_stub(agent_name, started),
        ReasoningMode::Live(provider) => {
            match provider.generate(system_role, user_prompt).await {
                Ok(value) => parse_finding(agent_name, &value, started),
                Err(_) => AgentFinding::sentinel(agent_name),
            }
        }
    }
}

fn mock_stub(agent_name: &'static str, started: Instant) -> AgentFinding {
    AgentFinding {
        agent_name: agent_name.to_string(),
        analysis: format!("{agent_name} analyst mock stub: signal reviewed, no anomalies beyond baseline."),
        confidence: 0.85,
        key_findings: vec![format!("{agent_name}: baseline pattern observed")],
        recommendations: vec!["Continue monitoring".to_string()],
        processing_time_ms: started.elapsed().as_millis() as u64,
    }
}

/// Parses the provider's structured JSON-shaped response. Any shape
/// mismatch degrades to the sentinel finding rather than panicking.
fn parse_finding(agent_name: &'static str, value: &Value, started: Instant) -> AgentFinding {
    let analysis = match value.get("analysis").and_then(Value::as_str) {
        Some(s) => s.to_string(),
        None => return AgentFinding::sentinel(agent_name),
    };
    let confidence = match value.get("confidence").and_then(Value::as_f64) {
        Some(c) => c.clamp(0.0, 1.0),
        None => return AgentFinding::sentinel(agent_name),
    };
    let key_findings = value
        .get("key_findings")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    let recommendations = value
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    AgentFinding {
        agent_name: agent_name.to_string(),
        analysis,
        confidence,
        key_findings,
        recommendations,
        processing_time_ms: started.elapsed().as_millis() as u64,
    }
}

/// Shared helper: build a user prompt from the signal plus a context
/// description string. Each variant formats its own context section.
pub(crate) fn base_prompt(signal: &ThreatSignal, context_description: &str) -> String {
    format!(
        "Signal: type={}, customer={}, source_ip={}, request_count={}, window_minutes={}.\nContext: {}",
        signal.threat_type.as_str(),
        signal.customer_name,
        signal.source_ip,
        signal.request_count,
        signal.time_window_minutes,
        context_description,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_signal() -> ThreatSignal {
        ThreatSignal {
            id: "s1".into(),
            threat_type: crate::models::ThreatType::BotTraffic,
            customer_name: "acme".into(),
            customer_id: "c1".into(),
            source_ip: "1.2.3.4".into(),
            user_agent: None,
            request_count: 100,
            time_window_minutes: 10,
            detected_at: Utc::now(),
            raw_data: Default::default(),
        }
    }

    #[tokio::test]
    async fn mock_mode_never_calls_provider_and_has_fixed_confidence() {
        let finding = run("historical", &ReasoningMode::Mock, "role", "prompt").await;
        assert_eq!(finding.confidence, 0.85);
        assert!(!finding.is_sentinel());
    }

    #[test]
    fn parse_finding_falls_back_to_sentinel_on_missing_fields() {
        let value = serde_json::json!({"unexpected": true});
        let finding = parse_finding("priority", &value, Instant::now());
        assert!(finding.is_sentinel());
    }

    #[test]
    fn parse_finding_extracts_well_formed_response() {
        let value = serde_json::json!({
            "analysis": "looks benign",
            "confidence": 0.42,
            "key_findings": ["a", "b"],
            "recommendations": ["monitor"],
        });
        let finding = parse_finding("devops", &value, Instant::now());
        assert_eq!(finding.analysis, "looks benign");
        assert_eq!(finding.confidence, 0.42);
        assert_eq!(finding.key_findings, vec!["a", "b"]);
    }

    #[test]
    fn base_prompt_includes_signal_fields() {
        let prompt = base_prompt(&sample_signal(), "no prior incidents");
        assert!(prompt.contains("bot_traffic"));
        assert!(prompt.contains("acme"));
        assert!(prompt.contains("no prior incidents"));
    }
}
