//! Threat Signal Coordinator - Data Models
//!
//! Core data model for the analysis pipeline: the inbound `ThreatSignal`,
//! the per-analyst `AgentFinding`, and every structure the pipeline
//! synthesizes on the way to an `EnhancedAnalysisRecord`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The seven categorized threat types a signal may carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    BotTraffic,
    CredentialStuffing,
    AccountTakeover,
    DataScraping,
    GeoAnomaly,
    RateLimitBreach,
    BruteForce,
}

impl ThreatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatType::BotTraffic => "bot_traffic",
            ThreatType::CredentialStuffing => "credential_stuffing",
            ThreatType::AccountTakeover => "account_takeover",
            ThreatType::DataScraping => "data_scraping",
            ThreatType::GeoAnomaly => "geo_anomaly",
            ThreatType::RateLimitBreach => "rate_limit_breach",
            ThreatType::BruteForce => "brute_force",
        }
    }
}

/// Free-form attribute bag carried on a signal (endpoint, user_id, etc).
pub type RawData = HashMap<String, serde_json::Value>;

/// Input event, immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatSignal {
    pub id: String,
    pub threat_type: ThreatType,
    pub customer_name: String,
    pub customer_id: String,
    pub source_ip: String,
    pub user_agent: Option<String>,
    pub request_count: u64,
    pub time_window_minutes: u64,
    pub detected_at: DateTime<Utc>,
    #[serde(default)]
    pub raw_data: RawData,
}

impl ThreatSignal {
    /// Assigns an id if the caller omitted one; this is the only mutation
    /// a signal undergoes before becoming read-only for the rest of its life.
    pub fn with_assigned_id(mut self) -> Self {
        if self.id.trim().is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        self
    }

    pub fn requests_per_minute(&self) -> f64 {
        self.request_count as f64 / self.time_window_minutes.max(1) as f64
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.raw_data.get("endpoint").and_then(|v| v.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.raw_data.get("user_id").and_then(|v| v.as_str())
    }
}

/// One analyst's structured output for a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFinding {
    pub agent_name: String,
    pub analysis: String,
    pub confidence: f64,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub processing_time_ms: u64,
}

impl AgentFinding {
    /// The fixed-shape finding emitted when an analyst fails or times out.
    /// Every analyst slot always gets a finding, never a missing entry.
    pub fn sentinel(agent_name: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            analysis: "Analysis unavailable".to_string(),
            confidence: 0.0,
            key_findings: vec!["Error".to_string()],
            recommendations: vec!["Manual review required".to_string()],
            processing_time_ms: 0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.confidence == 0.0 && self.key_findings == ["Error"]
    }
}

/// One weighted signal FPAnalyzer factored into its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FPIndicator {
    pub name: String,
    pub weight: f64,
    pub description: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FPRecommendation {
    LikelyFalsePositive,
    NeedsReview,
    LikelyRealThreat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FPScore {
    pub score: f64,
    pub confidence: f64,
    pub indicators: Vec<FPIndicator>,
    pub historical_fp_rate: Option<f64>,
    pub similar_resolved_as_fp: u32,
    pub similar_resolved_as_real: u32,
    pub recommendation: FPRecommendation,
    pub explanation: String,
}

/// A past analysis used by FPAnalyzer as historical context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarIncident {
    pub customer_name: String,
    pub threat_type: ThreatType,
    pub resolved_as_fp: bool,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    BlockIp,
    RateLimit,
    Challenge,
    Whitelist,
    Monitor,
    Escalate,
    Quarantine,
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Immediate,
    Urgent,
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseAction {
    pub action_type: ActionType,
    pub urgency: Urgency,
    pub target: String,
    pub reason: String,
    pub confidence: f64,
    pub auto_executable: bool,
    pub requires_approval: bool,
    pub estimated_impact: Impact,
    pub rollback_possible: bool,
    pub parameters: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePlan {
    pub primary_action: ResponseAction,
    pub secondary_actions: Vec<ResponseAction>,
    pub escalation_path: Vec<String>,
    pub sla_minutes: u32,
    pub auto_escalate_after_minutes: u32,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventType {
    Detection,
    Enrichment,
    Analysis,
    Correlation,
    Decision,
    Action,
    Escalation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: TimelineEventType,
    pub title: String,
    pub description: String,
    pub source: String,
    pub data: HashMap<String, serde_json::Value>,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationTimeline {
    pub events: Vec<TimelineEvent>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Per-analyst findings keyed by analyst name, not by index.
pub type FindingsByAgent = HashMap<String, AgentFinding>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedAnalysisRecord {
    pub id: String,
    pub signal: ThreatSignal,
    pub findings: FindingsByAgent,
    pub fp_score: FPScore,
    pub response_plan: ResponsePlan,
    pub timeline: InvestigationTimeline,
    pub severity: Severity,
    pub executive_summary: String,
    pub customer_narrative: String,
    pub mitre_tactics: Vec<String>,
    pub mitre_techniques: Vec<String>,
    pub requires_human_review: bool,
    pub review_reason: Option<String>,
    pub total_processing_time_ms: u64,
    pub analyzed_at: DateTime<Utc>,
}

/// Per-customer policy consulted by the ResponseEngine (and, incidentally,
/// by the FP-override path's escalation text).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomerConfig {
    pub auto_block_enabled: bool,
    #[serde(default)]
    pub escalation_contacts: Vec<String>,
}

/// A recent event from the devops/infra feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfraEvent {
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub source: String,
}

/// A piece of intel relevant to a customer/threat-type pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelItem {
    pub summary: String,
    pub source: String,
    pub confidence: f64,
}
