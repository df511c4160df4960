//! Coordinator — end-to-end orchestration of one `ThreatSignal` into one
//! `EnhancedAnalysisRecord`: context assembly, analyst fan-out, the three
//! sequential analyzers, synthesis, and publication to `SharedStore`.

use crate::analysts::{
    ConfigAnalyst, ConfigContext, ContextAnalyst, DevopsAnalyst, DevopsContext, HistoricalAnalyst, HistoricalContext,
    IntelContext, PriorityAnalyst,
};
use crate::config::CoordinatorTimeouts;
use crate::error::CoordinatorError;
use crate::fp_analyzer::FPAnalyzer;
use crate::knowledge::KnowledgeStore;
use crate::mitre;
use crate::models::{
    AgentFinding, CustomerConfig, EnhancedAnalysisRecord, FPScore, FindingsByAgent, ResponseAction, ResponsePlan,
    Severity, ThreatSignal,
};
use crate::response_engine::ResponseEngine;
use crate::store::SharedStore;
use crate::timeline_builder::TimelineBuilder;
use chrono::Utc;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::time::timeout;

/// Per-analyst context bags built during context assembly.
struct ContextBags {
    historical: HistoricalContext,
    config: ConfigContext,
    devops: DevopsContext,
    intel: IntelContext,
    customer_config: Option<CustomerConfig>,
}

pub struct Coordinator {
    knowledge_store: Arc<dyn KnowledgeStore>,
    historical: Arc<HistoricalAnalyst>,
    config_analyst: Arc<ConfigAnalyst>,
    devops: Arc<DevopsAnalyst>,
    context_analyst: Arc<ContextAnalyst>,
    priority: Arc<PriorityAnalyst>,
    fp_analyzer: Arc<FPAnalyzer>,
    response_engine: Arc<ResponseEngine>,
    timeline_builder: Arc<TimelineBuilder>,
    store: Arc<dyn SharedStore>,
    timeouts: CoordinatorTimeouts,
    shutting_down: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        knowledge_store: Arc<dyn KnowledgeStore>,
        historical: Arc<HistoricalAnalyst>,
        config_analyst: Arc<ConfigAnalyst>,
        devops: Arc<DevopsAnalyst>,
        context_analyst: Arc<ContextAnalyst>,
        priority: Arc<PriorityAnalyst>,
        store: Arc<dyn SharedStore>,
        timeouts: CoordinatorTimeouts,
    ) -> Self {
        Self {
            knowledge_store,
            historical,
            config_analyst,
            devops,
            context_analyst,
            priority,
            fp_analyzer: Arc::new(FPAnalyzer::new()),
            response_engine: Arc::new(ResponseEngine::new()),
            timeline_builder: Arc::new(TimelineBuilder::new()),
            store,
            timeouts,
            shutting_down: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
        }
    }

    /// `Analyze(signal) -> record | error(kind)`.
    pub async fn analyze(&self, signal: ThreatSignal) -> Result<EnhancedAnalysisRecord, CoordinatorError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(CoordinatorError::InternalError("coordinator is shutting down".to_string()));
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let result = timeout(Duration::from_millis(self.timeouts.total_timeout_ms), self.analyze_inner(signal)).await;
        let remaining = self.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining == 0 && self.shutting_down.load(Ordering::Acquire) {
            self.drained.notify_waiters();
        }

        match result {
            Ok(inner) => inner,
            Err(_) => Err(CoordinatorError::Timeout(self.timeouts.total_timeout_ms)),
        }
    }

    /// Stops accepting new work and waits up to `grace` for in-flight
    /// requests to finish before returning.
    pub async fn shutdown(&self, grace: Duration) {
        self.shutting_down.store(true, Ordering::Release);
        if self.in_flight.load(Ordering::Acquire) == 0 {
            return;
        }
        let _ = timeout(grace, self.drained.notified()).await;
    }

    async fn analyze_inner(&self, signal: ThreatSignal) -> Result<EnhancedAnalysisRecord, CoordinatorError> {
        let started = Instant::now();
        let signal = signal.with_assigned_id();
        validate(&signal).map_err(CoordinatorError::InvalidSignal)?;

        // Context assembly.
        let context = self.assemble_context(&signal).await?;

        // Analyst fan-out.
        let findings = self
            .fan_out(&signal, &context, Duration::from_millis(self.timeouts.analyst_timeout_ms))
            .await;

        // Severity decision.
        let severity = decide_severity(findings.get("priority"));

        // False-positive analysis.
        let findings_vec: Vec<AgentFinding> = findings.values().cloned().collect();
        let fp_score = self
            .fp_analyzer
            .analyze(&signal, &findings_vec, &context.historical.similar_incidents);

        // Response planning.
        let response_plan =
            self.response_engine
                .generate_plan(&signal, severity, &fp_score, context.customer_config.as_ref());

        // Timeline construction.
        let timeline = self.timeline_builder.build(&signal, &findings, &fp_score, &response_plan, severity);

        // Synthesis.
        let executive_summary = build_executive_summary(&signal, severity, &findings, &fp_score);
        let customer_narrative = build_customer_narrative(&fp_score, &response_plan);
        let (requires_human_review, review_reason) = build_review_flags(severity, &fp_score, &response_plan.primary_action);
        let mitre_tactics = mitre::tactics_for(signal.threat_type);
        let mitre_techniques = mitre::techniques_for(signal.threat_type);
        let total_processing_time_ms = started.elapsed().as_millis() as u64;

        let record = EnhancedAnalysisRecord {
            id: signal.id.clone(),
            signal,
            findings,
            fp_score,
            response_plan,
            timeline,
            severity,
            executive_summary,
            customer_narrative,
            mitre_tactics,
            mitre_techniques,
            requires_human_review,
            review_reason,
            total_processing_time_ms,
            analyzed_at: Utc::now(),
        };

        // Publish.
        self.store
            .save_and_publish(record.clone())
            .await
            .map_err(|e| CoordinatorError::PersistenceFailure(e.to_string()))?;

        info!(
            "analyzed signal {} for {} in {}ms (severity={}, fp_score={})",
            record.id,
            record.signal.customer_name,
            record.total_processing_time_ms,
            record.severity.as_str(),
            record.fp_score.score
        );

        Ok(record)
    }

    async fn assemble_context(&self, signal: &ThreatSignal) -> Result<ContextBags, CoordinatorError> {
        let (historical, config, devops, intel) = tokio::join!(
            self.knowledge_store.similar_incidents(signal.threat_type, &signal.customer_name),
            self.knowledge_store.customer_config(&signal.customer_name),
            self.knowledge_store.recent_infra_events(60),
            self.knowledge_store.relevant_intel(&signal.customer_name, signal.threat_type),
        );

        if !historical.ok && !config.ok && !devops.ok && !intel.ok {
            return Err(CoordinatorError::ContextUnavailable);
        }

        if !historical.ok {
            warn!("similar_incidents lookup failed for {}; treating as empty", signal.customer_name);
        }
        if !config.ok {
            warn!("customer_config lookup failed for {}; treating as empty", signal.customer_name);
        }
        if !devops.ok {
            warn!("recent_infra_events lookup failed; treating as empty");
        }
        if !intel.ok {
            warn!("relevant_intel lookup failed for {}; treating as empty", signal.customer_name);
        }

        Ok(ContextBags {
            historical: HistoricalContext { similar_incidents: historical.data },
            config: ConfigContext { customer_config: config.data.clone() },
            devops: DevopsContext { infra_events: devops.data },
            intel: IntelContext { intel: intel.data },
            customer_config: config.data,
        })
    }

    async fn fan_out(&self, signal: &ThreatSignal, context: &ContextBags, deadline: Duration) -> FindingsByAgent {
        let historical = self.historical.clone();
        let signal_h = signal.clone();
        let ctx_h = context.historical.clone();
        let historical_fut = async move { ("historical", timeout(deadline, historical.analyze(&signal_h, &ctx_h)).await) };

        let config_analyst = self.config_analyst.clone();
        let signal_c = signal.clone();
        let ctx_c = context.config.clone();
        let config_fut = async move { ("config", timeout(deadline, config_analyst.analyze(&signal_c, &ctx_c)).await) };

        let devops = self.devops.clone();
        let signal_d = signal.clone();
        let ctx_d = context.devops.clone();
        let devops_fut = async move { ("devops", timeout(deadline, devops.analyze(&signal_d, &ctx_d)).await) };

        let context_analyst = self.context_analyst.clone();
        let signal_i = signal.clone();
        let ctx_i = context.intel.clone();
        let context_fut = async move { ("context", timeout(deadline, context_analyst.analyze(&signal_i, &ctx_i)).await) };

        let priority = self.priority.clone();
        let signal_p = signal.clone();
        let priority_fut = async move { ("priority", timeout(deadline, priority.analyze(&signal_p)).await) };

        let (h, c, d, i, p) = tokio::join!(historical_fut, config_fut, devops_fut, context_fut, priority_fut);

        let mut findings = FindingsByAgent::new();
        for (name, outcome) in [h, c, d, i, p] {
            let finding = match outcome {
                Ok(finding) => finding,
                Err(_) => {
                    warn!("analyst '{name}' exceeded its {}ms deadline; substituting sentinel finding", deadline.as_millis());
                    AgentFinding::sentinel(name)
                }
            };
            findings.insert(name.to_string(), finding);
        }
        findings
    }
}

/// `threat_type` is already a closed Rust enum, so the "must be from the
/// enumerated set" invariant is enforced by the type system at
/// deserialization time; this only checks the fields serde can't constrain.
fn validate(signal: &ThreatSignal) -> Result<(), String> {
    if signal.customer_name.trim().is_empty() {
        return Err("customer_name must not be empty".to_string());
    }
    if signal.customer_id.trim().is_empty() {
        return Err("customer_id must not be empty".to_string());
    }
    if signal.source_ip.trim().is_empty() {
        return Err("source_ip must not be empty".to_string());
    }
    if signal.time_window_minutes < 1 {
        return Err("time_window_minutes must be >= 1".to_string());
    }
    Ok(())
}

/// Severity decision: lowercased substring match in priority order;
/// sentinel priority findings default to medium.
fn decide_severity(priority_finding: Option<&AgentFinding>) -> Severity {
    let Some(finding) = priority_finding else {
        return Severity::Medium;
    };
    if finding.is_sentinel() {
        return Severity::Medium;
    }
    let lowered = finding.analysis.to_lowercase();
    if lowered.contains("critical") {
        Severity::Critical
    } else if lowered.contains("high") {
        Severity::High
    } else if lowered.contains("low") {
        Severity::Low
    } else {
        Severity::Medium
    }
}

const SUMMARY_AGENT_ORDER: [&str; 5] = ["historical", "config", "devops", "context", "priority"];

fn build_executive_summary(
    signal: &ThreatSignal,
    severity: Severity,
    findings: &FindingsByAgent,
    fp_score: &FPScore,
) -> String {
    let mut snippets: Vec<String> = Vec::new();
    'agents: for name in SUMMARY_AGENT_ORDER {
        if let Some(finding) = findings.get(name) {
            for key_finding in finding.key_findings.iter().take(2) {
                snippets.push(key_finding.clone());
                if snippets.len() >= 3 {
                    break 'agents;
                }
            }
        }
    }

    let suffix = if fp_score.score >= 0.7 {
        " (Likely false positive)"
    } else if fp_score.score <= 0.3 {
        " (High confidence threat)"
    } else {
        ""
    };

    format!(
        "{} severity {} detected for {}: {}{}",
        severity.as_str(),
        signal.threat_type.as_str(),
        signal.customer_name,
        snippets.join("; "),
        suffix
    )
}

fn build_customer_narrative(fp_score: &FPScore, response_plan: &ResponsePlan) -> String {
    if fp_score.score >= 0.7 {
        "Our security team reviewed this activity and determined it does not represent a genuine threat to your \
         account. No further action is required on your part."
            .to_string()
    } else {
        format!(
            "Our security team detected suspicious activity on your account and is taking action: {:?} targeting {}.",
            response_plan.primary_action.action_type, response_plan.primary_action.target
        )
    }
}

/// Mid-band FP review and the FP-override path both key off the 0.7
/// boundary; this crate's tie-break is to treat the human-review mid-band
/// as `[0.3, 0.7)` — half-open at the upper end — so a score of exactly
/// 0.7 only takes the override path and
/// does not *also* independently trigger human review via this rule
/// (covered by `coordinator::tests::fp_score_of_exactly_0_7_does_not_double_trigger_review`).
fn build_review_flags(severity: Severity, fp_score: &FPScore, primary_action: &ResponseAction) -> (bool, Option<String>) {
    let mut reasons = Vec::new();
    if severity == Severity::Critical {
        reasons.push("severity is critical".to_string());
    }
    if fp_score.score >= 0.3 && fp_score.score < 0.7 {
        reasons.push("false-positive score falls in the mid-band review range".to_string());
    }
    if primary_action.requires_approval {
        reasons.push("primary response action requires approval".to_string());
    }

    if reasons.is_empty() {
        (false, None)
    } else {
        (true, Some(reasons.join("; ")))
    }
}
