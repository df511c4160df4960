//! TimelineBuilder — synthesizes the ordered investigation timeline across
//! seven phases relative to `signal.detected_at`. Pure function of its
//! inputs and current time; jitter within the analysis phase uses `rand`
//! but only to place otherwise-identical concurrent events within their
//! declared window, not to influence any decision.

use crate::models::{
    FPScore, FindingsByAgent, InvestigationTimeline, ResponsePlan, Severity, ThreatSignal, TimelineEvent,
    TimelineEventType,
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;

pub struct TimelineBuilder;

impl TimelineBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        signal: &ThreatSignal,
        findings: &FindingsByAgent,
        fp_score: &FPScore,
        response_plan: &ResponsePlan,
        severity: Severity,
    ) -> InvestigationTimeline {
        let start = signal.detected_at;
        let mut events = Vec::new();

        events.push(TimelineEvent {
            timestamp: start,
            event_type: TimelineEventType::Detection,
            title: "Signal detected".to_string(),
            description: format!("{} signal detected for {}", signal.threat_type.as_str(), signal.customer_name),
            source: "coordinator".to_string(),
            data: HashMap::new(),
            severity: None,
        });

        for (offset_ms, title, source) in [
            (50, "Historical incidents loaded", "knowledge_store.similar_incidents"),
            (70, "Customer configuration loaded", "knowledge_store.customer_config"),
            (85, "Infrastructure events loaded", "knowledge_store.recent_infra_events"),
            (100, "Threat intel loaded", "knowledge_store.relevant_intel"),
        ] {
            events.push(TimelineEvent {
                timestamp: start + Duration::milliseconds(offset_ms),
                event_type: TimelineEventType::Enrichment,
                title: title.to_string(),
                description: format!("Context enrichment step: {title}"),
                source: source.to_string(),
                data: HashMap::new(),
                severity: None,
            });
        }

        let mut rng = rand::thread_rng();
        for (agent_name, finding) in findings.iter() {
            let jitter_ms: i64 = rng.gen_range(0..=50);
            let mut data = HashMap::new();
            data.insert("confidence".to_string(), serde_json::json!(finding.confidence));
            data.insert("processing_time_ms".to_string(), serde_json::json!(finding.processing_time_ms));
            data.insert(
                "top_findings".to_string(),
                serde_json::json!(finding.key_findings.iter().take(2).collect::<Vec<_>>()),
            );
            events.push(TimelineEvent {
                timestamp: start + Duration::milliseconds(100 + jitter_ms),
                event_type: TimelineEventType::Analysis,
                title: format!("{agent_name} analysis complete"),
                description: finding.analysis.clone(),
                source: format!("analyst.{agent_name}"),
                data,
                severity: None,
            });
        }

        let mut fp_data = HashMap::new();
        fp_data.insert("score".to_string(), serde_json::json!(fp_score.score));
        fp_data.insert("recommendation".to_string(), serde_json::json!(fp_score.recommendation));
        events.push(TimelineEvent {
            timestamp: start + Duration::milliseconds(800),
            event_type: TimelineEventType::Analysis,
            title: "False-positive analysis complete".to_string(),
            description: fp_score.explanation.clone(),
            source: "fp_analyzer".to_string(),
            data: fp_data,
            severity: None,
        });

        events.push(TimelineEvent {
            timestamp: start + Duration::milliseconds(850),
            event_type: TimelineEventType::Correlation,
            title: "Cross-agent correlation".to_string(),
            description: "Findings correlated across all analysts".to_string(),
            source: "coordinator".to_string(),
            data: HashMap::new(),
            severity: None,
        });

        if findings.get("historical").map(|f| !f.key_findings.is_empty()).unwrap_or(false) {
            events.push(TimelineEvent {
                timestamp: start + Duration::milliseconds(870),
                event_type: TimelineEventType::Correlation,
                title: "Historical pattern correlation".to_string(),
                description: "Historical analyst key findings folded into correlation".to_string(),
                source: "coordinator".to_string(),
                data: HashMap::new(),
                severity: None,
            });
        }

        events.push(TimelineEvent {
            timestamp: start + Duration::milliseconds(900),
            event_type: TimelineEventType::Decision,
            title: "Severity decided".to_string(),
            description: format!("Final severity: {}", severity.as_str()),
            source: "coordinator".to_string(),
            data: HashMap::new(),
            severity: Some(severity),
        });

        events.push(action_event(
            start + Duration::milliseconds(950),
            &response_plan.primary_action.action_type,
            &response_plan.primary_action.target,
            true,
        ));
        for (i, action) in response_plan.secondary_actions.iter().enumerate() {
            events.push(action_event(
                start + Duration::milliseconds(960 + i as i64 * 10),
                &action.action_type,
                &action.target,
                false,
            ));
        }

        if !response_plan.escalation_path.is_empty() {
            events.push(TimelineEvent {
                timestamp: start + Duration::milliseconds(1000),
                event_type: TimelineEventType::Escalation,
                title: "Escalation path triggered".to_string(),
                description: format!("Escalation path: {}", response_plan.escalation_path.join(" -> ")),
                source: "response_engine".to_string(),
                data: HashMap::new(),
                severity: None,
            });
        }

        events.sort_by_key(|e| e.timestamp);

        let end_time = Utc::now();
        InvestigationTimeline {
            events,
            start_time: start,
            end_time,
            duration_ms: (end_time - start).num_milliseconds(),
        }
    }
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn action_event(timestamp: DateTime<Utc>, action_type: &crate::models::ActionType, target: &str, primary: bool) -> TimelineEvent {
    TimelineEvent {
        timestamp,
        event_type: TimelineEventType::Action,
        title: if primary { "Primary action planned".to_string() } else { "Secondary action planned".to_string() },
        description: format!("{action_type:?} recommended for {target}"),
        source: "response_engine".to_string(),
        data: HashMap::new(),
        severity: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionType, AgentFinding, FPRecommendation, Impact, ResponseAction, ThreatType, Urgency};
    use chrono::Utc;

    fn sample_signal() -> ThreatSignal {
        ThreatSignal {
            id: "s1".into(),
            threat_type: ThreatType::BotTraffic,
            customer_name: "acme".into(),
            customer_id: "c1".into(),
            source_ip: "1.2.3.4".into(),
            user_agent: None,
            request_count: 10,
            time_window_minutes: 5,
            detected_at: Utc::now(),
            raw_data: Default::default(),
        }
    }

    fn sample_plan() -> ResponsePlan {
        ResponsePlan {
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
            escalation_path: vec!["SOC Tier 1".into()],
            sla_minutes: 240,
            auto_escalate_after_minutes: 120,
            notes: "test".into(),
        }
    }

    fn sample_fp_score() -> FPScore {
        FPScore {
            score: 0.2,
            confidence: 0.6,
            indicators: vec![],
            historical_fp_rate: None,
            similar_resolved_as_fp: 0,
            similar_resolved_as_real: 0,
            recommendation: FPRecommendation::LikelyRealThreat,
            explanation: "test".into(),
        }
    }

    #[test]
    fn events_are_sorted_and_cover_required_phases() {
        let builder = TimelineBuilder::new();
        let mut findings = FindingsByAgent::new();
        findings.insert("historical".to_string(), AgentFinding::sentinel("historical"));
        let timeline = builder.build(&sample_signal(), &findings, &sample_fp_score(), &sample_plan(), Severity::Medium);

        let mut sorted = timeline.events.clone();
        sorted.sort_by_key(|e| e.timestamp);
        assert_eq!(timeline.events.len(), sorted.len());
        for (a, b) in timeline.events.iter().zip(sorted.iter()) {
            assert_eq!(a.timestamp, b.timestamp);
        }

        let has = |t: TimelineEventType| timeline.events.iter().any(|e| e.event_type == t);
        assert!(has(TimelineEventType::Detection));
        assert!(has(TimelineEventType::Enrichment));
        assert!(has(TimelineEventType::Analysis));
        assert!(has(TimelineEventType::Decision));
    }

    #[test]
    fn start_time_matches_detected_at() {
        let builder = TimelineBuilder::new();
        let signal = sample_signal();
        let timeline = builder.build(&signal, &FindingsByAgent::new(), &sample_fp_score(), &sample_plan(), Severity::Low);
        assert_eq!(timeline.start_time, signal.detected_at);
        assert!(timeline.duration_ms >= 0);
    }

    #[test]
    fn escalation_event_present_when_path_non_empty() {
        let builder = TimelineBuilder::new();
        let timeline = builder.build(&sample_signal(), &FindingsByAgent::new(), &sample_fp_score(), &sample_plan(), Severity::High);
        assert!(timeline.events.iter().any(|e| e.event_type == TimelineEventType::Escalation));
    }
}
