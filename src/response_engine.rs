//! ResponseEngine — maps (threat_type, severity, fp_score) + customer
//! policy to a `ResponsePlan`. Pure function; deterministic.

use crate::models::{
    ActionType, CustomerConfig, FPScore, Impact, ResponseAction, ResponsePlan, Severity, ThreatSignal, ThreatType,
    Urgency,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static ACTION_TEMPLATES: Lazy<HashMap<(ThreatType, Severity), Vec<(ActionType, Urgency)>>> = Lazy::new(|| {
    use ActionType::*;
    use Severity::*;
    use ThreatType::*;
    use Urgency::*;

    let mut m = HashMap::new();

    m.insert((CredentialStuffing, Critical), vec![(BlockIp, Immediate), (Escalate, Immediate)]);
    m.insert((CredentialStuffing, High), vec![(BlockIp, Urgent), (Challenge, Urgent)]);
    m.insert((CredentialStuffing, Medium), vec![(Challenge, Normal), (Monitor, Normal)]);
    m.insert((CredentialStuffing, Low), vec![(Monitor, Low)]);

    m.insert((AccountTakeover, Critical), vec![(Quarantine, Immediate), (Escalate, Immediate)]);
    m.insert((AccountTakeover, High), vec![(Quarantine, Urgent), (Challenge, Urgent)]);
    m.insert((AccountTakeover, Medium), vec![(Challenge, Normal)]);
    m.insert((AccountTakeover, Low), vec![(Monitor, Low)]);

    m.insert((BruteForce, Critical), vec![(BlockIp, Immediate), (Escalate, Urgent)]);
    m.insert((BruteForce, High), vec![(BlockIp, Urgent)]);
    m.insert((BruteForce, Medium), vec![(RateLimit, Normal), (Challenge, Normal)]);
    m.insert((BruteForce, Low), vec![(Monitor, Low)]);

    m.insert((RateLimitBreach, Critical), vec![(RateLimit, Immediate), (Escalate, Urgent)]);
    m.insert((RateLimitBreach, High), vec![(RateLimit, Urgent)]);
    m.insert((RateLimitBreach, Medium), vec![(RateLimit, Normal)]);
    m.insert((RateLimitBreach, Low), vec![(Monitor, Low)]);

    m.insert((BotTraffic, Critical), vec![(BlockIp, Immediate)]);
    m.insert((BotTraffic, High), vec![(Challenge, Urgent), (RateLimit, Urgent)]);
    m.insert((BotTraffic, Medium), vec![(Challenge, Normal)]);
    m.insert((BotTraffic, Low), vec![(Monitor, Low)]);

    m.insert((DataScraping, Critical), vec![(BlockIp, Immediate), (Escalate, Urgent)]);
    m.insert((DataScraping, High), vec![(RateLimit, Urgent), (Challenge, Urgent)]);
    m.insert((DataScraping, Medium), vec![(RateLimit, Normal)]);
    m.insert((DataScraping, Low), vec![(Monitor, Low)]);

    m.insert((GeoAnomaly, Critical), vec![(Challenge, Immediate), (Escalate, Urgent)]);
    m.insert((GeoAnomaly, High), vec![(Challenge, Urgent)]);
    m.insert((GeoAnomaly, Medium), vec![(Monitor, Normal)]);
    m.insert((GeoAnomaly, Low), vec![(Monitor, Low)]);

    m
});

pub struct ResponseEngine;

impl ResponseEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_plan(
        &self,
        signal: &ThreatSignal,
        severity: Severity,
        fp_score: &FPScore,
        customer_config: Option<&CustomerConfig>,
    ) -> ResponsePlan {
        if fp_score.score >= 0.7 {
            return self.fp_override_plan(signal, fp_score);
        }

        let pairs = ACTION_TEMPLATES
            .get(&(signal.threat_type, severity))
            .cloned()
            .unwrap_or_else(|| vec![(ActionType::Monitor, Urgency::Normal)]);

        let mut actions: Vec<ResponseAction> = pairs
            .into_iter()
            .map(|(action_type, urgency)| build_action(signal, action_type, urgency, severity, customer_config))
            .collect();

        let primary_action = actions.remove(0);
        let (sla_minutes, auto_escalate_after_minutes) = sla_for(severity);

        ResponsePlan {
            primary_action,
            secondary_actions: actions,
            escalation_path: escalation_path_for(severity, customer_config),
            sla_minutes,
            auto_escalate_after_minutes,
            notes: format!("Response plan generated for {} severity {}.", severity.as_str(), signal.threat_type.as_str()),
        }
    }

    fn fp_override_plan(&self, signal: &ThreatSignal, fp_score: &FPScore) -> ResponsePlan {
        let mut parameters = HashMap::new();
        parameters.insert("duration_minutes".to_string(), serde_json::json!(30));

        let primary_action = ResponseAction {
            action_type: ActionType::Monitor,
            urgency: Urgency::Low,
            target: signal.source_ip.clone(),
            reason: "False-positive likelihood exceeds the override threshold".to_string(),
            confidence: fp_score.confidence,
            auto_executable: true,
            requires_approval: false,
            estimated_impact: Impact::Low,
            rollback_possible: true,
            parameters,
        };

        ResponsePlan {
            primary_action,
            secondary_actions: Vec::new(),
            escalation_path: vec!["SOC Tier 1".to_string()],
            sla_minutes: 240,
            auto_escalate_after_minutes: 120,
            notes: format!("FP override: {}", fp_score.explanation),
        }
    }
}

impl Default for ResponseEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn build_action(
    signal: &ThreatSignal,
    action_type: ActionType,
    urgency: Urgency,
    severity: Severity,
    customer_config: Option<&CustomerConfig>,
) -> ResponseAction {
    let target = match action_type {
        ActionType::BlockIp | ActionType::RateLimit | ActionType::Challenge | ActionType::Monitor => {
            signal.source_ip.clone()
        }
        ActionType::Quarantine => signal.user_id().map(String::from).unwrap_or_else(|| signal.customer_name.clone()),
        _ => signal.customer_name.clone(),
    };

    let mut auto_executable = matches!(
        action_type,
        ActionType::RateLimit | ActionType::Challenge | ActionType::Monitor | ActionType::Escalate
    );

    let parameters = parameters_for(action_type);

    if action_type == ActionType::BlockIp {
        if let Some(cfg) = customer_config {
            if cfg.auto_block_enabled {
                auto_executable = true;
            }
        }
    }

    ResponseAction {
        action_type,
        urgency,
        target,
        reason: format!("{:?} recommended for {} severity signal", action_type, severity.as_str()),
        confidence: if matches!(severity, Severity::Critical | Severity::High) { 0.8 } else { 0.6 },
        auto_executable,
        requires_approval: !auto_executable,
        estimated_impact: impact_for(action_type),
        rollback_possible: !matches!(action_type, ActionType::Escalate),
        parameters,
    }
}

fn parameters_for(action_type: ActionType) -> HashMap<String, serde_json::Value> {
    let mut parameters = HashMap::new();
    match action_type {
        ActionType::BlockIp => {
            parameters.insert("duration_minutes".to_string(), serde_json::json!(60));
            parameters.insert("scope".to_string(), serde_json::json!("customer"));
        }
        ActionType::RateLimit => {
            parameters.insert("requests_per_minute".to_string(), serde_json::json!(10));
            parameters.insert("duration_minutes".to_string(), serde_json::json!(30));
        }
        ActionType::Challenge => {
            parameters.insert("challenge_type".to_string(), serde_json::json!("captcha"));
            parameters.insert("duration_minutes".to_string(), serde_json::json!(60));
        }
        ActionType::Monitor => {
            parameters.insert("duration_minutes".to_string(), serde_json::json!(60));
            parameters.insert("alert_threshold".to_string(), serde_json::json!(100));
        }
        ActionType::Whitelist => {
            parameters.insert("duration_minutes".to_string(), serde_json::json!(1440));
        }
        ActionType::Escalate => {
            parameters.insert("escalation_level".to_string(), serde_json::json!("Tier 2"));
        }
        ActionType::Quarantine => {
            parameters.insert("notify_user".to_string(), serde_json::json!(true));
        }
        ActionType::None => {}
    }
    parameters
}

fn impact_for(action_type: ActionType) -> Impact {
    match action_type {
        ActionType::BlockIp | ActionType::Quarantine => Impact::High,
        ActionType::RateLimit | ActionType::Challenge | ActionType::Escalate => Impact::Medium,
        _ => Impact::Low,
    }
}

fn sla_for(severity: Severity) -> (u32, u32) {
    let sla_minutes = match severity {
        Severity::Critical => 15,
        Severity::High => 30,
        Severity::Medium => 60,
        Severity::Low => 240,
        Severity::Info => 480,
    };
    (sla_minutes, sla_minutes / 2)
}

fn escalation_path_for(severity: Severity, customer_config: Option<&CustomerConfig>) -> Vec<String> {
    let mut path: Vec<String> = match severity {
        Severity::Critical => vec!["SOC Tier 2", "SOC Manager", "CISO", "Customer Success"],
        Severity::High => vec!["SOC Tier 2", "SOC Manager", "Customer Success"],
        Severity::Medium => vec!["SOC Tier 1", "SOC Tier 2"],
        Severity::Low | Severity::Info => vec!["SOC Tier 1"],
    }
    .into_iter()
    .map(String::from)
    .collect();

    if let Some(cfg) = customer_config {
        path.extend(cfg.escalation_contacts.iter().take(2).cloned());
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThreatType;
    use chrono::Utc;

    fn signal(threat_type: ThreatType) -> ThreatSignal {
        ThreatSignal {
            id: "s1".into(),
            threat_type,
            customer_name: "acme".into(),
            customer_id: "c1".into(),
            source_ip: "91.134.152.78".into(),
            user_agent: None,
            request_count: 5000,
            time_window_minutes: 10,
            detected_at: Utc::now(),
            raw_data: Default::default(),
        }
    }

    fn low_fp_score() -> FPScore {
        FPScore {
            score: 0.1,
            confidence: 0.7,
            indicators: vec![],
            historical_fp_rate: None,
            similar_resolved_as_fp: 0,
            similar_resolved_as_real: 0,
            recommendation: crate::models::FPRecommendation::LikelyRealThreat,
            explanation: "likely real".to_string(),
        }
    }

    #[test]
    fn credential_stuffing_critical_blocks_ip_immediately() {
        let engine = ResponseEngine::new();
        let plan = engine.generate_plan(&signal(ThreatType::CredentialStuffing), Severity::Critical, &low_fp_score(), None);
        assert_eq!(plan.primary_action.action_type, ActionType::BlockIp);
        assert_eq!(plan.primary_action.urgency, Urgency::Immediate);
        assert!(!plan.primary_action.auto_executable);
        assert!(plan.primary_action.requires_approval);
        assert_eq!(plan.sla_minutes, 15);
        assert!(plan.escalation_path.contains(&"CISO".to_string()));
    }

    #[test]
    fn auto_block_tenant_flips_block_ip_action() {
        let engine = ResponseEngine::new();
        let config = CustomerConfig { auto_block_enabled: true, escalation_contacts: vec![] };
        let plan = engine.generate_plan(&signal(ThreatType::CredentialStuffing), Severity::Critical, &low_fp_score(), Some(&config));
        assert!(plan.primary_action.auto_executable);
        assert!(!plan.primary_action.requires_approval);
    }

    #[test]
    fn fp_override_yields_monitor_plan() {
        let engine = ResponseEngine::new();
        let fp_score = FPScore {
            score: 0.75,
            confidence: 0.9,
            indicators: vec![],
            historical_fp_rate: None,
            similar_resolved_as_fp: 0,
            similar_resolved_as_real: 0,
            recommendation: crate::models::FPRecommendation::LikelyFalsePositive,
            explanation: "benign crawler".to_string(),
        };
        let plan = engine.generate_plan(&signal(ThreatType::BotTraffic), Severity::Low, &fp_score, None);
        assert_eq!(plan.primary_action.action_type, ActionType::Monitor);
        assert_eq!(plan.primary_action.urgency, Urgency::Low);
        assert!(plan.primary_action.auto_executable);
        assert_eq!(plan.sla_minutes, 240);
    }

    #[test]
    fn auto_executable_and_requires_approval_are_never_both_true() {
        let engine = ResponseEngine::new();
        for severity in [Severity::Critical, Severity::High, Severity::Medium, Severity::Low] {
            let plan = engine.generate_plan(&signal(ThreatType::AccountTakeover), severity, &low_fp_score(), None);
            assert!(!(plan.primary_action.auto_executable && plan.primary_action.requires_approval));
            for action in &plan.secondary_actions {
                assert!(!(action.auto_executable && action.requires_approval));
            }
        }
    }

    #[test]
    fn unmapped_combination_falls_back_to_monitor() {
        let engine = ResponseEngine::new();
        let plan = engine.generate_plan(&signal(ThreatType::GeoAnomaly), Severity::Info, &low_fp_score(), None);
        assert_eq!(plan.primary_action.action_type, ActionType::Monitor);
    }

    #[test]
    fn is_deterministic() {
        let engine = ResponseEngine::new();
        let a = engine.generate_plan(&signal(ThreatType::RateLimitBreach), Severity::Medium, &low_fp_score(), None);
        let b = engine.generate_plan(&signal(ThreatType::RateLimitBreach), Severity::Medium, &low_fp_score(), None);
        assert_eq!(a.primary_action.action_type, b.primary_action.action_type);
        assert_eq!(a.sla_minutes, b.sla_minutes);
    }
}
