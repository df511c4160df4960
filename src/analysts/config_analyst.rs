//! Config analyst — evaluates the signal against the customer's configured
//! policy (auto-block posture, escalation contacts, etc).

use super::{base_prompt, run, Analyst, ConfigContext, ReasoningMode};
use crate::models::{AgentFinding, ThreatSignal};

pub struct ConfigAnalyst {
    mode: ReasoningMode,
}

impl ConfigAnalyst {
    pub fn new(mode: ReasoningMode) -> Self {
        Self { mode }
    }

    pub async fn analyze(&self, signal: &ThreatSignal, context: &ConfigContext) -> AgentFinding {
        let description = match &context.customer_config {
            Some(cfg) => format!(
                "customer policy on file: auto_block_enabled={}, {} escalation contacts configured",
                cfg.auto_block_enabled,
                cfg.escalation_contacts.len(),
            ),
            None => "no customer policy on file, defaults apply".to_string(),
        };
        let prompt = base_prompt(signal, &description);
        run(
            self.name(),
            &self.mode,
            "You are a policy analyst evaluating a threat signal against the customer's configured security posture.",
            &prompt,
        )
        .await
    }
}

impl Analyst for ConfigAnalyst {
    fn name(&self) -> &'static str {
        "config"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerConfig;
    use chrono::Utc;

    fn sample_signal() -> ThreatSignal {
        ThreatSignal {
            id: "s1".into(),
            threat_type: crate::models::ThreatType::CredentialStuffing,
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

    #[tokio::test]
    async fn reports_configured_policy() {
        let analyst = ConfigAnalyst::new(ReasoningMode::Mock);
        let context = ConfigContext {
            customer_config: Some(CustomerConfig {
                auto_block_enabled: true,
                escalation_contacts: vec!["soc@acme.test".into()],
            }),
        };
        let finding = analyst.analyze(&sample_signal(), &context).await;
        assert_eq!(finding.agent_name, "config");
    }
}
