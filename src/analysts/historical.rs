//! Historical analyst — weighs the signal against past incidents for the
//! same (threat_type, customer_name) pair.

use super::{base_prompt, run, Analyst, HistoricalContext, ReasoningMode};
use crate::models::{AgentFinding, ThreatSignal};

pub struct HistoricalAnalyst {
    mode: ReasoningMode,
}

impl HistoricalAnalyst {
    pub fn new(mode: ReasoningMode) -> Self {
        Self { mode }
    }

    pub async fn analyze(&self, signal: &ThreatSignal, context: &HistoricalContext) -> AgentFinding {
        let description = if context.similar_incidents.is_empty() {
            "no similar prior incidents on record".to_string()
        } else {
            format!(
                "{} similar prior incidents, {} resolved as false positives",
                context.similar_incidents.len(),
                context.similar_incidents.iter().filter(|i| i.resolved_as_fp).count(),
            )
        };
        let prompt = base_prompt(signal, &description);
        run(
            self.name(),
            &self.mode,
            "You are a historical-pattern threat analyst comparing a signal against past incidents for the same customer and threat type.",
            &prompt,
        )
        .await
    }
}

impl Analyst for HistoricalAnalyst {
    fn name(&self) -> &'static str {
        "historical"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn mock_analysis_names_agent_correctly() {
        let analyst = HistoricalAnalyst::new(ReasoningMode::Mock);
        let signal = ThreatSignal {
            id: "s1".into(),
            threat_type: crate::models::ThreatType::BotTraffic,
            customer_name: "acme".into(),
            customer_id: "c1".into(),
            source_ip: "1.2.3.4".into(),
            user_agent: None,
            request_count: 10,
            time_window_minutes: 5,
            detected_at: Utc::now(),
            raw_data: Default::default(),
        };
        let finding = analyst.analyze(&signal, &HistoricalContext::default()).await;
        assert_eq!(finding.agent_name, "historical");
        assert_eq!(finding.confidence, 0.85);
    }
}
