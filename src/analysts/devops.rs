//! Devops analyst — correlates the signal with infrastructure events from
//! the last 60 minutes (deploys, config pushes, incidents).

use super::{base_prompt, run, Analyst, DevopsContext, ReasoningMode};
use crate::models::{AgentFinding, ThreatSignal};

pub struct DevopsAnalyst {
    mode: ReasoningMode,
}

impl DevopsAnalyst {
    pub fn new(mode: ReasoningMode) -> Self {
        Self { mode }
    }

    pub async fn analyze(&self, signal: &ThreatSignal, context: &DevopsContext) -> AgentFinding {
        let description = if context.infra_events.is_empty() {
            "no infrastructure events in the last 60 minutes".to_string()
        } else {
            format!(
                "{} recent infrastructure events: {}",
                context.infra_events.len(),
                context
                    .infra_events
                    .iter()
                    .map(|e| e.description.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };
        let prompt = base_prompt(signal, &description);
        run(
            self.name(),
            &self.mode,
            "You are a devops correlation analyst checking whether recent infrastructure changes explain a threat signal.",
            &prompt,
        )
        .await
    }
}

impl Analyst for DevopsAnalyst {
    fn name(&self) -> &'static str {
        "devops"
    }
}
