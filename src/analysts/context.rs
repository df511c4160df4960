//! Context analyst — folds in external threat intel filtered by
//! `{customer_name, threat_type}`.

use super::{base_prompt, run, Analyst, IntelContext, ReasoningMode};
use crate::models::{AgentFinding, ThreatSignal};

pub struct ContextAnalyst {
    mode: ReasoningMode,
}

impl ContextAnalyst {
    pub fn new(mode: ReasoningMode) -> Self {
        Self { mode }
    }

    pub async fn analyze(&self, signal: &ThreatSignal, context: &IntelContext) -> AgentFinding {
        let description = if context.intel.is_empty() {
            "no relevant external intel".to_string()
        } else {
            format!(
                "{} relevant intel items, top source: {}",
                context.intel.len(),
                context.intel[0].source,
            )
        };
        let prompt = base_prompt(signal, &description);
        run(
            self.name(),
            &self.mode,
            "You are a threat-intelligence analyst correlating external intel with an inbound signal.",
            &prompt,
        )
        .await
    }
}

impl Analyst for ContextAnalyst {
    fn name(&self) -> &'static str {
        "context"
    }
}
