//! FPAnalyzer — deterministic false-positive scoring. Pure function of its
//! inputs: no I/O, no randomness, no shared state.

use crate::models::{FPIndicator, FPRecommendation, FPScore, AgentFinding, SimilarIncident, ThreatSignal, ThreatType};
use once_cell::sync::Lazy;
use std::collections::HashMap;

const BENIGN_BOT_UA: &[&str] = &[
    "googlebot",
    "bingbot",
    "slackbot",
    "facebookexternalhit",
    "twitterbot",
    "linkedinbot",
    "pingdom",
    "uptimerobot",
];

const SUSPICIOUS_UA: &[&str] = &["python-requests", "curl", "wget", "scanner"];

const BENIGN_IP_PREFIXES: &[&str] = &["66.249.", "157.55.", "40.77."];
const RFC1918_PREFIXES: &[&str] = &["10.", "192.168."];

const BENIGN_ENDPOINTS: &[&str] = &["/health", "/ping", "/status", "/ready"];

static FP_BASELINES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("bot_traffic", 0.35);
    m.insert("credential_stuffing", 0.15);
    m.insert("account_takeover", 0.10);
    m.insert("rate_limit_breach", 0.45);
    m.insert("geo_anomaly", 0.55);
    m.insert("data_scraping", 0.40);
    m.insert("brute_force", 0.20);
    m
});

fn baseline_for(threat_type: ThreatType) -> f64 {
    *FP_BASELINES.get(threat_type.as_str()).unwrap_or(&0.3)
}

pub struct FPAnalyzer;

impl FPAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(
        &self,
        signal: &ThreatSignal,
        findings: &[AgentFinding],
        similar_incidents: &[SimilarIncident],
    ) -> FPScore {
        let baseline = baseline_for(signal.threat_type);
        let indicators = self.compute_indicators(signal, findings, similar_incidents);

        let weight_sum: f64 = indicators.iter().map(|i| i.weight).sum();
        let score = round3((baseline + 0.3 * weight_sum).clamp(0.0, 1.0));

        let confidence = round3(
            (0.5 + (0.05 * similar_incidents.len() as f64).min(0.3)
                + (0.04 * indicators.len() as f64).min(0.2))
            .min(1.0),
        );

        let similar_resolved_as_fp = similar_incidents.iter().filter(|i| i.resolved_as_fp).count() as u32;
        let similar_resolved_as_real = similar_incidents.len() as u32 - similar_resolved_as_fp;
        let historical_fp_rate = if similar_incidents.is_empty() {
            None
        } else {
            Some(similar_resolved_as_fp as f64 / similar_incidents.len() as f64)
        };

        let recommendation = recommendation_for(score);
        let explanation = explanation_for(recommendation);

        FPScore {
            score,
            confidence,
            indicators,
            historical_fp_rate,
            similar_resolved_as_fp,
            similar_resolved_as_real,
            recommendation,
            explanation,
        }
    }

    fn compute_indicators(
        &self,
        signal: &ThreatSignal,
        findings: &[AgentFinding],
        similar_incidents: &[SimilarIncident],
    ) -> Vec<FPIndicator> {
        let mut indicators = Vec::new();

        if let Some(ua) = signal.user_agent.as_deref() {
            let lowered = ua.to_lowercase();
            if BENIGN_BOT_UA.iter().any(|s| lowered.contains(s)) {
                indicators.push(FPIndicator {
                    name: "user_agent".to_string(),
                    weight: 0.4,
                    description: "user agent matches a known benign bot".to_string(),
                    source: "signal.user_agent".to_string(),
                });
            } else if SUSPICIOUS_UA.iter().any(|s| lowered.contains(s)) {
                indicators.push(FPIndicator {
                    name: "user_agent".to_string(),
                    weight: -0.2,
                    description: "user agent matches a scripting/scanning tool".to_string(),
                    source: "signal.user_agent".to_string(),
                });
            }
        }

        if BENIGN_IP_PREFIXES.iter().any(|p| signal.source_ip.starts_with(p)) {
            indicators.push(FPIndicator {
                name: "ip_range".to_string(),
                weight: 0.5,
                description: "source IP falls within a known benign range".to_string(),
                source: "signal.source_ip".to_string(),
            });
        } else if RFC1918_PREFIXES.iter().any(|p| signal.source_ip.starts_with(p)) {
            indicators.push(FPIndicator {
                name: "ip_range".to_string(),
                weight: 0.3,
                description: "source IP is within an RFC1918 private range".to_string(),
                source: "signal.source_ip".to_string(),
            });
        }

        let rpm = signal.requests_per_minute();
        if rpm < 10.0 {
            indicators.push(FPIndicator {
                name: "request_volume".to_string(),
                weight: 0.2,
                description: "request volume is low relative to the observation window".to_string(),
                source: "signal.request_count".to_string(),
            });
        } else if rpm > 1000.0 {
            indicators.push(FPIndicator {
                name: "request_volume".to_string(),
                weight: -0.3,
                description: "request volume is unusually high".to_string(),
                source: "signal.request_count".to_string(),
            });
        }

        if !similar_incidents.is_empty() {
            let fp_count = similar_incidents.iter().filter(|i| i.resolved_as_fp).count();
            let fp_rate = fp_count as f64 / similar_incidents.len() as f64;
            if fp_rate > 0.5 {
                indicators.push(FPIndicator {
                    name: "historical_fp_rate".to_string(),
                    weight: 0.3,
                    description: "most similar prior incidents resolved as false positives".to_string(),
                    source: "knowledge_store.similar_incidents".to_string(),
                });
            } else if fp_rate < 0.2 {
                indicators.push(FPIndicator {
                    name: "historical_fp_rate".to_string(),
                    weight: -0.3,
                    description: "most similar prior incidents resolved as real threats".to_string(),
                    source: "knowledge_store.similar_incidents".to_string(),
                });
            }

            let same_customer_fp = similar_incidents
                .iter()
                .filter(|i| i.customer_name == signal.customer_name && i.resolved_as_fp)
                .count();
            let same_customer_total = similar_incidents
                .iter()
                .filter(|i| i.customer_name == signal.customer_name)
                .count();
            if same_customer_total >= 3 && same_customer_fp >= 2 {
                indicators.push(FPIndicator {
                    name: "repeat_customer_fp".to_string(),
                    weight: 0.25,
                    description: "this customer has repeatedly produced false positives for similar signals".to_string(),
                    source: "knowledge_store.similar_incidents".to_string(),
                });
            }
        }

        if !findings.is_empty() {
            let mean_confidence: f64 = findings.iter().map(|f| f.confidence).sum::<f64>() / findings.len() as f64;
            if mean_confidence < 0.5 {
                indicators.push(FPIndicator {
                    name: "agent_confidence".to_string(),
                    weight: 0.2,
                    description: "analyst findings carried low average confidence".to_string(),
                    source: "findings".to_string(),
                });
            } else if mean_confidence > 0.85 {
                indicators.push(FPIndicator {
                    name: "agent_confidence".to_string(),
                    weight: -0.2,
                    description: "analyst findings carried high average confidence".to_string(),
                    source: "findings".to_string(),
                });
            }
        }

        if let Some(endpoint) = signal.endpoint() {
            if BENIGN_ENDPOINTS.contains(&endpoint) {
                indicators.push(FPIndicator {
                    name: "benign_endpoint".to_string(),
                    weight: 0.4,
                    description: "traffic targets a known benign endpoint".to_string(),
                    source: "signal.raw_data.endpoint".to_string(),
                });
            }
        }

        indicators
    }
}

impl Default for FPAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn recommendation_for(score: f64) -> FPRecommendation {
    if score >= 0.7 {
        FPRecommendation::LikelyFalsePositive
    } else if score >= 0.4 {
        FPRecommendation::NeedsReview
    } else {
        FPRecommendation::LikelyRealThreat
    }
}

fn explanation_for(recommendation: FPRecommendation) -> String {
    match recommendation {
        FPRecommendation::LikelyFalsePositive => {
            "Indicators strongly favor a benign explanation; this signal is likely a false positive.".to_string()
        }
        FPRecommendation::NeedsReview => {
            "Indicators are mixed; this signal needs human review before a disposition is made.".to_string()
        }
        FPRecommendation::LikelyRealThreat => {
            "Indicators favor a genuine threat; treat this signal as likely real.".to_string()
        }
    }
}
