//! Static MITRE ATT&CK mapping table: threat type to tactics/techniques.

use crate::models::ThreatType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

struct MitreMapping {
    tactics: &'static [&'static str],
    techniques: &'static [&'static str],
}

static MITRE_TABLE: Lazy<HashMap<&'static str, MitreMapping>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "bot_traffic",
        MitreMapping {
            tactics: &["initial_access"],
            techniques: &["application_layer_protocol"],
        },
    );
    m.insert(
        "credential_stuffing",
        MitreMapping {
            tactics: &["credential_access"],
            techniques: &["credential_stuffing", "brute_force"],
        },
    );
    m.insert(
        "account_takeover",
        MitreMapping {
            tactics: &["credential_access", "persistence"],
            techniques: &["valid_accounts"],
        },
    );
    m.insert(
        "data_scraping",
        MitreMapping {
            tactics: &["collection"],
            techniques: &["automated_collection", "data_from_info_repos"],
        },
    );
    m.insert(
        "brute_force",
        MitreMapping {
            tactics: &["credential_access"],
            techniques: &["brute_force"],
        },
    );
    m.insert(
        "geo_anomaly",
        MitreMapping {
            tactics: &[],
            techniques: &[],
        },
    );
    m.insert(
        "rate_limit_breach",
        MitreMapping {
            tactics: &[],
            techniques: &[],
        },
    );
    m
});

pub fn tactics_for(threat_type: ThreatType) -> Vec<String> {
    MITRE_TABLE
        .get(threat_type.as_str())
        .map(|m| m.tactics.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

pub fn techniques_for(threat_type: ThreatType) -> Vec<String> {
    MITRE_TABLE
        .get(threat_type.as_str())
        .map(|m| m.techniques.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_stuffing_maps_to_two_techniques() {
        let techniques = techniques_for(ThreatType::CredentialStuffing);
        assert_eq!(techniques, vec!["credential_stuffing", "brute_force"]);
        assert_eq!(tactics_for(ThreatType::CredentialStuffing), vec!["credential_access"]);
    }

    #[test]
    fn geo_anomaly_and_rate_limit_breach_are_empty() {
        assert!(tactics_for(ThreatType::GeoAnomaly).is_empty());
        assert!(techniques_for(ThreatType::RateLimitBreach).is_empty());
    }
}
