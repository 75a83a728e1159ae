use serde::{Deserialize, Serialize};

use super::Protocol;
use crate::codec::RuleKind;
use crate::wire::{WireValue, flag, flag_str};

/// A port-forwarding rule from `GET /nat/rules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(rename = "enable", with = "flag", default)]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(rename = "externalip", default)]
    pub external_ip: WireValue,
    #[serde(rename = "externalport", default)]
    pub external_port: WireValue,
    #[serde(rename = "internalip", default)]
    pub internal_ip: WireValue,
    #[serde(rename = "internalport", default)]
    pub internal_port: WireValue,
}

impl NatRule {
    /// A new enabled forward of `external_port` to `internal_ip:internal_port`.
    pub fn new(
        description: impl Into<String>,
        external_port: impl Into<WireValue>,
        internal_ip: impl Into<WireValue>,
        internal_port: impl Into<WireValue>,
    ) -> Self {
        Self {
            id: None,
            enabled: true,
            description: description.into(),
            protocol: Protocol::Any,
            external_ip: WireValue::any(),
            external_port: external_port.into(),
            internal_ip: internal_ip.into(),
            internal_port: internal_port.into(),
        }
    }
}

/// `{"nat": {...}}` -- the single element of the list response array.
#[derive(Debug, Clone, Deserialize)]
pub struct NatEnvelope {
    pub nat: NatTable,
}

/// The NAT table, including the router-wide on/off switch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NatTable {
    #[serde(rename = "enable", with = "flag", default)]
    pub enabled: bool,
    #[serde(default)]
    pub rules: Vec<NatRule>,
}

impl RuleKind for NatRule {
    const PATH: &'static str = "nat/rules";
    const LABEL: &'static str = "NAT rule";
    type Envelope = NatEnvelope;

    fn into_rules(envelope: NatEnvelope) -> Vec<Self> {
        envelope.nat.rules
    }

    fn id(&self) -> Option<u32> {
        self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("enable", flag_str(self.enabled).to_owned()),
            ("description", self.description.clone()),
            ("protocol", self.protocol.as_ref().to_owned()),
            ("externalip", self.external_ip.to_string()),
            ("externalport", self.external_port.to_string()),
            ("internalip", self.internal_ip.to_string()),
            ("internalport", self.internal_port.to_string()),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::codec::decode_envelope;

    #[test]
    fn decodes_table_and_numeric_ports() {
        let body = json!([{
            "nat": {
                "enable": 1,
                "rules": [{
                    "id": 1,
                    "enable": 0,
                    "description": "minecraft",
                    "protocol": "tcp",
                    "externalip": "",
                    "externalport": 25565,
                    "internalip": "192.168.1.50",
                    "internalport": "25565"
                }]
            }
        }])
        .to_string();

        let env: NatEnvelope = decode_envelope(&body).unwrap();
        assert!(env.nat.enabled);
        let rule = &env.nat.rules[0];
        assert!(!rule.enabled);
        assert_eq!(rule.external_port.as_str(), "25565");
        assert_eq!(rule.internal_port.as_str(), "25565");
        assert_eq!(rule.protocol, Protocol::Tcp);
    }

    #[test]
    fn missing_rules_decode_as_empty() {
        let env: NatEnvelope = decode_envelope(r#"[{"nat": {"enable": 0}}]"#).unwrap();
        assert!(NatRule::into_rules(env).is_empty());
    }

    #[test]
    fn form_fields_are_the_reduced_set() {
        let rule = NatRule::new("ssh", 2222u32, "192.168.1.2", 22u32);
        let keys: Vec<_> = rule.form_fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            [
                "enable",
                "description",
                "protocol",
                "externalip",
                "externalport",
                "internalip",
                "internalport"
            ]
        );
    }
}
