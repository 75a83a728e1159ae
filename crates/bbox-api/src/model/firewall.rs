use serde::{Deserialize, Serialize};

use super::{Action, IpProtocol, Protocol};
use crate::codec::RuleKind;
use crate::wire::{WireValue, flag, flag_str};

/// A single firewall rule from `GET /firewall/rules`.
///
/// `id` is assigned by the router and absent on rules built locally for
/// creation. `utilisation` is a server-side hit counter and never sent back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "enable", with = "flag", default)]
    pub enabled: bool,
    #[serde(default)]
    pub action: Action,

    // Source
    #[serde(rename = "srcipnot", with = "flag", default)]
    pub src_ip_negate: bool,
    #[serde(rename = "srcip", default)]
    pub src_ip: WireValue,
    #[serde(rename = "srcportnot", with = "flag", default)]
    pub src_port_negate: bool,
    #[serde(rename = "srcports", default)]
    pub src_ports: WireValue,

    // Destination
    #[serde(rename = "dstipnot", with = "flag", default)]
    pub dst_ip_negate: bool,
    #[serde(rename = "dstip", default)]
    pub dst_ip: WireValue,
    #[serde(rename = "dstportnot", with = "flag", default)]
    pub dst_port_negate: bool,
    #[serde(rename = "dstports", default)]
    pub dst_ports: WireValue,

    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub protocols: Protocol,
    #[serde(rename = "ipprotocol", default)]
    pub ip_protocol: IpProtocol,
    #[serde(default)]
    pub utilisation: u64,
}

impl FirewallRule {
    /// A new enabled rule matching any address, port and protocol.
    pub fn new(description: impl Into<String>, action: Action) -> Self {
        Self {
            id: None,
            description: description.into(),
            enabled: true,
            action,
            src_ip_negate: false,
            src_ip: WireValue::any(),
            src_port_negate: false,
            src_ports: WireValue::any(),
            dst_ip_negate: false,
            dst_ip: WireValue::any(),
            dst_port_negate: false,
            dst_ports: WireValue::any(),
            order: 1,
            protocols: Protocol::Any,
            ip_protocol: IpProtocol::Both,
            utilisation: 0,
        }
    }
}

/// `{"firewall": {...}}` -- the single element of the list response array.
#[derive(Debug, Clone, Deserialize)]
pub struct FirewallEnvelope {
    pub firewall: FirewallTable,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirewallTable {
    #[serde(default)]
    pub rules: Vec<FirewallRule>,
}

impl RuleKind for FirewallRule {
    const PATH: &'static str = "firewall/rules";
    const LABEL: &'static str = "firewall rule";
    type Envelope = FirewallEnvelope;

    fn into_rules(envelope: FirewallEnvelope) -> Vec<Self> {
        envelope.firewall.rules
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
            ("action", self.action.as_ref().to_owned()),
            ("srcipnot", flag_str(self.src_ip_negate).to_owned()),
            ("srcip", self.src_ip.to_string()),
            ("dstipnot", flag_str(self.dst_ip_negate).to_owned()),
            ("dstip", self.dst_ip.to_string()),
            ("srcportnot", flag_str(self.src_port_negate).to_owned()),
            ("srcports", self.src_ports.to_string()),
            ("dstportnot", flag_str(self.dst_port_negate).to_owned()),
            ("dstports", self.dst_ports.to_string()),
            ("order", self.order.to_string()),
            ("protocols", self.protocols.as_ref().to_owned()),
            ("ipprotocol", self.ip_protocol.as_ref().to_owned()),
            ("description", self.description.clone()),
        ]
    }
}
