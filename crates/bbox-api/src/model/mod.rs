// Router API models
//
// Rule records and the enums they share. Field names on the wire follow
// the router's flat lowercase spelling (`srcipnot`, `dstports`, ...);
// Rust-side names are spelled out and mapped with `#[serde(rename)]`.

pub mod firewall;
pub mod nat;
pub mod token;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

pub use firewall::{FirewallEnvelope, FirewallRule, FirewallTable};
pub use nat::{NatEnvelope, NatRule, NatTable};
pub use token::{BearerToken, DeviceTokenEnvelope};

/// What a firewall rule does with matching traffic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Action {
    #[serde(rename = "Accept")]
    #[strum(serialize = "Accept")]
    Allow,
    #[default]
    #[serde(rename = "Drop")]
    #[strum(serialize = "Drop")]
    Deny,
}

/// Transport protocol set. "Any" is the literal list `tcp,udp`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Protocol {
    #[default]
    #[serde(rename = "tcp,udp")]
    #[strum(serialize = "tcp,udp")]
    Any,
    #[serde(rename = "tcp")]
    #[strum(serialize = "tcp")]
    Tcp,
    #[serde(rename = "udp")]
    #[strum(serialize = "udp")]
    Udp,
}

/// IP version scope of a firewall rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum IpProtocol {
    #[serde(rename = "IPv4")]
    #[strum(serialize = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    #[strum(serialize = "IPv6")]
    V6,
    #[default]
    #[serde(rename = "IPv4+IPv6")]
    #[strum(serialize = "IPv4+IPv6")]
    Both,
}

/// Append a random suffix to a description so update-by-description
/// can find exactly this rule later. The router does not enforce
/// unique descriptions.
pub fn unique_description(base: &str) -> String {
    format!("{base}-bbcli-{}", Uuid::new_v4())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn any_protocol_is_the_literal_pair() {
        assert_eq!(Protocol::Any.as_ref(), "tcp,udp");
        assert_eq!(Protocol::from_str("tcp,udp").unwrap(), Protocol::Any);
        assert_eq!(
            serde_json::from_str::<Protocol>("\"tcp,udp\"").unwrap(),
            Protocol::Any
        );
    }

    #[test]
    fn action_uses_router_spelling() {
        assert_eq!(Action::Allow.to_string(), "Accept");
        assert_eq!(
            serde_json::from_str::<Action>("\"Drop\"").unwrap(),
            Action::Deny
        );
    }

    #[test]
    fn ip_protocol_round_trips() {
        for p in [IpProtocol::V4, IpProtocol::V6, IpProtocol::Both] {
            assert_eq!(IpProtocol::from_str(p.as_ref()).unwrap(), p);
        }
    }

    #[test]
    fn unique_description_keeps_base_and_differs() {
        let a = unique_description("ssh");
        let b = unique_description("ssh");
        assert!(a.starts_with("ssh-bbcli-"));
        assert_ne!(a, b);
    }
}
