//! Firewall rule command handlers.

use tabled::Tabled;

use bbox_api::{Action, FirewallRule, IpProtocol, Protocol, Session, WireValue, unique_description};

use crate::cli::{
    FirewallArgs, FirewallCommand, FirewallRuleArgs, GlobalOpts, RuleAction, RuleIpVersion,
    RuleProtocol,
};
use crate::error::CliError;
use crate::output;

use super::util;

fn map_action(a: &RuleAction) -> Action {
    match a {
        RuleAction::Allow => Action::Allow,
        RuleAction::Deny => Action::Deny,
    }
}

fn map_protocol(p: &RuleProtocol) -> Protocol {
    match p {
        RuleProtocol::Any => Protocol::Any,
        RuleProtocol::Tcp => Protocol::Tcp,
        RuleProtocol::Udp => Protocol::Udp,
    }
}

fn map_ip_version(v: &RuleIpVersion) -> IpProtocol {
    match v {
        RuleIpVersion::V4 => IpProtocol::V4,
        RuleIpVersion::V6 => IpProtocol::V6,
        RuleIpVersion::Both => IpProtocol::Both,
    }
}

fn build_rule(args: FirewallRuleArgs, description: String) -> FirewallRule {
    FirewallRule {
        enabled: !args.disabled,
        src_ip: WireValue::new(args.src_ip),
        src_ip_negate: args.src_ip_not,
        src_ports: WireValue::new(args.src_ports),
        src_port_negate: args.src_ports_not,
        dst_ip: WireValue::new(args.dst_ip),
        dst_ip_negate: args.dst_ip_not,
        dst_ports: WireValue::new(args.dst_ports),
        dst_port_negate: args.dst_ports_not,
        order: args.order,
        protocols: map_protocol(&args.protocol),
        ip_protocol: map_ip_version(&args.ip_version),
        ..FirewallRule::new(description, map_action(&args.action))
    }
}

fn id_string(rule: &FirewallRule) -> String {
    rule.id.map_or_else(|| "-".into(), |id| id.to_string())
}

// ── Rule table row ──────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "On")]
    enabled: &'static str,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Src Ports")]
    src_ports: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Dst Ports")]
    dst_ports: String,
    #[tabled(rename = "Proto")]
    protocols: String,
    #[tabled(rename = "IP")]
    ip_protocol: String,
    #[tabled(rename = "Order")]
    order: u32,
}

impl From<&FirewallRule> for RuleRow {
    fn from(r: &FirewallRule) -> Self {
        Self {
            id: id_string(r),
            enabled: output::enabled_marker(r.enabled),
            description: output::truncate(&r.description, 32),
            action: r.action.to_string(),
            source: output::negated(r.src_ip.as_str(), r.src_ip_negate),
            src_ports: output::negated(r.src_ports.as_str(), r.src_port_negate),
            destination: output::negated(r.dst_ip.as_str(), r.dst_ip_negate),
            dst_ports: output::negated(r.dst_ports.as_str(), r.dst_port_negate),
            protocols: r.protocols.to_string(),
            ip_protocol: r.ip_protocol.to_string(),
            order: r.order,
        }
    }
}

fn rule_detail(r: &FirewallRule) -> String {
    [
        format!("ID:          {}", id_string(r)),
        format!("Description: {}", r.description),
        format!("Enabled:     {}", r.enabled),
        format!("Action:      {}", r.action),
        format!("Source:      {}", output::negated(r.src_ip.as_str(), r.src_ip_negate)),
        format!("Src Ports:   {}", output::negated(r.src_ports.as_str(), r.src_port_negate)),
        format!("Destination: {}", output::negated(r.dst_ip.as_str(), r.dst_ip_negate)),
        format!("Dst Ports:   {}", output::negated(r.dst_ports.as_str(), r.dst_port_negate)),
        format!("Protocols:   {}", r.protocols),
        format!("IP Version:  {}", r.ip_protocol),
        format!("Order:       {}", r.order),
        format!("Hits:        {}", r.utilisation),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: FirewallArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let gateway = session.firewall();

    match args.command {
        FirewallCommand::List => {
            let rules = gateway.list().await?;
            let out = output::render_list(&global.output_format(), &rules, |r| RuleRow::from(r), id_string)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FirewallCommand::Get { id } => {
            let rule = gateway.get(id).await?;
            let out = output::render_single(&global.output_format(), &rule, rule_detail, id_string)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FirewallCommand::Add { rule, unique } => {
            let description = if unique {
                unique_description(&rule.description)
            } else {
                rule.description.clone()
            };
            let rule = build_rule(rule, description);
            gateway.add(&rule).await?;
            output::report_success(
                global,
                &format!("Firewall rule '{}' created", rule.description),
            );
            Ok(())
        }

        FirewallCommand::Update { rule, id } => {
            let description = rule.description.clone();
            let rule = build_rule(rule, description);
            match id {
                Some(id) => gateway.update_by_id(id, &rule).await?,
                None => gateway.update(&rule).await?,
            }
            output::report_success(
                global,
                &format!("Firewall rule '{}' updated", rule.description),
            );
            Ok(())
        }

        FirewallCommand::Delete { id } => {
            if !util::confirm("firewall delete", &format!("Delete firewall rule {id}?"), global.yes)? {
                return Ok(());
            }
            gateway.delete(id).await?;
            output::report_success(global, &format!("Firewall rule {id} deleted"));
            Ok(())
        }

        FirewallCommand::Enable { id } => {
            gateway.set_enabled(id, true).await?;
            output::report_success(global, &format!("Firewall rule {id} enabled"));
            Ok(())
        }

        FirewallCommand::Disable { id } => {
            gateway.set_enabled(id, false).await?;
            output::report_success(global, &format!("Firewall rule {id} disabled"));
            Ok(())
        }
    }
}
