//! NAT (port forwarding) command handlers.

use tabled::Tabled;

use bbox_api::{NatRule, Session};

use crate::cli::{GlobalOpts, NatArgs, NatCommand};
use crate::error::CliError;
use crate::output;

fn id_string(rule: &NatRule) -> String {
    rule.id.map_or_else(|| "-".into(), |id| id.to_string())
}

// ── Rule table row ──────────────────────────────────────────────────

#[derive(Tabled)]
struct NatRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "On")]
    enabled: &'static str,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "External")]
    external: String,
    #[tabled(rename = "Ext Port")]
    external_port: String,
    #[tabled(rename = "Internal")]
    internal: String,
    #[tabled(rename = "Int Port")]
    internal_port: String,
}

impl From<&NatRule> for NatRow {
    fn from(r: &NatRule) -> Self {
        Self {
            id: id_string(r),
            enabled: output::enabled_marker(r.enabled),
            description: output::truncate(&r.description, 32),
            protocol: r.protocol.to_string(),
            external: output::or_any(r.external_ip.as_str()),
            external_port: output::or_any(r.external_port.as_str()),
            internal: output::or_any(r.internal_ip.as_str()),
            internal_port: output::or_any(r.internal_port.as_str()),
        }
    }
}

fn nat_detail(r: &NatRule) -> String {
    [
        format!("ID:          {}", id_string(r)),
        format!("Description: {}", r.description),
        format!("Enabled:     {}", r.enabled),
        format!("Protocol:    {}", r.protocol),
        format!(
            "External:    {}:{}",
            output::or_any(r.external_ip.as_str()),
            output::or_any(r.external_port.as_str())
        ),
        format!(
            "Internal:    {}:{}",
            output::or_any(r.internal_ip.as_str()),
            output::or_any(r.internal_port.as_str())
        ),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: NatArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let gateway = session.nat();

    match args.command {
        NatCommand::List => {
            let table = gateway.table().await?;
            if !table.enabled && !global.quiet {
                eprintln!("NAT is disabled router-wide; rules below are inactive");
            }
            let out =
                output::render_list(&global.output_format(), &table.rules, |r| NatRow::from(r), id_string)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NatCommand::Get { id } => {
            let rule = gateway.get(id).await?;
            let out = output::render_single(&global.output_format(), &rule, nat_detail, id_string)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NatCommand::Enable { id } => {
            gateway.set_enabled(id, true).await?;
            output::report_success(global, &format!("NAT rule {id} enabled"));
            Ok(())
        }

        NatCommand::Disable { id } => {
            gateway.set_enabled(id, false).await?;
            output::report_success(global, &format!("NAT rule {id} disabled"));
            Ok(())
        }
    }
}
