//! Clap derive structures for the `bbcli` CLI.
//!
//! Defines the command tree, global flags, and the value enums that map
//! onto the router's rule fields.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bbcli -- manage Bbox router firewall and NAT rules
#[derive(Debug, Parser)]
#[command(
    name = "bbcli",
    version,
    about = "Manage Bbox router firewall and NAT rules from the command line",
    long_about = "Talks to the Bbox router's management API (cookie login plus\n\
        a short-lived bearer token) to list, create, update, toggle and\n\
        delete firewall and port-forwarding rules.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Router profile to use
    #[arg(long, short = 'p', env = "BBOX_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base endpoint (overrides profile), e.g. https://192.168.1.254/api/v1
    #[arg(long, short = 'u', env = "BBOX_URL", global = true)]
    pub url: Option<String>,

    /// Router admin password
    #[arg(long, env = "BBOX_PWD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format [default: `defaults.output` from config, else table]
    #[arg(long, short = 'o', env = "BBOX_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: `defaults.color` from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "BBOX_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BBOX_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.clone().unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one rule id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage firewall rules
    #[command(alias = "fw")]
    Firewall(FirewallArgs),

    /// Manage NAT (port forwarding) rules
    Nat(NatArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FIREWALL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FirewallArgs {
    #[command(subcommand)]
    pub command: FirewallCommand,
}

#[derive(Debug, Subcommand)]
pub enum FirewallCommand {
    /// List all firewall rules
    #[command(alias = "ls")]
    List,

    /// Show a single firewall rule
    Get {
        /// Rule ID
        id: u32,
    },

    /// Create a firewall rule
    Add {
        #[command(flatten)]
        rule: FirewallRuleArgs,

        /// Append a random suffix so the description is unique
        #[arg(long)]
        unique: bool,
    },

    /// Replace a firewall rule, matched by description unless --id is given
    Update {
        #[command(flatten)]
        rule: FirewallRuleArgs,

        /// Target rule ID (skips the description lookup)
        #[arg(long)]
        id: Option<u32>,
    },

    /// Delete a firewall rule
    #[command(alias = "rm")]
    Delete {
        /// Rule ID
        id: u32,
    },

    /// Enable a firewall rule
    Enable {
        /// Rule ID
        id: u32,
    },

    /// Disable a firewall rule
    Disable {
        /// Rule ID
        id: u32,
    },
}

/// Fields of a firewall rule. Empty addresses and ports mean "any".
#[derive(Debug, Args)]
pub struct FirewallRuleArgs {
    /// Rule description (also the key for `update`)
    #[arg(long, short = 'd')]
    pub description: String,

    /// Verdict for matching traffic
    #[arg(long, value_enum, default_value = "deny")]
    pub action: RuleAction,

    /// Create the rule disabled
    #[arg(long)]
    pub disabled: bool,

    /// Source IP or range
    #[arg(long, default_value = "")]
    pub src_ip: String,

    /// Match everything except the source IP
    #[arg(long)]
    pub src_ip_not: bool,

    /// Source ports (e.g. "80", "1000-2000")
    #[arg(long, default_value = "")]
    pub src_ports: String,

    /// Match everything except the source ports
    #[arg(long)]
    pub src_ports_not: bool,

    /// Destination IP or range
    #[arg(long, default_value = "")]
    pub dst_ip: String,

    /// Match everything except the destination IP
    #[arg(long)]
    pub dst_ip_not: bool,

    /// Destination ports (e.g. "22", "80,443")
    #[arg(long, default_value = "")]
    pub dst_ports: String,

    /// Match everything except the destination ports
    #[arg(long)]
    pub dst_ports_not: bool,

    /// Evaluation order (lower runs first)
    #[arg(long, default_value = "1")]
    pub order: u32,

    /// Transport protocol
    #[arg(long, value_enum, default_value = "any")]
    pub protocol: RuleProtocol,

    /// IP family
    #[arg(long, value_enum, default_value = "both")]
    pub ip_version: RuleIpVersion,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum RuleAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum RuleProtocol {
    /// TCP and UDP
    Any,
    Tcp,
    Udp,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum RuleIpVersion {
    V4,
    V6,
    Both,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NAT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NatArgs {
    #[command(subcommand)]
    pub command: NatCommand,
}

#[derive(Debug, Subcommand)]
pub enum NatCommand {
    /// List all NAT rules
    #[command(alias = "ls")]
    List,

    /// Show a single NAT rule
    Get {
        /// Rule ID
        id: u32,
    },

    /// Enable a NAT rule
    Enable {
        /// Rule ID
        id: u32,
    },

    /// Disable a NAT rule
    Disable {
        /// Rule ID
        id: u32,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration (passwords masked)
    Show,

    /// Print the config file path
    Path,

    /// Store the router password in the system keyring (honours --profile)
    SetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
