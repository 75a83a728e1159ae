//! CLI error types with miette diagnostics.
//!
//! Maps `bbox_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use bbox_api::{NatRule, RuleKind};
use bbox_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the router at {url}")]
    #[diagnostic(
        code(bbcli::connection_failed),
        help(
            "Check that the router is reachable and the API endpoint is right.\n\
             Remote access uses https://mabbox.bytel.fr/api/v1; on the LAN try\n\
             --url https://192.168.1.254/api/v1 --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(bbcli::tls_error),
        help("Use --insecure (-k) to accept a self-signed certificate, or set ca_cert in your profile.")
    )]
    TlsError { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Login rejected: {message}")]
    #[diagnostic(
        code(bbcli::auth_failed),
        help(
            "Verify the router admin password.\n\
             Run: bbcli config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Not authenticated")]
    #[diagnostic(code(bbcli::not_authenticated))]
    NotAuthenticated,

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(bbcli::no_credentials),
        help(
            "Set BBOX_PWD, pass --password, or store one with:\n\
             bbcli config set-password --profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(bbcli::not_found),
        help("Run: bbcli {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Router ───────────────────────────────────────────────────────

    #[error("Router answered {status} to {operation}")]
    #[diagnostic(code(bbcli::api_error))]
    ApiError { status: u16, operation: String },

    #[error("Unexpected router response: {message}")]
    #[diagnostic(
        code(bbcli::protocol),
        help("Re-run with -vv to log the raw exchange.")
    )]
    Protocol { message: String },

    #[error("{0}")]
    #[diagnostic(code(bbcli::internal))]
    Internal(String),

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bbcli::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bbcli::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(bbcli::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(bbcli::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(bbcli::timeout),
        help("Increase timeout with --timeout or check router responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NotAuthenticated | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── bbox_api::Error → CliError mapping ───────────────────────────────

impl From<bbox_api::Error> for CliError {
    fn from(err: bbox_api::Error) -> Self {
        use bbox_api::Error;

        match err {
            Error::Network(source) => CliError::ConnectionFailed {
                url: source
                    .url()
                    .map_or_else(|| "(unknown)".into(), |u| u.origin().ascii_serialization()),
                source: Box::new(source),
            },

            Error::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            Error::InvalidUrl(e) => CliError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },

            Error::Tls(message) => CliError::TlsError { message },

            Error::Protocol { message, .. } => CliError::Protocol { message },

            Error::Authentication { message } => CliError::AuthFailed { message },

            Error::AuthRequired => CliError::NotAuthenticated,

            Error::NotFound { kind, identifier } => CliError::NotFound {
                list_command: list_command_for(kind).into(),
                resource_type: kind.into(),
                identifier,
            },

            Error::Status { status, operation } => CliError::ApiError { status, operation },

            Error::State(message) => CliError::Internal(message),
        }
    }
}

fn list_command_for(kind: &str) -> &'static str {
    if kind == NatRule::LABEL {
        "nat list"
    } else {
        "firewall list"
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(see bbcli config show)".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_exit_codes() {
        let cases = [
            (bbox_api::Error::AuthRequired, exit_code::AUTH),
            (
                bbox_api::Error::Authentication {
                    message: "401".into(),
                },
                exit_code::AUTH,
            ),
            (
                bbox_api::Error::NotFound {
                    kind: "NAT rule",
                    identifier: "3".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (bbox_api::Error::Timeout { timeout_secs: 5 }, exit_code::TIMEOUT),
            (
                bbox_api::Error::Status {
                    status: 500,
                    operation: "delete firewall rule 1".into(),
                },
                exit_code::GENERAL,
            ),
            (bbox_api::Error::Tls("bad pem".into()), exit_code::CONNECTION),
        ];

        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn not_found_points_at_the_right_list() {
        let err = CliError::from(bbox_api::Error::NotFound {
            kind: NatRule::LABEL,
            identifier: "9".into(),
        });
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "nat list"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn config_errors_map_to_exit_codes() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "home".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);

        let err = CliError::from(ConfigError::UnknownProfile {
            profile: "office".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
