//! CLI configuration: thin wrapper around `bbox_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --password, --insecure, --timeout) and fills unset
//! --output / --color from the config's `[defaults]`.

use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;
use url::Url;

use bbox_api::{Session, TlsMode, TransportConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use bbox_config::{Config, Defaults, config_path, load_config_or_default, store_password};

/// Everything needed to open an authenticated session.
pub struct Connection {
    pub base_url: Url,
    pub transport: TransportConfig,
    pub password: SecretString,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Fill `--output` / `--color` from `[defaults]` when neither the flag
/// nor its env var was given.
pub fn apply_defaults(global: &mut GlobalOpts, defaults: &Defaults) {
    if global.output.is_none() {
        global.output = parse_default("output", &defaults.output);
    }
    if global.color.is_none() {
        global.color = parse_default("color", &defaults.color);
    }
}

fn parse_default<T: ValueEnum>(key: &str, raw: &str) -> Option<T> {
    match <T as ValueEnum>::from_str(raw, true) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = raw, error = %e, "ignoring invalid config default");
            None
        }
    }
}

/// Merge config file, profile, and CLI flags. Flags win.
pub fn resolve_connection(global: &GlobalOpts) -> Result<Connection, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let profile = cfg.profile(&profile_name)?;

    // 1. Base URL (flag > env > profile > public endpoint)
    let base_url = match global.url.as_deref() {
        Some(raw) => raw.parse().map_err(|_| CliError::Validation {
            field: "url".into(),
            reason: format!("invalid URL: {raw}"),
        })?,
        None => bbox_config::profile_base_url(&profile)?,
    };

    // 2. Transport
    let mut transport = bbox_config::profile_to_transport(&profile, &cfg.defaults);
    if global.insecure {
        transport = transport.with_tls(TlsMode::DangerAcceptInvalid);
    }
    if let Some(secs) = global.timeout {
        transport = transport.with_timeout(Duration::from_secs(secs));
    }

    // 3. Password (flag > BBOX_PWD > profile env > keyring > plaintext)
    let password = match global.password {
        Some(ref pw) => SecretString::from(pw.clone()),
        None => bbox_config::resolve_password(&profile, &profile_name)?,
    };

    Ok(Connection {
        base_url,
        transport,
        password,
    })
}

/// Open a session and log in.
pub async fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let conn = resolve_connection(global)?;
    tracing::debug!(url = %conn.base_url, "connecting to router");

    let session = Session::new(conn.base_url, &conn.transport)?;
    session.auth().login(&conn.password).await?;
    Ok(session)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, ColorMode, OutputFormat};

    fn defaults(output: &str, color: &str) -> Defaults {
        Defaults {
            output: output.into(),
            color: color.into(),
            ..Defaults::default()
        }
    }

    #[test]
    fn config_defaults_fill_unset_flags() {
        let mut cli = Cli::try_parse_from(["bbcli", "config", "path"]).unwrap();
        cli.global.output = None;
        cli.global.color = None;

        apply_defaults(&mut cli.global, &defaults("json-compact", "never"));
        assert!(matches!(cli.global.output_format(), OutputFormat::JsonCompact));
        assert!(matches!(cli.global.color_mode(), ColorMode::Never));
    }

    #[test]
    fn explicit_flags_beat_config_defaults() {
        let mut cli =
            Cli::try_parse_from(["bbcli", "-o", "yaml", "--color", "always", "config", "path"])
                .unwrap();

        apply_defaults(&mut cli.global, &defaults("json", "never"));
        assert!(matches!(cli.global.output_format(), OutputFormat::Yaml));
        assert!(matches!(cli.global.color_mode(), ColorMode::Always));
    }

    #[test]
    fn invalid_config_default_falls_back() {
        let mut cli = Cli::try_parse_from(["bbcli", "config", "path"]).unwrap();
        cli.global.output = None;

        apply_defaults(&mut cli.global, &defaults("spreadsheet", "auto"));
        assert!(matches!(cli.global.output_format(), OutputFormat::Table));
    }
}
