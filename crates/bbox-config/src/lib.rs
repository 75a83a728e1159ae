//! Configuration for bbcli.
//!
//! TOML profiles, password resolution (env + keyring + plaintext),
//! and translation to the `bbox_api` transport and base URL. The CLI
//! layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use bbox_api::{DEFAULT_BASE_URL, TlsMode, TransportConfig};

/// Environment variable holding the router password.
pub const PASSWORD_ENV: &str = "BBOX_PWD";

const KEYRING_SERVICE: &str = "bbcli";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`.
    pub fn profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(String::from)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up a profile. The `default` profile may be absent from the
    /// file; it then resolves to an empty profile (public endpoint).
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile {
                profile: name.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named router profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API base endpoint (e.g., "https://192.168.1.254/api/v1").
    pub url: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Router password (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("fr", "bbox-cli", "bbcli").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("bbcli");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + `BBOX_`-prefixed environment overrides.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BBOX_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config_or_default_from(&config_path())
}

/// Like [`load_config_from`], but an unreadable file is logged and
/// replaced by defaults.
pub fn load_config_or_default_from(path: &Path) -> Config {
    load_config_from(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable config, using defaults");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Password resolution ─────────────────────────────────────────────

/// Resolve the router password for a profile.
///
/// Order: `BBOX_PWD`, the profile's `password_env`, the system keyring,
/// then the plaintext `password` field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(profile, profile_name, |name| std::env::var(name).ok())
}

/// [`resolve_password`] with an injectable environment lookup.
pub fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Well-known env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 2. Profile's password_env → env var lookup
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password.expose_secret())?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

// ── Profile → transport ─────────────────────────────────────────────

/// The profile's API base endpoint, or the public default.
pub fn profile_base_url(profile: &Profile) -> Result<Url, ConfigError> {
    let raw = profile.url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `TransportConfig` from a profile and global defaults.
pub fn profile_to_transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        cookie_jar: None,
    }
    .with_cookie_jar()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.timeout, 30);
        assert_eq!(cfg.profile_name(None), "default");
        assert!(cfg.profile("default").unwrap().url.is_none());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[profiles.home\nurl = ").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Figment(_))));
        let cfg = load_config_or_default_from(&path);
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                url: Some("https://192.168.1.254/api/v1".into()),
                insecure: Some(true),
                ..Profile::default()
            },
        );
        cfg.default_profile = Some("home".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile_name(None), "home");
        let home = loaded.profile("home").unwrap();
        assert_eq!(home.url.as_deref(), Some("https://192.168.1.254/api/v1"));
        assert_eq!(home.insecure, Some(true));
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.profile("office"),
            Err(ConfigError::UnknownProfile { .. })
        ));
        assert_eq!(cfg.profile_name(Some("office")), "office");
    }

    #[test]
    fn well_known_env_wins() {
        let profile = Profile {
            password_env: Some("HOME_BOX_PW".into()),
            password: Some("plain".into()),
            ..Profile::default()
        };
        let env = |name: &str| match name {
            PASSWORD_ENV => Some("from-bbox-pwd".to_string()),
            "HOME_BOX_PW" => Some("from-profile-env".to_string()),
            _ => None,
        };
        let pw = resolve_password_with(&profile, "test-env-order", env).unwrap();
        assert_eq!(pw.expose_secret(), "from-bbox-pwd");
    }

    #[test]
    fn profile_env_before_plaintext() {
        let profile = Profile {
            password_env: Some("HOME_BOX_PW".into()),
            password: Some("plain".into()),
            ..Profile::default()
        };
        let env = |name: &str| (name == "HOME_BOX_PW").then(|| "from-profile-env".to_string());
        let pw = resolve_password_with(&profile, "test-profile-env", env).unwrap();
        assert_eq!(pw.expose_secret(), "from-profile-env");
    }

    #[test]
    fn no_password_anywhere() {
        let result = resolve_password_with(&Profile::default(), "test-no-password", no_env);
        assert!(matches!(result, Err(ConfigError::NoCredentials { .. })));
    }

    #[test]
    fn base_url_defaults_to_public_endpoint() {
        assert_eq!(
            profile_base_url(&Profile::default()).unwrap().as_str(),
            DEFAULT_BASE_URL
        );
        let bad = Profile {
            url: Some("not a url".into()),
            ..Profile::default()
        };
        assert!(matches!(
            profile_base_url(&bad),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn transport_honours_overrides() {
        let defaults = Defaults::default();

        let t = profile_to_transport(&Profile::default(), &defaults);
        assert!(matches!(t.tls, TlsMode::System));
        assert_eq!(t.timeout, Duration::from_secs(30));
        assert!(t.cookie_jar.is_some());

        let profile = Profile {
            ca_cert: Some("/etc/bbox/ca.pem".into()),
            timeout: Some(5),
            ..Profile::default()
        };
        let t = profile_to_transport(&profile, &defaults);
        assert!(matches!(t.tls, TlsMode::CustomCa(_)));
        assert_eq!(t.timeout, Duration::from_secs(5));

        let insecure = Profile {
            insecure: Some(true),
            ca_cert: Some("/etc/bbox/ca.pem".into()),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_transport(&insecure, &defaults).tls,
            TlsMode::DangerAcceptInvalid
        ));
    }
}
