//! Shared configuration for appliprobe.
//!
//! TOML profiles, credential resolution (flag/env + keyring + plaintext),
//! and translation to `appliprobe_core::ClientConfig`. The CLI layers
//! interactive prompting on top.

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
use tracing::debug;

use appliprobe_core::{ClientConfig, Credentials, DEFAULT_BASE_URL, TlsVerification};

/// Keyring service name; entries are keyed `<profile>/<field>`.
pub const KEYRING_SERVICE: &str = "appliprobe";

/// Overrides the config file location when set.
pub const CONFIG_PATH_ENV: &str = "APPLIPROBE_CONFIG";

/// Mask shown in place of plaintext secrets.
pub const REDACTED: &str = "****";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

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

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Config {
    /// Copy with every plaintext secret masked, for display.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        for profile in out.profiles.values_mut() {
            for field in CredentialField::ALL {
                if field.plaintext(profile).is_some() {
                    field.set_plaintext(profile, Some(REDACTED.into()));
                }
            }
        }
        out
    }
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

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// API root used when a profile does not name one.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where `export` writes artifacts (working directory when unset).
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            base_url: default_base_url(),
            export_dir: None,
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
fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

/// A named account profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API root override.
    pub base_url: Option<String>,

    /// Developer API key (plaintext -- prefer keyring or env var).
    pub api_key: Option<String>,

    /// Access token (plaintext -- prefer keyring or env var).
    pub access_token: Option<String>,

    /// Refresh token (plaintext -- prefer keyring or env var).
    pub refresh_token: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Credential fields ───────────────────────────────────────────────

/// The three secrets needed to talk to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    ApiKey,
    AccessToken,
    RefreshToken,
}

impl CredentialField {
    pub const ALL: [Self; 3] = [Self::ApiKey, Self::AccessToken, Self::RefreshToken];

    /// Environment variable the CLI reads this field from.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::ApiKey => "API_KEY",
            Self::AccessToken => "ACCESS_TOKEN",
            Self::RefreshToken => "REFRESH_TOKEN",
        }
    }

    /// Keyring entry suffix and operator-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::ApiKey => "api-key",
            Self::AccessToken => "access-token",
            Self::RefreshToken => "refresh-token",
        }
    }

    /// Write (or clear) the plaintext copy of this field in a profile.
    pub fn set_plaintext(self, profile: &mut Profile, value: Option<String>) {
        let slot = match self {
            Self::ApiKey => &mut profile.api_key,
            Self::AccessToken => &mut profile.access_token,
            Self::RefreshToken => &mut profile.refresh_token,
        };
        *slot = value;
    }

    fn plaintext(self, profile: &Profile) -> Option<&str> {
        match self {
            Self::ApiKey => profile.api_key.as_deref(),
            Self::AccessToken => profile.access_token.as_deref(),
            Self::RefreshToken => profile.refresh_token.as_deref(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via `APPLIPROBE_CONFIG` or platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "appliprobe", "appliprobe").map_or_else(
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
    p.push("appliprobe");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, layered over defaults and under
/// `APPLIPROBE_*` variables (`__` separates nested keys, e.g.
/// `APPLIPROBE_DEFAULTS__OUTPUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("APPLIPROBE_").ignore(&["config"]).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve one secret from the non-interactive part of the chain.
///
/// Order: explicit value (flag or env) → system keyring → plaintext in the
/// profile. `None` means the caller has to prompt or give up.
pub fn resolve_secret(
    field: CredentialField,
    explicit: Option<&str>,
    profile: Option<&Profile>,
    profile_name: &str,
) -> Option<SecretString> {
    // 1. Flag / environment
    if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
        return Some(SecretString::from(value.to_owned()));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name, field)) {
        if let Ok(secret) = entry.get_password() {
            debug!(field = field.label(), "credential from keyring");
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .and_then(|p| field.plaintext(p))
        .filter(|v| !v.trim().is_empty())
        .map(|v| SecretString::from(v.to_owned()))
}

/// Store one secret in the system keyring.
pub fn store_secret(
    profile_name: &str,
    field: CredentialField,
    value: &SecretString,
) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name, field))?;
    entry.set_password(value.expose_secret())?;
    Ok(())
}

fn keyring_user(profile_name: &str, field: CredentialField) -> String {
    format!("{profile_name}/{}", field.label())
}

// ── Translation to core ─────────────────────────────────────────────

/// Build a `ClientConfig` from config defaults, an optional profile, and
/// already-resolved credentials.
///
/// Base URL: profile → defaults. Timeout: profile → defaults.
pub fn client_config(
    cfg: &Config,
    profile: Option<&Profile>,
    credentials: Credentials,
) -> Result<ClientConfig, ConfigError> {
    let url_str = profile
        .and_then(|p| p.base_url.as_deref())
        .unwrap_or(&cfg.defaults.base_url);
    let base_url = parse_base_url(url_str)?;

    let tls = profile
        .and_then(|p| p.ca_cert.clone())
        .map_or(TlsVerification::SystemDefaults, TlsVerification::CustomCa);

    let timeout = profile
        .and_then(|p| p.timeout)
        .unwrap_or(cfg.defaults.timeout);

    Ok(ClientConfig {
        base_url,
        credentials,
        tls,
        timeout: Duration::from_secs(timeout),
    })
}

/// Parse and validate an API root URL.
pub fn parse_base_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("expected an http(s) URL, got {raw}"),
        });
    }
    Ok(url)
}
