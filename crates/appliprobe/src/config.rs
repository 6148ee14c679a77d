//! CLI-side configuration: flag overrides and interactive credential
//! prompts layered over `appliprobe-config`.
//!
//! Core never sees these types -- it receives a pre-built `ClientConfig`.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{debug, warn};

use appliprobe_config::{Config, CredentialField, Profile};
use appliprobe_core::{ApplianceClient, ClientConfig, Credentials};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a networked command needs.
pub struct Connection {
    pub client: ApplianceClient,
    pub profile_name: String,
    pub export_dir: Option<PathBuf>,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Load config, resolve credentials, and build the transport client.
pub fn connect(global: &GlobalOpts) -> Result<Connection, CliError> {
    let cfg = appliprobe_config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);
    let profile = cfg.profiles.get(&profile_name);
    if profile.is_none() {
        debug!(profile = %profile_name, "profile not in config, using flags and environment");
    }

    let credentials = resolve_credentials(global, profile, &profile_name)?;
    let client_config = build_client_config(global, &cfg, profile, credentials)?;
    let client = client_config.build_client()?;

    Ok(Connection {
        client,
        profile_name,
        export_dir: cfg.defaults.export_dir,
    })
}

/// Translate config + global flags into a `ClientConfig`.
///
/// Flags win over the profile, which wins over `[defaults]`.
pub fn build_client_config(
    global: &GlobalOpts,
    cfg: &Config,
    profile: Option<&Profile>,
    credentials: Credentials,
) -> Result<ClientConfig, CliError> {
    let mut client = appliprobe_config::client_config(cfg, profile, credentials)?;
    if let Some(ref url) = global.base_url {
        client.base_url = appliprobe_config::parse_base_url(url)?;
    }
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }
    Ok(client)
}

// ── Credential helpers ───────────────────────────────────────────────

/// Resolve all three secrets: flag/env → keyring → profile → prompt.
pub fn resolve_credentials(
    global: &GlobalOpts,
    profile: Option<&Profile>,
    profile_name: &str,
) -> Result<Credentials, CliError> {
    let api_key = resolve_field(CredentialField::ApiKey, global.api_key.as_deref(), profile, profile_name)?;
    let access_token = resolve_field(
        CredentialField::AccessToken,
        global.access_token.as_deref(),
        profile,
        profile_name,
    )?;
    let refresh_token = resolve_field(
        CredentialField::RefreshToken,
        global.refresh_token.as_deref(),
        profile,
        profile_name,
    )?;
    Ok(Credentials::new(api_key, access_token, refresh_token))
}

fn resolve_field(
    field: CredentialField,
    explicit: Option<&str>,
    profile: Option<&Profile>,
    profile_name: &str,
) -> Result<SecretString, CliError> {
    if let Some(secret) = appliprobe_config::resolve_secret(field, explicit, profile, profile_name) {
        return Ok(secret);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
            field: field.label().into(),
            env: field.env_var().into(),
        });
    }

    let value = rpassword::prompt_password(format!("{} ({}): ", field.label(), field.env_var()))?;
    if value.trim().is_empty() {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
            field: field.label().into(),
            env: field.env_var().into(),
        });
    }
    Ok(SecretString::from(value.trim().to_owned()))
}

/// Persist refreshed tokens so the next run starts with a valid pair.
///
/// Best effort: a missing keyring only costs a refresh next time.
pub async fn store_refreshed_tokens(client: &ApplianceClient, profile_name: &str) {
    if !client.tokens_refreshed() {
        return;
    }
    let tokens = client.tokens().await;
    for (field, value) in [
        (CredentialField::AccessToken, &tokens.access_token),
        (CredentialField::RefreshToken, &tokens.refresh_token),
    ] {
        match appliprobe_config::store_secret(profile_name, field, value) {
            Ok(()) => debug!(field = field.label(), "refreshed token stored in keyring"),
            Err(e) => warn!(field = field.label(), error = %e, "could not store refreshed token"),
        }
    }
}
