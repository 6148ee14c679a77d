//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use secrecy::SecretString;

use appliprobe_config::{Config, CredentialField, Profile};
use appliprobe_core::DEFAULT_BASE_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

/// Render config as TOML-like text with secrets masked.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "base_url = \"{}\"", cfg.defaults.base_url);
    if let Some(ref dir) = cfg.defaults.export_dir {
        let _ = writeln!(out, "export_dir = \"{}\"", dir.display());
    }

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref url) = p.base_url {
            let _ = writeln!(out, "base_url = \"{url}\"");
        }
        for (key, present) in [
            ("api_key", p.api_key.is_some()),
            ("access_token", p.access_token.is_some()),
            ("refresh_token", p.refresh_token.is_some()),
        ] {
            if present {
                let _ = writeln!(out, "{key} = \"{}\"", appliprobe_config::REDACTED);
            }
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out.trim_end().to_owned()
}

/// Prompt for one secret and store it in the keyring or the profile.
fn prompt_secret(
    field: CredentialField,
    use_keyring: bool,
    profile_name: &str,
    profile: &mut Profile,
) -> Result<(), CliError> {
    let value = rpassword::prompt_password(format!("{}: ", field.label())).map_err(prompt_err)?;
    let value = value.trim().to_owned();
    if value.is_empty() {
        return Err(CliError::Validation {
            field: field.label().into(),
            reason: "value cannot be empty".into(),
        });
    }

    if use_keyring {
        appliprobe_config::store_secret(profile_name, field, &SecretString::from(value))?;
        eprintln!("   ✓ {} stored in system keyring", field.label());
        field.set_plaintext(profile, None);
    } else {
        field.set_plaintext(profile, Some(value));
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = appliprobe_config::config_path();
            eprintln!("appliprobe configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = appliprobe_config::load_config_or_default();

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(crate::config::active_profile_name(global, &cfg))
                .interact_text()
                .map_err(prompt_err)?;

            // 2. API root
            let base_url: String = Input::new()
                .with_prompt("API base URL")
                .default(DEFAULT_BASE_URL.trim_end_matches('/').to_owned())
                .interact_text()
                .map_err(prompt_err)?;
            appliprobe_config::parse_base_url(&base_url)?;

            // 3. Secret storage
            let store_choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let use_keyring = Select::new()
                .with_prompt("Where to store credentials?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?
                == 0;

            // 4. Secrets
            let mut profile = cfg.profiles.remove(&profile_name).unwrap_or_default();
            let default_url = DEFAULT_BASE_URL.trim_end_matches('/');
            profile.base_url = (base_url != default_url).then_some(base_url);
            for field in CredentialField::ALL {
                prompt_secret(field, use_keyring, &profile_name, &mut profile)?;
            }

            // 5. Write config
            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }
            let path = appliprobe_config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Profile: {profile_name}");
            eprintln!("\n  Test it: appliprobe --profile {profile_name} list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = appliprobe_config::load_config()?.redacted();
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", appliprobe_config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_text_hides_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                api_key: Some("k-123".into()),
                refresh_token: Some("r-456".into()),
                timeout: Some(5),
                ..Profile::default()
            },
        );
        let text = format_config_redacted(&cfg);
        assert!(text.contains("[profiles.lab]"));
        assert!(text.contains("api_key = \"****\""));
        assert!(text.contains("refresh_token = \"****\""));
        assert!(!text.contains("access_token"));
        assert!(!text.contains("k-123"));
        assert!(text.contains("timeout = 5"));
    }
}
