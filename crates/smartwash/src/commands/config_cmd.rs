//! Config subcommand handlers.

use std::collections::BTreeMap;

use dialoguer::{Input, Password, Select};
use serde::Serialize;
use tabled::Tabled;

use smartwash_config::{Defaults, EntryProfile, redacted, store_keyring_secret};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

/// Config with every secret masked, for `config show`.
#[derive(Serialize)]
struct RedactedConfig<'a> {
    default_entry: Option<&'a str>,
    defaults: &'a Defaults,
    entries: BTreeMap<&'a str, EntryProfile>,
}

impl<'a> From<&'a Config> for RedactedConfig<'a> {
    fn from(cfg: &'a Config) -> Self {
        Self {
            default_entry: cfg.default_entry.as_deref(),
            defaults: &cfg.defaults,
            entries: cfg
                .entries
                .iter()
                .map(|(name, profile)| (name.as_str(), redacted(profile)))
                .collect(),
        }
    }
}

fn format_config(cfg: &RedactedConfig<'_>) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(default) = cfg.default_entry {
        let _ = writeln!(out, "default_entry = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.entries {
        let _ = writeln!(out);
        let _ = writeln!(out, "[entries.{name}]");
        let _ = writeln!(out, "location_id = \"{}\"", p.location_id);
        let _ = writeln!(out, "installed_app_id = \"{}\"", p.installed_app_id);
        let _ = writeln!(out, "version = {}", p.version);
        let optional = [
            ("api_url", &p.api_url),
            ("access_token", &p.access_token),
            ("access_token_env", &p.access_token_env),
            ("refresh_token", &p.refresh_token),
            ("client_id", &p.client_id),
            ("client_secret", &p.client_secret),
            ("token_url", &p.token_url),
            ("subscription_id", &p.subscription_id),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                let _ = writeln!(out, "{key} = \"{value}\"");
            }
        }
        if let Some(expires_at) = p.expires_at {
            let _ = writeln!(out, "expires_at = \"{}\"", expires_at.to_rfc3339());
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

#[derive(Serialize)]
struct EntrySummary {
    name: String,
    default: bool,
    location_id: String,
    installed_app_id: String,
    token: &'static str,
    subscription_id: Option<String>,
}

impl EntrySummary {
    fn new(name: &str, profile: &EntryProfile, default: bool) -> Self {
        let token = if profile.access_token_env.is_some() {
            "env"
        } else if profile.access_token.is_some() {
            "plaintext"
        } else {
            "keyring"
        };
        Self {
            name: name.to_owned(),
            default,
            location_id: profile.location_id.clone(),
            installed_app_id: profile.installed_app_id.clone(),
            token,
            subscription_id: profile.subscription_id.clone(),
        }
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Entry")]
    name: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Installed app")]
    installed_app: String,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Subscription")]
    subscription: String,
}

impl From<&EntrySummary> for EntryRow {
    fn from(e: &EntrySummary) -> Self {
        Self {
            name: if e.default {
                format!("{} *", e.name)
            } else {
                e.name.clone()
            },
            location: e.location_id.clone(),
            installed_app: e.installed_app_id.clone(),
            token: e.token.into(),
            subscription: e.subscription_id.clone().unwrap_or_default(),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_secret(label: &str) -> Result<String, CliError> {
    let secret = Password::new()
        .with_prompt(label)
        .interact()
        .map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: label.to_lowercase(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(
    secret: String,
    entry_name: &str,
    kind: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_keyring_secret(entry_name, kind, &secret)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

fn entry_not_found(cfg: &Config, name: String) -> CliError {
    let mut available: Vec<_> = cfg.entries.keys().cloned().collect();
    available.sort();
    CliError::EntryNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

fn save(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    config::save_config_to(cfg, &config::config_file(global))?;
    Ok(())
}

// ── Init ────────────────────────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_file(global);
    eprintln!("SmartThings washer/dryer: configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let mut cfg = config::load_or_default(global);

    let entry_name: String = Input::new()
        .with_prompt("Entry name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;
    let location_id: String = Input::new()
        .with_prompt("Location id")
        .interact_text()
        .map_err(prompt_err)?;
    let installed_app_id: String = Input::new()
        .with_prompt("Installed app id")
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = EntryProfile::new(location_id, installed_app_id);

    let token_choices = &[
        "Personal access token",
        "OAuth tokens (access + refresh, with client credentials)",
        "Read the access token from an environment variable",
    ];
    let selection = Select::new()
        .with_prompt("Authentication")
        .items(token_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    match selection {
        0 => {
            let token = prompt_secret("Access token")?;
            profile.access_token =
                prompt_keyring_storage(token, &entry_name, "access-token", "access token")?;
        }
        1 => {
            let token = prompt_secret("Access token")?;
            let refresh = prompt_secret("Refresh token")?;
            let client_id: String = Input::new()
                .with_prompt("OAuth client id")
                .interact_text()
                .map_err(prompt_err)?;
            let client_secret = prompt_secret("OAuth client secret")?;

            profile.access_token =
                prompt_keyring_storage(token, &entry_name, "access-token", "access token")?;
            profile.refresh_token =
                prompt_keyring_storage(refresh, &entry_name, "refresh-token", "refresh token")?;
            profile.client_secret = prompt_keyring_storage(
                client_secret,
                &entry_name,
                "client-secret",
                "client secret",
            )?;
            profile.client_id = Some(client_id);
        }
        _ => {
            let var: String = Input::new()
                .with_prompt("Environment variable")
                .default("SMARTTHINGS_TOKEN".into())
                .interact_text()
                .map_err(prompt_err)?;
            profile.access_token_env = Some(var);
        }
    }

    cfg.entries.insert(entry_name.clone(), profile);
    if cfg.default_entry.is_none() || cfg.entries.len() == 1 {
        cfg.default_entry = Some(entry_name.clone());
    }
    save(&cfg, global)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Entry: {entry_name}");
    eprintln!("\n  Test it: smartwash devices list");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let view = RedactedConfig::from(&cfg);
            let out = output::render_single(&global.output, &view, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Entries => {
            let cfg = config::load(global)?;
            if cfg.entries.is_empty() {
                eprintln!("No entries configured. Run: smartwash config init");
                return Ok(());
            }
            let default = config::active_entry_name(global, &cfg);
            let mut summaries: Vec<EntrySummary> = cfg
                .entries
                .iter()
                .map(|(name, p)| EntrySummary::new(name, p, *name == default))
                .collect();
            summaries.sort_by(|a, b| a.name.cmp(&b.name));
            let out = output::render_list(&global.output, &summaries, |e| EntryRow::from(e), |e| {
                e.name.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load(global)?;
            if !cfg.entries.contains_key(&name) {
                return Err(entry_not_found(&cfg, name));
            }
            cfg.default_entry = Some(name.clone());
            save(&cfg, global)?;
            eprintln!("✓ Default entry set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetToken { entry } => {
            let cfg = config::load(global)?;
            let name = entry.unwrap_or_else(|| config::active_entry_name(global, &cfg));
            if !cfg.entries.contains_key(&name) {
                return Err(entry_not_found(&cfg, name));
            }
            let token = prompt_secret("Access token")?;
            store_keyring_secret(&name, "access-token", &token)?;
            eprintln!("✓ Access token stored in system keyring for entry '{name}'");
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_file(global).display());
            Ok(())
        }
    }
}
