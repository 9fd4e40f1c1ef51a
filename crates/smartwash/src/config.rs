//! CLI configuration: thin wrapper around `smartwash_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--entry,
//! --location, --token, etc.).

use std::path::PathBuf;

use secrecy::SecretString;

use smartwash_config::{EntryProfile, entry_config, load_config_from};
use smartwash_core::{EntryConfig, TokenData};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use smartwash_config::{Config, config_path, record_entry, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: `--config` or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&config_file(global))?)
}

/// Load config, returning a default if the file can't be read.
pub fn load_or_default(global: &GlobalOpts) -> Config {
    load(global).unwrap_or_default()
}

/// Resolve the active entry name from CLI flags and config.
pub fn active_entry_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .entry
        .clone()
        .or_else(|| config.default_entry.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate the named entry + global flags into an `EntryConfig`.
///
/// CLI flag overrides take priority over entry values. Without a stored
/// entry, `--location`, `--installed-app` and `--token` must all be given.
pub fn resolve_entry(
    config: &Config,
    entry_name: &str,
    global: &GlobalOpts,
) -> Result<EntryConfig, CliError> {
    let mut profile = match config.entries.get(entry_name) {
        Some(profile) => profile.clone(),
        None => {
            let location = global.location.clone().ok_or_else(|| CliError::NoConfig {
                path: config_file(global).display().to_string(),
            })?;
            let installed_app =
                global
                    .installed_app
                    .clone()
                    .ok_or_else(|| CliError::Validation {
                        field: "installed-app".into(),
                        reason: "required when no config entry exists".into(),
                    })?;
            EntryProfile::new(location, installed_app)
        }
    };

    if let Some(ref location) = global.location {
        profile.location_id.clone_from(location);
    }
    if let Some(ref app) = global.installed_app {
        profile.installed_app_id.clone_from(app);
    }
    if global.api_url.is_some() {
        profile.api_url.clone_from(&global.api_url);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }

    let mut entry = entry_config(&profile, entry_name, &config.defaults)?;

    if let Some(ref token) = global.token {
        entry.token = Some(TokenData {
            access_token: SecretString::from(token.clone()),
            refresh_token: SecretString::from(String::new()),
            expires_at: None,
            installed_app_id: profile.installed_app_id.clone(),
        });
    }

    if entry.token.is_none() && entry.old_data.is_none() {
        return Err(CliError::NoCredentials {
            entry: entry_name.into(),
        });
    }
    Ok(entry)
}
