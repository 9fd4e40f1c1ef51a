//! Shared configuration for smartwash.
//!
//! TOML config entries, credential resolution (env + keyring + plaintext),
//! and translation to `smartwash_core::EntryConfig`. Whatever the
//! integration reports back (new subscription ids, refreshed tokens,
//! migrations) is written through [`record_entry`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use smartwash_core::{CURRENT_VERSION, EntryConfig, OAuthClientConfig, TokenData, migrate_entry};

/// Keyring service name for stored secrets.
pub const KEYRING_SERVICE: &str = "smartwash";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for entry '{entry}'")]
    NoCredentials { entry: String },

    #[error("entry '{name}' not found in configuration")]
    EntryNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

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
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Entry used when `--entry` is not given.
    pub default_entry: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named config entries, one per SmartThings location.
    #[serde(default)]
    pub entries: HashMap<String, EntryProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_entry: Some("default".into()),
            defaults: Defaults::default(),
            entries: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
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
fn default_version() -> u32 {
    CURRENT_VERSION
}

/// One persisted config entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntryProfile {
    pub location_id: String,

    pub installed_app_id: String,

    /// Schema version; older entries are migrated on load.
    #[serde(default = "default_version")]
    pub version: u32,

    /// REST base URL override (e.g. a mock server).
    pub api_url: Option<String>,

    /// Access token (plaintext, prefer keyring or env var).
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    pub access_token_env: Option<String>,

    /// Refresh token (plaintext, prefer keyring).
    pub refresh_token: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,

    /// OAuth client id. Without it the access token is used as-is.
    pub client_id: Option<String>,

    /// OAuth client secret (plaintext, prefer keyring).
    pub client_secret: Option<String>,

    pub token_url: Option<String>,

    /// Subscription created by the last setup.
    pub subscription_id: Option<String>,

    pub timeout: Option<u64>,
}

impl EntryProfile {
    pub fn new(location_id: impl Into<String>, installed_app_id: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            installed_app_id: installed_app_id.into(),
            version: CURRENT_VERSION,
            api_url: None,
            access_token: None,
            access_token_env: None,
            refresh_token: None,
            expires_at: None,
            client_id: None,
            client_secret: None,
            token_url: None,
            subscription_id: None,
            timeout: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "smartwash", "smartwash").map_or_else(
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
    p.push("smartwash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` merged with `SMARTWASH_`-prefixed env vars. Nested
/// keys use `__`, e.g. `SMARTWASH_ENTRIES__HOME__SUBSCRIPTION_ID`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SMARTWASH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
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

// ── Credential resolution ───────────────────────────────────────────

fn keyring_secret(entry_name: &str, kind: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{entry_name}/{kind}")).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

/// Store a secret in the system keyring under `{entry_name}/{kind}`.
pub fn store_keyring_secret(entry_name: &str, kind: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{entry_name}/{kind}"))
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve the access token: env var, then keyring, then plaintext.
pub fn resolve_access_token(
    profile: &EntryProfile,
    entry_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.access_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(secret) = keyring_secret(entry_name, "access-token") {
        return Ok(secret);
    }

    if let Some(ref token) = profile.access_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        entry: entry_name.into(),
    })
}

/// Resolve the refresh token: keyring, then plaintext.
pub fn resolve_refresh_token(profile: &EntryProfile, entry_name: &str) -> Option<SecretString> {
    keyring_secret(entry_name, "refresh-token")
        .or_else(|| profile.refresh_token.clone().map(SecretString::from))
}

/// Resolve the OAuth client registration, if the entry has one.
pub fn resolve_oauth_client(
    profile: &EntryProfile,
    entry_name: &str,
) -> Result<Option<OAuthClientConfig>, ConfigError> {
    let Some(client_id) = profile.client_id.clone() else {
        return Ok(None);
    };
    let client_secret = keyring_secret(entry_name, "client-secret")
        .or_else(|| profile.client_secret.clone().map(SecretString::from))
        .ok_or_else(|| ConfigError::NoCredentials {
            entry: entry_name.into(),
        })?;

    let mut client = OAuthClientConfig::new(client_id, client_secret);
    if let Some(ref raw) = profile.token_url {
        client.token_url = parse_url("token_url", raw)?;
    }
    Ok(Some(client))
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// REST base URLs are joined with relative paths, so they need a trailing `/`.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = parse_url("api_url", raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// ── Translation to core ─────────────────────────────────────────────

/// Build the core `EntryConfig` for a named entry.
///
/// A missing access token leaves `token` empty; setup then reports that
/// re-authentication is required. Entries below [`CURRENT_VERSION`] are
/// migrated, which also drops their token.
pub fn entry_config(
    profile: &EntryProfile,
    entry_name: &str,
    defaults: &Defaults,
) -> Result<EntryConfig, ConfigError> {
    let mut entry = EntryConfig::new(entry_name, profile.location_id.clone());
    entry.version = profile.version;
    entry.subscription_id.clone_from(&profile.subscription_id);
    entry.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    if let Some(ref raw) = profile.api_url {
        entry.api_url = parse_api_url(raw)?;
    }
    entry.oauth = resolve_oauth_client(profile, entry_name)?;

    entry.token = match resolve_access_token(profile, entry_name) {
        Ok(access_token) => Some(TokenData {
            access_token,
            refresh_token: resolve_refresh_token(profile, entry_name)
                .unwrap_or_else(|| SecretString::from(String::new())),
            expires_at: profile.expires_at,
            installed_app_id: profile.installed_app_id.clone(),
        }),
        Err(ConfigError::NoCredentials { .. }) => {
            tracing::debug!(entry = entry_name, "no access token configured");
            None
        }
        Err(e) => return Err(e),
    };

    let raw = serde_json::to_value(redacted(profile)).unwrap_or_default();
    if migrate_entry(&mut entry, raw) {
        tracing::info!(entry = entry_name, "config entry migrated, re-authentication required");
    }
    Ok(entry)
}

pub fn redacted(profile: &EntryProfile) -> EntryProfile {
    let mask = |s: &Option<String>| s.as_ref().map(|_| "****".to_owned());
    EntryProfile {
        access_token: mask(&profile.access_token),
        refresh_token: mask(&profile.refresh_token),
        client_secret: mask(&profile.client_secret),
        ..profile.clone()
    }
}

// ── Write-back ──────────────────────────────────────────────────────

/// Copy what the integration changed back into the named entry: the
/// schema version, the subscription id and the token material.
///
/// Tokens stored in plaintext stay in plaintext; everything else goes to
/// the keyring. Returns `true` if the profile changed.
pub fn record_entry(
    cfg: &mut Config,
    entry_name: &str,
    entry: &EntryConfig,
) -> Result<bool, ConfigError> {
    let profile = cfg
        .entries
        .get_mut(entry_name)
        .ok_or_else(|| ConfigError::EntryNotFound {
            name: entry_name.into(),
        })?;

    let mut changed = false;
    if profile.version != entry.version {
        profile.version = entry.version;
        changed = true;
    }
    if profile.subscription_id != entry.subscription_id {
        profile.subscription_id.clone_from(&entry.subscription_id);
        changed = true;
    }

    match &entry.token {
        Some(token) => changed |= record_token(profile, entry_name, token)?,
        None if entry.old_data.is_some() => {
            profile.access_token = None;
            profile.refresh_token = None;
            profile.expires_at = None;
            changed = true;
        }
        None => {}
    }
    Ok(changed)
}

fn record_token(
    profile: &mut EntryProfile,
    entry_name: &str,
    token: &TokenData,
) -> Result<bool, ConfigError> {
    let access = token.access_token.expose_secret();
    let refresh = token.refresh_token.expose_secret();
    let mut changed = profile.expires_at != token.expires_at;
    profile.expires_at = token.expires_at;

    if profile.access_token.is_some() {
        if profile.access_token.as_deref() != Some(access) {
            profile.access_token = Some(access.to_owned());
            changed = true;
        }
        if !refresh.is_empty() && profile.refresh_token.as_deref() != Some(refresh) {
            profile.refresh_token = Some(refresh.to_owned());
            changed = true;
        }
    } else if profile.access_token_env.is_none() {
        let stored = |kind| keyring_secret(entry_name, kind);
        if stored("access-token").is_none_or(|s| s.expose_secret() != access) {
            store_keyring_secret(entry_name, "access-token", access)?;
        }
        if !refresh.is_empty()
            && stored("refresh-token").is_none_or(|s| s.expose_secret() != refresh)
        {
            store_keyring_secret(entry_name, "refresh-token", refresh)?;
        }
    }
    Ok(changed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
default_entry = "home"

[defaults]
timeout = 12

[entries.home]
location_id = "loc-1"
installed_app_id = "app-1"
api_url = "http://127.0.0.1:9000/v1"
access_token = "access"
refresh_token = "refresh"
client_id = "cid"
client_secret = "secret"
subscription_id = "sub-1"

[entries.legacy]
location_id = "loc-2"
installed_app_id = "app-2"
version = 2
access_token = "legacy-token"
"#;

    fn load(contents: &str) -> (tempfile::TempDir, PathBuf, Config) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        let cfg = load_config_from(&path).unwrap();
        (dir, path, cfg)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_entry.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.output, "table");
        assert!(cfg.entries.is_empty());
    }

    #[test]
    fn entry_translates_to_core_config() {
        let (_dir, _path, cfg) = load(CONFIG);
        let profile = &cfg.entries["home"];
        assert_eq!(profile.version, CURRENT_VERSION);

        let entry = entry_config(profile, "home", &cfg.defaults).unwrap();
        assert_eq!(entry.entry_id, "home");
        assert_eq!(entry.location_id, "loc-1");
        assert_eq!(entry.api_url.as_str(), "http://127.0.0.1:9000/v1/");
        assert_eq!(entry.timeout, Duration::from_secs(12));
        assert_eq!(entry.subscription_id.as_deref(), Some("sub-1"));
        assert_eq!(entry.oauth.unwrap().client_id, "cid");
        let token = entry.token.unwrap();
        assert_eq!(token.installed_app_id, "app-1");
        assert!(entry.old_data.is_none());
    }

    #[test]
    fn old_entry_is_migrated_without_token() {
        let (_dir, _path, cfg) = load(CONFIG);
        let entry = entry_config(&cfg.entries["legacy"], "legacy", &cfg.defaults).unwrap();
        assert_eq!(entry.version, CURRENT_VERSION);
        assert!(entry.token.is_none());
        let old = entry.old_data.unwrap();
        assert_eq!(old["location_id"], "loc-2");
        assert_eq!(old["access_token"], "****");
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        let mut profile = EntryProfile::new("loc", "app");
        profile.api_url = Some("not a url".into());
        let err = entry_config(&profile, "bad", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn client_id_without_secret_is_missing_credentials() {
        let mut profile = EntryProfile::new("loc", "app");
        profile.client_id = Some("cid".into());
        let err = resolve_oauth_client(&profile, "no-secret-entry").unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }

    #[test]
    fn recorded_subscription_and_token_survive_a_save() {
        let (_dir, path, mut cfg) = load(CONFIG);
        let mut entry = entry_config(&cfg.entries["home"], "home", &cfg.defaults).unwrap();
        entry.subscription_id = Some("sub-2".into());
        if let Some(token) = entry.token.as_mut() {
            token.access_token = SecretString::from("rotated".to_string());
        }

        assert!(record_entry(&mut cfg, "home", &entry).unwrap());
        assert!(!record_entry(&mut cfg, "home", &entry).unwrap());
        save_config_to(&cfg, &path).unwrap();

        let reloaded = load_config_from(&path).unwrap();
        let home = &reloaded.entries["home"];
        assert_eq!(home.subscription_id.as_deref(), Some("sub-2"));
        assert_eq!(home.access_token.as_deref(), Some("rotated"));
        assert_eq!(home.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn recording_a_migration_clears_plaintext_tokens() {
        let (_dir, _path, mut cfg) = load(CONFIG);
        let entry = entry_config(&cfg.entries["legacy"], "legacy", &cfg.defaults).unwrap();
        assert!(record_entry(&mut cfg, "legacy", &entry).unwrap());
        let legacy = &cfg.entries["legacy"];
        assert_eq!(legacy.version, CURRENT_VERSION);
        assert_eq!(legacy.access_token, None);
    }

    #[test]
    fn unknown_entry_cannot_be_recorded() {
        let mut cfg = Config::default();
        let entry = EntryConfig::new("ghost", "loc");
        let err = record_entry(&mut cfg, "ghost", &entry).unwrap_err();
        assert!(matches!(err, ConfigError::EntryNotFound { .. }));
    }

    #[test]
    fn env_overrides_nested_entry_fields() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", CONFIG)?;
            jail.set_env("SMARTWASH_ENTRIES__LEGACY__SUBSCRIPTION_ID", "sub-env");
            jail.set_env("SMARTWASH_DEFAULTS__COLOR", "never");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            let legacy = &cfg.entries["legacy"];
            assert_eq!(legacy.subscription_id.as_deref(), Some("sub-env"));
            assert_eq!(legacy.location_id, "loc-2");
            assert_eq!(cfg.defaults.color, "never");
            Ok(())
        });
    }
}
