// ── Config entry ──
//
// The persisted connection record the lifecycle operates on. Core never
// reads files; the CLI (via smartwash-config) builds an `EntryConfig` and
// hands it in, and persists whatever the integration reports back.

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use url::Url;

use smartwash_api::transport::{DEFAULT_API_URL, DEFAULT_TOKEN_URL};

/// Schema version written by this crate.
pub const CURRENT_VERSION: u32 = 3;

/// OAuth token material stored with the entry.
#[derive(Debug, Clone)]
pub struct TokenData {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
    pub installed_app_id: String,
}

/// OAuth client registration used for token refresh.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: Url,
}

impl OAuthClientConfig {
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            client_id,
            client_secret,
            token_url: Url::parse(DEFAULT_TOKEN_URL).expect("default token URL is valid"),
        }
    }
}

/// One config entry: a location, its installed app and credentials.
#[derive(Debug, Clone)]
pub struct EntryConfig {
    pub entry_id: String,
    pub version: u32,
    pub location_id: String,
    /// `None` on entries migrated from older schemas.
    pub token: Option<TokenData>,
    pub subscription_id: Option<String>,
    /// Without a client registration the access token is used as-is.
    pub oauth: Option<OAuthClientConfig>,
    pub api_url: Url,
    pub timeout: Duration,
    /// Raw data of a pre-migration entry, kept for reference.
    pub old_data: Option<serde_json::Value>,
}

impl EntryConfig {
    pub fn new(entry_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            version: CURRENT_VERSION,
            location_id: location_id.into(),
            token: None,
            subscription_id: None,
            oauth: None,
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: Duration::from_secs(30),
            old_data: None,
        }
    }
}

/// Upgrade an entry to [`CURRENT_VERSION`].
///
/// Entries older than version 3 predate OAuth: their data is parked under
/// `old_data` and the token is dropped so setup demands re-authentication.
/// Returns `true` if the entry changed.
pub fn migrate_entry(entry: &mut EntryConfig, raw_data: serde_json::Value) -> bool {
    if entry.version >= CURRENT_VERSION {
        return false;
    }
    tracing::debug!(
        entry_id = %entry.entry_id,
        from = entry.version,
        to = CURRENT_VERSION,
        "migrating config entry"
    );
    entry.old_data = Some(raw_data);
    entry.token = None;
    entry.subscription_id = None;
    entry.version = CURRENT_VERSION;
    true
}
