// Bearer-token sources for the REST client and event stream.
//
// The client never owns OAuth state directly. It asks a `TokenProvider`
// for a valid access token before every request, so the host can plug in
// its own refresh logic.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{DEFAULT_TOKEN_URL, TransportConfig};

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 20;

/// Boxed future returned by [`TokenProvider::access_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<SecretString, Error>> + Send + 'a>>;

/// Supplies a currently valid bearer token.
pub trait TokenProvider: Send + Sync {
    /// Return a token that is valid right now, refreshing if needed.
    fn access_token(&self) -> TokenFuture<'_>;
}

/// A fixed personal access token. Never refreshed.
#[derive(Debug, Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }
}

impl TokenProvider for StaticToken {
    fn access_token(&self) -> TokenFuture<'_> {
        let token = self.0.clone();
        Box::pin(async move { Ok(token) })
    }
}

/// OAuth2 token material for one config entry.
#[derive(Debug, Clone)]
pub struct OAuthToken {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    /// `None` means the expiry is unknown; the token is used until rejected.
    pub expires_at: Option<DateTime<Utc>>,
    pub installed_app_id: Option<String>,
}

impl OAuthToken {
    /// Whether the token must be refreshed before its next use.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|exp| exp - Duration::seconds(EXPIRY_MARGIN_SECS) <= now)
    }
}

/// OAuth client registration used for the refresh grant.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: Url,
}

impl OAuthClient {
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            client_id,
            client_secret,
            token_url: Url::parse(DEFAULT_TOKEN_URL).expect("default token URL is valid"),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    installed_app_id: Option<String>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Refreshing token session, the counterpart of a host OAuth2 session.
pub struct OAuthSession {
    http: reqwest::Client,
    client: OAuthClient,
    token: Mutex<OAuthToken>,
}

impl OAuthSession {
    pub fn new(
        client: OAuthClient,
        token: OAuthToken,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            client,
            token: Mutex::new(token),
        })
    }

    /// Snapshot of the current token (after any refresh).
    pub async fn token(&self) -> OAuthToken {
        self.token.lock().await.clone()
    }

    /// Refresh the token if it is about to expire.
    pub async fn ensure_token_valid(&self) -> Result<(), Error> {
        let mut token = self.token.lock().await;
        if !token.needs_refresh(Utc::now()) {
            return Ok(());
        }
        debug!("access token expiring, refreshing");
        let refreshed = self.refresh(&token).await?;
        *token = refreshed;
        Ok(())
    }

    async fn refresh(&self, current: &OAuthToken) -> Result<OAuthToken, Error> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client.client_id.as_str()),
            ("refresh_token", current.refresh_token.expose_secret()),
        ];
        let resp = self
            .http
            .post(self.client.token_url.clone())
            .basic_auth(
                &self.client.client_id,
                Some(self.client.client_secret.expose_secret()),
            )
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<TokenErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| status.to_string());
            return Err(Error::TokenRefresh {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: String::new(),
            })?;

        Ok(OAuthToken {
            access_token: SecretString::from(parsed.access_token),
            refresh_token: parsed
                .refresh_token
                .map_or_else(|| current.refresh_token.clone(), SecretString::from),
            expires_at: parsed
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
            installed_app_id: parsed
                .installed_app_id
                .or_else(|| current.installed_app_id.clone()),
        })
    }
}

impl TokenProvider for OAuthSession {
    fn access_token(&self) -> TokenFuture<'_> {
        Box::pin(async move {
            self.ensure_token_valid().await?;
            Ok(self.token.lock().await.access_token.clone())
        })
    }
}
