// Shared transport configuration for building reqwest::Client instances.
//
// The REST client, the token refresher and the event stream all build
// their HTTP clients through this module so timeouts and the user agent
// stay consistent.

use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Production REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.smartthings.com/v1/";

/// Production OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://auth-global.api.smartthings.com/oauth/token";

const USER_AGENT: &str = concat!("smartwash/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// REST base URL, always ending in `/`.
    pub base_url: Url,
    /// Per-request timeout. The event stream ignores it.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a config pointing at a custom base URL (e.g. a mock server).
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self {
            base_url: url,
            ..Self::default()
        })
    }

    /// Build a `reqwest::Client` for request/response calls.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::ClientSetup(format!("failed to build HTTP client: {e}")))
    }

    /// Build a `reqwest::Client` for long-lived streaming responses.
    ///
    /// Only the connect phase is bounded; the body may stay open forever.
    pub fn build_stream_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::ClientSetup(format!("failed to build stream client: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = TransportConfig::with_base_url("http://127.0.0.1:9000/v1").unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:9000/v1/");
        assert_eq!(
            config.base_url.join("devices").unwrap().as_str(),
            "http://127.0.0.1:9000/v1/devices"
        );
    }

    #[test]
    fn default_points_at_production() {
        let config = TransportConfig::default();
        assert_eq!(config.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
