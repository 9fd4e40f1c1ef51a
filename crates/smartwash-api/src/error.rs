use thiserror::Error;

/// Top-level error type for the `smartwash-api` crate.
///
/// Covers every failure mode of the SmartThings cloud surfaces:
/// authentication, token refresh, transport, REST, subscriptions and the
/// event stream. `smartwash-core` maps these into lifecycle conditions.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Bearer token rejected (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The OAuth token endpoint refused to refresh the token.
    #[error("Token refresh failed (HTTP {status}): {message}")]
    TokenRefresh { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Could not build the HTTP client.
    #[error("Client setup error: {0}")]
    ClientSetup(String),

    // ── REST ────────────────────────────────────────────────────────
    /// Non-success status from the REST API.
    #[error("SmartThings API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Subscriptions ───────────────────────────────────────────────
    /// The cloud refused to create the event sink for a subscription.
    #[error("Subscription sink error: {message}")]
    Sink { message: String },

    /// The location already has the maximum number of event connections.
    #[error("Maximum number of event connections reached")]
    MaxConnectionsReached,

    /// The event stream failed mid-flight.
    #[error("Event stream error: {0}")]
    Stream(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if re-authentication is the only way forward.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::TokenRefresh { status: 400, .. }
        )
    }

    /// Returns `true` if this is a connectivity problem worth retrying later.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Stream(_) | Self::MaxConnectionsReached => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_refresh_is_auth_failure() {
        let err = Error::TokenRefresh {
            status: 400,
            message: "invalid_grant".into(),
        };
        assert!(err.is_auth_failure());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = Error::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(err.is_connection_error());
        assert!(!err.is_not_found());
    }

    #[test]
    fn refresh_with_server_error_is_not_auth_failure() {
        let err = Error::TokenRefresh {
            status: 500,
            message: "boom".into(),
        };
        assert!(!err.is_auth_failure());
    }
}
