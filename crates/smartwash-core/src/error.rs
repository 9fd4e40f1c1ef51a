// ── Core error types ──
//
// Lifecycle-level errors from smartwash-core. Consumers never see HTTP
// status codes directly; `From<smartwash_api::Error>` folds transport
// failures into the two conditions a host acts on (re-authenticate or
// retry later) plus a generic API bucket.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lifecycle conditions ─────────────────────────────────────────
    /// Credentials are missing or rejected; the user must re-authenticate.
    #[error("Re-authentication required: {message}")]
    ReauthRequired { message: String },

    /// A transient failure; setup should be retried later.
    #[error("Not ready, retry later: {message}")]
    NotReady { message: String },

    #[error("Integration is not set up")]
    ControllerDisconnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("Entity not found: {unique_id}")]
    EntityNotFound { unique_id: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Value {value} outside {min}..={max}")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("Invalid option {option:?}; expected one of {options:?}")]
    InvalidOption {
        option: String,
        options: Vec<String>,
    },

    // ── API errors (wrapped) ─────────────────────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Whether the host should schedule a retry rather than give up.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<smartwash_api::Error> for CoreError {
    fn from(err: smartwash_api::Error) -> Self {
        use smartwash_api::Error as ApiError;

        if err.is_auth_failure() {
            return CoreError::ReauthRequired {
                message: err.to_string(),
            };
        }
        if err.is_connection_error() {
            return CoreError::NotReady {
                message: err.to_string(),
            };
        }
        match err {
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::ClientSetup(message) => CoreError::Config { message },
            ApiError::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            ApiError::TokenRefresh { status, message } => CoreError::NotReady {
                message: format!("token refresh failed (HTTP {status}): {message}"),
            },
            ApiError::Sink { message } => CoreError::NotReady { message },
            other => CoreError::Api {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartwash_api::Error as ApiError;

    #[test]
    fn bad_request_refresh_requires_reauth() {
        let err = CoreError::from(ApiError::TokenRefresh {
            status: 400,
            message: "invalid_grant".into(),
        });
        assert!(matches!(err, CoreError::ReauthRequired { .. }));
    }

    #[test]
    fn other_refresh_failures_are_retryable() {
        let err = CoreError::from(ApiError::TokenRefresh {
            status: 503,
            message: "down".into(),
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn unauthorized_requires_reauth() {
        let err = CoreError::from(ApiError::Authentication {
            message: "401".into(),
        });
        assert!(matches!(err, CoreError::ReauthRequired { .. }));
    }

    #[test]
    fn client_errors_stay_api_errors() {
        let err = CoreError::from(ApiError::Api {
            status: 422,
            message: "bad argument".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(422), .. }));
    }
}
