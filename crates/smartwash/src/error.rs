//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use smartwash_config::ConfigError;
use smartwash_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the SmartThings cloud: {message}")]
    #[diagnostic(
        code(smartwash::connection_failed),
        help("The cloud or the network is unavailable. Retry later, or run with -vv for details.")
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Re-authentication required")]
    #[diagnostic(
        code(smartwash::auth_failed),
        help(
            "{message}\n\
             Store a fresh token with: smartwash config set-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for entry '{entry}'")]
    #[diagnostic(
        code(smartwash::no_credentials),
        help(
            "Configure credentials with: smartwash config init\n\
             Or set the SMARTWASH_TOKEN environment variable."
        )
    )]
    NoCredentials { entry: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(smartwash::not_found),
        help("Run: smartwash {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(smartwash::api_error))]
    ApiError { code: String, message: String },

    #[error("Operation '{operation}' is not supported")]
    #[diagnostic(
        code(smartwash::unsupported),
        help("Check the entity platform with: smartwash entities get <unique-id>")
    )]
    Unsupported { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(smartwash::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Entry '{name}' not found in configuration")]
    #[diagnostic(
        code(smartwash::entry_not_found),
        help(
            "Available entries: {available}\n\
             Create one with: smartwash config init"
        )
    )]
    EntryNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(smartwash::no_config),
        help(
            "Create one with: smartwash config init\n\
             Or pass --location, --installed-app and --token.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(smartwash::config))]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ReauthRequired { message } => CliError::AuthFailed { message },

            CoreError::NotReady { message } => CliError::ConnectionFailed { message },

            CoreError::ControllerDisconnected => CliError::ConnectionFailed {
                message: "the integration is not set up".into(),
            },

            CoreError::DeviceNotFound { device_id } => CliError::NotFound {
                resource_type: "device".into(),
                identifier: device_id,
                list_command: "devices list".into(),
            },

            CoreError::EntityNotFound { unique_id } => CliError::NotFound {
                resource_type: "entity".into(),
                identifier: unique_id,
                list_command: "entities list".into(),
            },

            CoreError::Unsupported { operation } => CliError::Unsupported { operation },

            err @ (CoreError::OutOfRange { .. } | CoreError::InvalidOption { .. }) => {
                CliError::Validation {
                    field: "value".into(),
                    reason: err.to_string(),
                }
            }

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "api".into(), |s| s.to_string()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { entry } => CliError::NoCredentials { entry },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::EntryNotFound { name } => CliError::EntryNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_map_to_exit_codes() {
        let reauth: CliError = CoreError::ReauthRequired {
            message: "token rejected".into(),
        }
        .into();
        assert_eq!(reauth.exit_code(), exit_code::AUTH);

        let retry: CliError = CoreError::NotReady {
            message: "503".into(),
        }
        .into();
        assert_eq!(retry.exit_code(), exit_code::CONNECTION);

        let missing: CliError = CoreError::EntityNotFound {
            unique_id: "d1.start".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn invalid_option_is_a_usage_error() {
        let err: CliError = CoreError::InvalidOption {
            option: "1600".into(),
            options: vec!["400".into()],
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert!(err.to_string().contains("1600"));
    }
}
