//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use appliprobe_config::ConfigError;
use appliprobe_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the appliance service at {url}")]
    #[diagnostic(
        code(appliprobe::connection_failed),
        help(
            "Check network access and the base URL.\n\
             Override it with --base-url or `base_url` in your profile."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(appliprobe::auth_failed),
        help(
            "The access token was rejected and could not be refreshed.\n\
             Supply fresh tokens via ACCESS_TOKEN / REFRESH_TOKEN or run: appliprobe config init"
        )
    )]
    AuthFailed { message: String },

    #[error("No {field} available for profile '{profile}'")]
    #[diagnostic(
        code(appliprobe::no_credentials),
        help(
            "Set the {env} environment variable, pass --{field},\n\
             or store it with: appliprobe config init"
        )
    )]
    NoCredentials {
        profile: String,
        field: String,
        env: String,
    },

    #[error("Credential error: {message}")]
    #[diagnostic(code(appliprobe::credential))]
    Credential { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(appliprobe::not_found),
        help("Run: appliprobe list to see the appliances on this account")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("No appliances are registered to this account")]
    #[diagnostic(
        code(appliprobe::empty_directory),
        help("Pair an appliance with the vendor's mobile app, then try again.")
    )]
    EmptyDirectory,

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(appliprobe::api_error))]
    ApiError { code: String, message: String },

    #[error("Rate limited by the service")]
    #[diagnostic(
        code(appliprobe::rate_limited),
        help("Retry after {retry_after_secs}s.")
    )]
    RateLimited { retry_after_secs: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(appliprobe::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(appliprobe::config),
        help("Inspect the file with: appliprobe config show")
    )]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(appliprobe::timeout),
        help("Increase the timeout with --timeout or check service responsiveness.")
    )]
    Timeout,

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    #[diagnostic(code(appliprobe::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::Credential { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } | Self::EmptyDirectory => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Credential { message } => Self::Credential { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                resource_type: entity_type,
                identifier,
            },
            CoreError::EmptyDirectory => Self::EmptyDirectory,
            CoreError::Api { message, code, status } => Self::ApiError {
                code: code
                    .or_else(|| status.map(|s| format!("HTTP {s}")))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },
            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
            CoreError::Parse { message, .. } => Self::Validation {
                field: "command".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
            CoreError::Io(e) => Self::Io(e),
        }
    }
}
