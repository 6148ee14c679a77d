// ── Core error types ──
//
// Session-facing errors from appliprobe-core. Consumers never see HTTP
// status codes or reqwest errors directly: the `From<appliprobe_api::Error>`
// impl translates transport-layer failures into the categories the
// interactive session renders.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Startup ──────────────────────────────────────────────────────
    /// Missing or unusable credential inputs. Fatal before the loop starts.
    #[error("Credential error: {message}")]
    Credential { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Operator input ───────────────────────────────────────────────
    /// Operator text that is not a single JSON object.
    #[error("Invalid command JSON: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// The account has no appliances to work with.
    #[error("No appliances are registered to this account")]
    EmptyDirectory,

    // ── Transport ────────────────────────────────────────────────────
    #[error("Cannot reach appliance service at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// Service-specific error code (e.g. "COMMAND_VALIDATION_ERROR").
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Whether re-issuing the same request might succeed.
    ///
    /// True for every transport-level failure; false for answers the
    /// service has already given (not found) and local errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. }
            | Self::AuthenticationFailed { .. }
            | Self::Timeout
            | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => status.is_none_or(|s| s >= 500),
            _ => false,
        }
    }

    /// Operator-facing hint for retryable failures.
    pub fn retry_hint(&self) -> Option<String> {
        match self {
            Self::RateLimited { retry_after_secs } if *retry_after_secs > 0 => Some(format!(
                "wait {retry_after_secs}s, then re-enter the command"
            )),
            Self::AuthenticationFailed { .. } => {
                Some("check the access/refresh tokens, then re-enter the command".into())
            }
            _ if self.is_retryable() => Some("re-enter the command to retry".into()),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<appliprobe_api::Error> for CoreError {
    fn from(err: appliprobe_api::Error) -> Self {
        match err {
            appliprobe_api::Error::Authentication { message }
            | appliprobe_api::Error::TokenRefresh { message } => {
                CoreError::AuthenticationFailed { message }
            }
            appliprobe_api::Error::InvalidApiKey => CoreError::Credential {
                message: "API key contains characters that cannot be sent in a header".into(),
            },
            appliprobe_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            appliprobe_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            appliprobe_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            appliprobe_api::Error::RateLimited { retry_after_secs } => {
                CoreError::RateLimited { retry_after_secs }
            }
            appliprobe_api::Error::NotFound { path } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: path,
            },
            appliprobe_api::Error::Api {
                status,
                code,
                message,
                detail: _,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            appliprobe_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
