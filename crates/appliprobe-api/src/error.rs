use thiserror::Error;

/// Top-level error type for the `appliprobe-api` crate.
///
/// Covers every failure mode of the appliance REST surface:
/// authentication, token refresh, transport, and structured API errors.
/// `appliprobe-core` maps these into session-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Request rejected as unauthenticated, even after a token refresh.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The refresh token was rejected or the refresh endpoint failed.
    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    /// Invalid API key (rejected when building the request headers).
    #[error("Invalid API key")]
    InvalidApiKey,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Rate limited by the service. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Service ─────────────────────────────────────────────────────
    /// The requested appliance (or other resource) does not exist.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Structured error from the service (`{error, message, detail}` body).
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        detail: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }
}
