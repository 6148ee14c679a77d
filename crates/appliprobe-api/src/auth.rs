use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Credentials for the appliance API.
///
/// The API key is static for the account; the token pair rotates whenever
/// the access token is refreshed.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Developer API key, sent as `x-api-key` on every request.
    pub api_key: SecretString,
    /// Current access + refresh tokens.
    pub tokens: TokenPair,
}

impl Credentials {
    pub fn new(api_key: SecretString, access_token: SecretString, refresh_token: SecretString) -> Self {
        Self {
            api_key,
            tokens: TokenPair {
                access_token,
                refresh_token,
            },
        }
    }
}

/// A bearer access token and the refresh token that renews it.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

impl TokenPair {
    /// `Authorization` header value for the current access token.
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

// ── Refresh endpoint wire types ─────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub access_token: String,
    /// Some deployments rotate the refresh token, others keep it.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}
