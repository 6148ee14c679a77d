// Hand-crafted async HTTP client for the appliance control API.
//
// Base path: /api/v1/
// Auth: x-api-key header + bearer access token (refreshed on 401)

use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{Credentials, RefreshRequest, RefreshResponse, TokenPair};
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{ApplianceInfoResponse, ApplianceSummary, ErrorBody};

/// Default public endpoint of the appliance API.
pub const DEFAULT_BASE_URL: &str = "https://api.developer.electrolux.one";

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the appliance REST API.
///
/// Holds the token pair behind a lock so a `401` can transparently refresh
/// the access token and replay the request once. Everything else is a
/// straight request/response mapping; retry policy beyond that single
/// replay is left to the caller.
#[derive(Debug)]
pub struct ApplianceClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: RwLock<TokenPair>,
    refreshed: AtomicBool,
}

impl ApplianceClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from credentials and a transport config.
    ///
    /// Injects `x-api-key` as a default header on every request.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(credentials.api_key.expose_secret())
            .map_err(|_| Error::InvalidApiKey)?;
        key_value.set_sensitive(true);
        headers.insert("x-api-key", key_value);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http, credentials.tokens)
    }

    /// Wrap an existing `reqwest::Client` (caller manages the API key header).
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        tokens: TokenPair,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            tokens: RwLock::new(tokens),
            refreshed: AtomicBool::new(false),
        })
    }

    /// Ensure the base URL ends in `/api/v1`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/api/v1") {
            url.set_path(&path);
        } else {
            url.set_path(&format!("{path}/api/v1"));
        }
        Ok(url)
    }

    /// The normalized API root (always ends in `/api/v1`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the token pair changed since construction.
    pub fn tokens_refreshed(&self) -> bool {
        self.refreshed.load(Ordering::Relaxed)
    }

    /// A copy of the current token pair.
    pub async fn tokens(&self) -> TokenPair {
        self.tokens.read().await.clone()
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments to the API root, percent-encoding each one.
    ///
    /// Appliance ids contain `:` and `_`, so they go through
    /// `path_segments_mut` rather than a string join.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List every appliance registered to the account.
    ///
    /// `GET /api/v1/appliances`
    pub async fn list_appliances(&self) -> Result<Vec<ApplianceSummary>, Error> {
        let url = self.url(&["appliances"])?;
        self.get(url).await
    }

    /// Fetch the reported state tree of one appliance.
    ///
    /// `GET /api/v1/appliances/{id}/state`
    pub async fn get_appliance_state(&self, appliance_id: &str) -> Result<Value, Error> {
        let url = self.url(&["appliances", appliance_id, "state"])?;
        self.get(url).await
    }

    /// Fetch static info plus the capability schema of one appliance.
    ///
    /// `GET /api/v1/appliances/{id}/info`
    pub async fn get_appliance_info(
        &self,
        appliance_id: &str,
    ) -> Result<ApplianceInfoResponse, Error> {
        let url = self.url(&["appliances", appliance_id, "info"])?;
        self.get(url).await
    }

    /// Submit a command object to one appliance.
    ///
    /// `PUT /api/v1/appliances/{id}/command`. Returns the response body
    /// (`Value::Null` when the service answers with an empty body).
    pub async fn execute_command(&self, appliance_id: &str, command: &Value) -> Result<Value, Error> {
        let url = self.url(&["appliances", appliance_id, "command"])?;
        debug!(appliance_id, "submitting command");
        let resp = self.send(Method::PUT, url, Some(command)).await?;
        Self::handle_response(resp).await
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// `POST /api/v1/token/refresh`
    pub async fn refresh_tokens(&self) -> Result<(), Error> {
        let url = self.url(&["token", "refresh"])?;
        debug!("POST {url}");

        let refresh_token = self.tokens.read().await.refresh_token.expose_secret().to_owned();
        let resp = self
            .http
            .post(url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&raw)
                .ok()
                .and_then(|b| b.message.or(b.error))
                .unwrap_or_else(|| status.to_string());
            warn!(%status, "token refresh rejected");
            return Err(Error::TokenRefresh { message });
        }

        let body: RefreshResponse = Self::handle_response(resp).await?;
        let mut tokens = self.tokens.write().await;
        tokens.access_token = body.access_token.into();
        if let Some(refresh) = body.refresh_token {
            tokens.refresh_token = refresh.into();
        }
        self.refreshed.store(true, Ordering::Relaxed);
        debug!(expires_in = ?body.expires_in, "access token refreshed");
        Ok(())
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let resp = self.send(Method::GET, url, None).await?;
        Self::handle_response(resp).await
    }

    /// Send with the current bearer token; on `401` refresh once and replay.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, Error> {
        let resp = self.send_once(method.clone(), url.clone(), body).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        debug!("access token rejected, refreshing");
        self.refresh_tokens().await?;

        let resp = self.send_once(method, url, body).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "access token rejected after refresh".into(),
            });
        }
        Ok(resp)
    }

    async fn send_once(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, Error> {
        debug!("{method} {url}");

        let mut bearer = HeaderValue::from_str(&self.tokens.read().await.bearer()).map_err(|_| {
            Error::Authentication {
                message: "access token contains invalid header characters".into(),
            }
        })?;
        bearer.set_sensitive(true);

        let mut req = self.http.request(method, url).header(AUTHORIZATION, bearer);
        if let Some(body) = body {
            req = req.json(body);
        }
        Ok(req.send().await?)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        let text = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(text).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        match status {
            StatusCode::UNAUTHORIZED => {
                return Error::Authentication {
                    message: "request rejected as unauthenticated".into(),
                };
            }
            StatusCode::NOT_FOUND => {
                return Error::NotFound {
                    path: resp.url().path().to_owned(),
                };
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0);
                return Error::RateLimited { retry_after_secs };
            }
            _ => {}
        }

        let raw = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&raw) {
            Ok(err) => Error::Api {
                status: status.as_u16(),
                code: err.error,
                message: err.message.unwrap_or_else(|| status.to_string()),
                detail: err.detail.map(|d| match d {
                    Value::String(s) => s,
                    other => other.to_string(),
                }),
            },
            Err(_) => Error::Api {
                status: status.as_u16(),
                code: None,
                message: if raw.trim().is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                detail: None,
            },
        }
    }
}
