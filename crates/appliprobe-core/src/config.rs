// ── Runtime connection configuration ──
//
// Describes how to reach the appliance service. Carries credentials and
// transport tuning but never touches disk: the CLI builds a `ClientConfig`
// from flags, environment, and profile, then hands it in.

use std::path::PathBuf;
use std::time::Duration;

use appliprobe_api::{ApplianceClient, Credentials, DEFAULT_BASE_URL, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled web PKI roots.
    #[default]
    SystemDefaults,
    /// Also trust the PEM certificate at this path.
    CustomCa(PathBuf),
}

/// Everything needed to build an authenticated client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root, e.g. `https://api.developer.electrolux.one`.
    pub base_url: Url,
    pub credentials: Credentials,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Config against the public endpoint with default tuning.
    pub fn new(
        api_key: SecretString,
        access_token: SecretString,
        refresh_token: SecretString,
    ) -> Result<Self, CoreError> {
        let base_url = Url::parse(DEFAULT_BASE_URL).map_err(|e| CoreError::Config {
            message: format!("invalid default base URL: {e}"),
        })?;
        Ok(Self {
            base_url,
            credentials: Credentials::new(api_key, access_token, refresh_token),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        })
    }

    /// Build the authenticated transport client.
    pub fn build_client(&self) -> Result<ApplianceClient, CoreError> {
        let transport = TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            },
            timeout: self.timeout,
        };
        let client = ApplianceClient::new(
            self.base_url.as_str(),
            self.credentials.clone(),
            &transport,
        )?;
        tracing::debug!(base_url = %client.base_url(), "appliance client ready");
        Ok(client)
    }
}
