// Wire types for the appliance REST API.
//
// Only the fields the tool inspects are typed; everything else is kept
// as raw JSON so inspection exports stay lossless.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of `GET /api/v1/appliances`.
///
/// The listing comes in two shapes depending on the API generation: flat
/// (`applianceName`, `applianceType` at the top level) or nested under
/// `applianceData`. Both are accepted; accessors prefer the flat field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceSummary {
    pub appliance_id: String,
    #[serde(default)]
    pub appliance_name: Option<String>,
    #[serde(default)]
    pub appliance_type: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub connection_state: Option<String>,
    #[serde(default)]
    pub appliance_data: Option<ApplianceData>,
}

/// Nested `applianceData` block of a listing entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceData {
    #[serde(default)]
    pub appliance_name: Option<String>,
    #[serde(default)]
    pub appliance_type: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl ApplianceSummary {
    pub fn name(&self) -> Option<&str> {
        non_blank(self.appliance_name.as_deref()).or_else(|| {
            self.appliance_data
                .as_ref()
                .and_then(|d| non_blank(d.appliance_name.as_deref()))
        })
    }

    pub fn kind(&self) -> Option<&str> {
        non_blank(self.appliance_type.as_deref()).or_else(|| {
            self.appliance_data
                .as_ref()
                .and_then(|d| non_blank(d.appliance_type.as_deref()))
        })
    }

    /// Model name as reported by the service, if any.
    pub fn model(&self) -> Option<&str> {
        self.appliance_data
            .as_ref()
            .and_then(|d| non_blank(d.model_name.as_deref()))
            .or_else(|| non_blank(self.model_name.as_deref()))
    }
}

/// Response of `GET /api/v1/appliances/{id}/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceInfoResponse {
    #[serde(default)]
    pub appliance_info: Value,
    #[serde(default)]
    pub capabilities: Value,
}

/// Error body returned by the service on rejected requests.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<Value>,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
