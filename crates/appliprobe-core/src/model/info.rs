// ── Appliance info ──
//
// Static details served by `/info`: the `applianceInfo` block and the
// capability schema, fetched together in one call.

use serde_json::Value;

use super::capability::CapabilityCatalog;

/// Brand shown when `applianceInfo` does not name one.
pub const DEFAULT_BRAND: &str = "Electrolux";

/// The `applianceInfo` object, kept raw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplianceInfo(Value);

impl ApplianceInfo {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Non-blank `model`, if reported.
    pub fn model(&self) -> Option<&str> {
        self.field("model")
    }

    pub fn brand(&self) -> &str {
        self.field("brand").unwrap_or(DEFAULT_BRAND)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    fn field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Everything `/info` returns for one appliance.
#[derive(Debug, Clone, Default)]
pub struct ApplianceDetails {
    pub info: ApplianceInfo,
    pub catalog: CapabilityCatalog,
}

impl ApplianceDetails {
    pub fn from_parts(appliance_info: Value, capabilities: Value) -> Self {
        Self {
            info: ApplianceInfo::new(appliance_info),
            catalog: CapabilityCatalog::from_value(capabilities),
        }
    }
}
