// ── Reported state ──

use serde::Serialize;
use serde_json::Value;

use super::appliance::ConnectionState;

/// One point-in-time read of an appliance's reported state.
///
/// The tree is kept as the service returned it. A snapshot is never reused
/// across fetches; every `state` directive asks the service again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StateSnapshot(Value);

impl StateSnapshot {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// The `properties.reported` subtree, if present.
    pub fn reported(&self) -> Option<&Value> {
        self.0.pointer("/properties/reported")
    }

    /// Connectivity, from the top level or else from the reported tree.
    pub fn connection_state(&self) -> ConnectionState {
        let raw = self
            .0
            .get("connectionState")
            .or_else(|| self.reported()?.get("connectionState"))
            .and_then(Value::as_str);
        ConnectionState::from_reported(raw)
    }

    /// Operating state (`applianceState`, else `executionState`).
    pub fn appliance_state(&self) -> Option<&str> {
        let reported = self.reported()?;
        reported
            .get("applianceState")
            .or_else(|| reported.get("executionState"))
            .and_then(Value::as_str)
    }

    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

impl From<Value> for StateSnapshot {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}
