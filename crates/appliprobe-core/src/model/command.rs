// ── Command payloads ──
//
// The capability set is only known at runtime, so commands are carried as
// a dynamic value tree. Shape is checked loosely (one JSON object); what
// the keys and values mean is left to the service.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

/// One value inside a command object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<CommandValue>),
    Object(IndexMap<String, CommandValue>),
}

impl CommandValue {
    /// JSON type name, for operator-facing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::List(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl From<Value> for CommandValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&CommandValue> for Value {
    fn from(value: &CommandValue) -> Self {
        match value {
            CommandValue::Null => Value::Null,
            CommandValue::Bool(b) => Value::Bool(*b),
            CommandValue::Number(n) => Value::Number(n.clone()),
            CommandValue::Text(s) => Value::String(s.clone()),
            CommandValue::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            CommandValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// ── Request ─────────────────────────────────────────────────────────

/// A command payload: capability key to requested value, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommandRequest {
    entries: IndexMap<String, CommandValue>,
}

impl CommandRequest {
    /// Parse one line of operator input.
    ///
    /// Anything other than a well-formed JSON object is a
    /// [`CoreError::Parse`]. `{}` is accepted.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(text.trim()).map_err(|e| CoreError::Parse {
            message: e.to_string(),
            line: e.line(),
            column: e.column(),
        })?;

        match CommandValue::from(value) {
            CommandValue::Object(entries) => Ok(Self { entries }),
            other => Err(CoreError::Parse {
                message: format!("expected a JSON object, got {}", other.kind()),
                line: 1,
                column: 1,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CommandValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The request body sent to the service.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v)))
                .collect(),
        )
    }
}

// ── Result ──────────────────────────────────────────────────────────

/// The service's verdict on one submitted command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Accepted {
        response_body: Value,
    },
    Rejected {
        error_code: String,
        message: String,
        detail: Option<String>,
    },
}

impl CommandResult {
    /// Interpret a successful response body.
    ///
    /// Some gateways answer `2xx` with an error document
    /// (`{"error": ..., "message": ...}`); that is a rejection.
    pub fn from_response_body(body: Value) -> Self {
        let error_doc = body.as_object().and_then(|obj| {
            let code = obj.get("error")?.as_str()?;
            let message = obj.get("message")?.as_str()?;
            let detail = obj.get("detail").and_then(|d| match d {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            });
            Some((code.to_owned(), message.to_owned(), detail))
        });

        match error_doc {
            Some((error_code, message, detail)) => Self::Rejected {
                error_code,
                message,
                detail,
            },
            None => Self::Accepted {
                response_body: body,
            },
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_single_object() {
        let req = CommandRequest::parse(r#"  {"cavityLight": true, "targetTemperatureC": 180} "#)
            .unwrap();
        assert_eq!(req.len(), 2);
        let keys: Vec<_> = req.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["cavityLight", "targetTemperatureC"]);
        assert_eq!(
            req.to_json(),
            json!({ "cavityLight": true, "targetTemperatureC": 180 })
        );
    }

    #[test]
    fn nested_values_keep_their_shape() {
        let req = CommandRequest::parse(
            r#"{"userSelections": {"programUID": "BAKE", "steps": [1, 2.5, null]}}"#,
        )
        .unwrap();
        assert_eq!(
            req.to_json(),
            json!({ "userSelections": { "programUID": "BAKE", "steps": [1, 2.5, null] } })
        );
        assert_eq!(serde_json::to_value(&req).unwrap(), req.to_json());
    }

    #[test]
    fn empty_object_is_a_command() {
        let req = CommandRequest::parse("{}").unwrap();
        assert!(req.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = CommandRequest::parse(r#"{"cavityLight": }"#).unwrap_err();
        match err {
            CoreError::Parse { line, column, .. } => {
                assert_eq!(line, 1);
                assert!(column > 0);
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn non_object_json_is_a_parse_error() {
        for text in ["[1, 2]", "true", "42", "\"on\"", "null"] {
            let err = CommandRequest::parse(text).unwrap_err();
            assert!(
                err.to_string().starts_with("Invalid command JSON: expected a JSON object"),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn error_document_in_success_body_is_rejection() {
        let result = CommandResult::from_response_body(json!({
            "error": "COMMAND_VALIDATION_ERROR",
            "message": "Command validation failed",
            "detail": { "key": "targetTemperatureC" }
        }));
        assert_eq!(
            result,
            CommandResult::Rejected {
                error_code: "COMMAND_VALIDATION_ERROR".into(),
                message: "Command validation failed".into(),
                detail: Some(r#"{"key":"targetTemperatureC"}"#.into()),
            }
        );
    }

    #[test]
    fn other_bodies_are_accepted() {
        assert!(CommandResult::from_response_body(Value::Null).is_accepted());
        assert!(CommandResult::from_response_body(json!({ "status": "OK" })).is_accepted());
        assert!(CommandResult::from_response_body(json!({ "error": 3 })).is_accepted());
    }
}
