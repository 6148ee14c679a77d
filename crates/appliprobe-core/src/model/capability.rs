// ── Capability catalog ──
//
// Parsed view of the capability schema one appliance declares. The
// catalog is reference data: the session consults it for advisory
// pre-flight notes, the exporter for its summary line. It never blocks a
// command; the service stays authoritative.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use super::command::{CommandRequest, CommandValue};

/// Declared value type of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Number,
    String,
    Object,
}

impl ValueType {
    /// Normalize the vendor's type vocabulary.
    pub fn from_vendor(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Self::Boolean,
            "number" | "int" | "integer" | "float" | "double" | "temperature" => Self::Number,
            "string" | "enum" => Self::String,
            _ => Self::Object,
        }
    }

    /// Whether a requested value has this type.
    pub fn accepts(self, value: &CommandValue) -> bool {
        match self {
            Self::Boolean => matches!(value, CommandValue::Bool(_)),
            Self::Number => matches!(value, CommandValue::Number(_)),
            Self::String => matches!(value, CommandValue::Text(_)),
            Self::Object => true,
        }
    }

    fn accepts_json(self, value: &Value) -> bool {
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Object => true,
        }
    }
}

/// Read/write access of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    ReadWrite,
}

impl Access {
    /// `write`/`readwrite` are writable; `read`, `constant` and anything
    /// unknown are treated as read-only.
    pub fn from_vendor(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "readwrite" | "write" => Self::ReadWrite,
            _ => Self::Read,
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// One controllable or readable property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Slash-joined path, e.g. `userSelections/analogTemperature`.
    pub key: String,
    pub value_type: ValueType,
    pub access: Access,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub default: Option<Value>,
    /// Allowed values for enumerated strings (empty when unconstrained).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl CapabilityDescriptor {
    /// Build a descriptor from one schema object, enforcing the bounds
    /// invariants: non-numbers carry no bounds, `min <= max`, `step > 0`.
    pub fn from_schema(key: String, schema: &Map<String, Value>) -> Self {
        let value_type = schema
            .get("type")
            .and_then(Value::as_str)
            .map_or(ValueType::Object, ValueType::from_vendor);
        let access = schema
            .get("access")
            .and_then(Value::as_str)
            .map_or(Access::Read, Access::from_vendor);

        let (mut min, mut max, mut step) = (
            schema.get("min").and_then(Value::as_f64),
            schema.get("max").and_then(Value::as_f64),
            schema.get("step").and_then(Value::as_f64),
        );

        if value_type == ValueType::Number {
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    warn!(key, lo, hi, "capability declares min > max, ignoring bounds");
                    min = None;
                    max = None;
                }
            }
            if step.is_some_and(|s| s <= 0.0) {
                warn!(key, ?step, "capability declares non-positive step, ignoring it");
                step = None;
            }
        } else if min.is_some() || max.is_some() || step.is_some() {
            debug!(key, %value_type, "dropping numeric bounds on non-numeric capability");
            min = None;
            max = None;
            step = None;
        }

        let default = schema
            .get("default")
            .filter(|d| value_type.accepts_json(d))
            .cloned();

        let values = match schema.get("values") {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            key,
            value_type,
            access,
            min,
            max,
            step,
            default,
            values,
        }
    }

    /// Advisory checks of one requested value against this descriptor.
    fn check(&self, value: &CommandValue) -> Vec<NoteKind> {
        let mut notes = Vec::new();
        if !self.access.is_writable() {
            notes.push(NoteKind::ReadOnly);
        }
        if !self.value_type.accepts(value) {
            notes.push(NoteKind::TypeMismatch {
                expected: self.value_type,
                found: value.kind(),
            });
            return notes;
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min.filter(|min| n < *min) {
                notes.push(NoteKind::BelowMinimum { min, value: n });
            }
            if let Some(max) = self.max.filter(|max| n > *max) {
                notes.push(NoteKind::AboveMaximum { max, value: n });
            }
            if let Some(step) = self.step {
                let base = self.min.unwrap_or(0.0);
                let steps = (n - base) / step;
                if (steps - steps.round()).abs() > 1e-9 {
                    notes.push(NoteKind::OffStep { step, base });
                }
            }
        }

        if let CommandValue::Text(s) = value {
            if !self.values.is_empty() && !self.values.iter().any(|v| v == s) {
                notes.push(NoteKind::NotAllowed {
                    allowed: self.values.clone(),
                });
            }
        }
        notes
    }
}

// ── Pre-flight notes ────────────────────────────────────────────────

/// One advisory finding about a command before it is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct PreflightNote {
    pub key: String,
    pub kind: NoteKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteKind {
    UnknownCapability,
    ReadOnly,
    TypeMismatch {
        expected: ValueType,
        found: &'static str,
    },
    BelowMinimum {
        min: f64,
        value: f64,
    },
    AboveMaximum {
        max: f64,
        value: f64,
    },
    OffStep {
        step: f64,
        base: f64,
    },
    NotAllowed {
        allowed: Vec<String>,
    },
}

impl fmt::Display for PreflightNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = &self.key;
        match &self.kind {
            NoteKind::UnknownCapability => write!(f, "{key}: not in the capability catalog"),
            NoteKind::ReadOnly => write!(f, "{key}: declared read-only"),
            NoteKind::TypeMismatch { expected, found } => {
                write!(f, "{key}: expects {expected}, got {found}")
            }
            NoteKind::BelowMinimum { min, value } => {
                write!(f, "{key}: {value} is below the declared minimum {min}")
            }
            NoteKind::AboveMaximum { max, value } => {
                write!(f, "{key}: {value} is above the declared maximum {max}")
            }
            NoteKind::OffStep { step, base } => {
                write!(f, "{key}: not a multiple of step {step} from {base}")
            }
            NoteKind::NotAllowed { allowed } => {
                write!(f, "{key}: not one of {}", allowed.join(", "))
            }
        }
    }
}

// ── Catalog ─────────────────────────────────────────────────────────

/// All capabilities of one appliance, in the order the service lists them.
#[derive(Debug, Clone, Default)]
pub struct CapabilityCatalog {
    entries: IndexMap<String, CapabilityDescriptor>,
    raw: Value,
}

impl CapabilityCatalog {
    /// Parse a capability schema.
    ///
    /// Objects carrying `type` or `access` are descriptors; any other
    /// object is a container whose children are keyed `parent/child`.
    pub fn from_value(raw: Value) -> Self {
        let mut entries = IndexMap::new();
        if let Value::Object(root) = &raw {
            collect("", root, &mut entries);
        } else if !raw.is_null() {
            warn!("capability schema is not a JSON object, ignoring it");
        }
        Self { entries, raw }
    }

    pub fn get(&self, key: &str) -> Option<&CapabilityDescriptor> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.entries.values()
    }

    pub fn writable_count(&self) -> usize {
        self.iter().filter(|d| d.access.is_writable()).count()
    }

    /// The schema exactly as the service returned it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Soft pre-flight of a command against the catalog.
    ///
    /// Nested command objects are matched leaf by leaf (`parent/child`)
    /// unless the parent itself is a declared capability. An empty catalog
    /// produces no notes.
    pub fn preflight(&self, request: &CommandRequest) -> Vec<PreflightNote> {
        let mut notes = Vec::new();
        if self.is_empty() {
            return notes;
        }
        for (key, value) in request.iter() {
            self.check_entry(key, value, &mut notes);
        }
        notes
    }

    fn check_entry(&self, key: &str, value: &CommandValue, notes: &mut Vec<PreflightNote>) {
        if let Some(descriptor) = self.get(key) {
            notes.extend(descriptor.check(value).into_iter().map(|kind| PreflightNote {
                key: key.to_owned(),
                kind,
            }));
            return;
        }

        match value {
            CommandValue::Object(children) if !children.is_empty() => {
                for (child, v) in children {
                    self.check_entry(&format!("{key}/{child}"), v, notes);
                }
            }
            _ => notes.push(PreflightNote {
                key: key.to_owned(),
                kind: NoteKind::UnknownCapability,
            }),
        }
    }
}

fn collect(prefix: &str, node: &Map<String, Value>, out: &mut IndexMap<String, CapabilityDescriptor>) {
    for (name, value) in node {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let Value::Object(schema) = value else {
            debug!(key, "skipping non-object capability entry");
            continue;
        };
        if schema.contains_key("type") || schema.contains_key("access") {
            out.insert(key.clone(), CapabilityDescriptor::from_schema(key, schema));
        } else {
            collect(&key, schema, out);
        }
    }
}
