// ── Appliance identity types ──
//
// ApplianceRecord is the display/identity view of one listing entry.
// The model-resolution and PNC-stripping heuristics live here as pure
// functions because their fallback behavior is what exports depend on.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use appliprobe_api::types::ApplianceSummary;

use super::info::ApplianceInfo;

/// Sentinel used whenever a model or name cannot be determined.
pub const UNKNOWN: &str = "Unknown";

/// Minimum length of an all-digit leading token to count as a product
/// number code (PNC).
pub const PNC_MIN_DIGITS: usize = 6;

/// Field separators used inside appliance identifiers and model strings.
const ID_SEPARATORS: &[char] = &['-', '_', ':'];

/// Connectivity as reported by the directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    Unknown,
}

impl ConnectionState {
    /// Lenient parse: anything unrecognized (or absent) is `Unknown`.
    pub fn from_reported(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse().ok()).unwrap_or(Self::Unknown)
    }
}

/// Identity and display data for one appliance.
///
/// Built fresh on every directory fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplianceRecord {
    pub appliance_id: String,
    pub display_name: String,
    pub appliance_type: String,
    pub resolved_model: String,
    pub connection_state: ConnectionState,
}

impl From<&ApplianceSummary> for ApplianceRecord {
    fn from(s: &ApplianceSummary) -> Self {
        Self {
            appliance_id: s.appliance_id.clone(),
            display_name: s.name().unwrap_or(UNKNOWN).to_owned(),
            appliance_type: s.kind().unwrap_or("-").to_owned(),
            resolved_model: resolve_model(s.model(), &s.appliance_id),
            connection_state: ConnectionState::from_reported(s.connection_state.as_deref()),
        }
    }
}

impl ApplianceRecord {
    /// Prefer the model reported by `/info` over the listing's.
    #[must_use]
    pub fn with_info(mut self, info: &ApplianceInfo) -> Self {
        if let Some(model) = info.model() {
            model.clone_into(&mut self.resolved_model);
        }
        self
    }
}

// ── Heuristics ──────────────────────────────────────────────────────

/// Resolve a human-readable model identifier.
///
/// A non-blank reported model wins. Otherwise the leading segment of the
/// appliance id is used if it is all ASCII digits and at least
/// [`PNC_MIN_DIGITS`] long; anything else yields [`UNKNOWN`].
pub fn resolve_model(reported: Option<&str>, appliance_id: &str) -> String {
    if let Some(model) = reported.map(str::trim).filter(|m| !m.is_empty()) {
        return model.to_owned();
    }

    let leading = appliance_id
        .trim()
        .split(ID_SEPARATORS)
        .next()
        .unwrap_or_default();

    if is_pnc(leading) {
        leading.to_owned()
    } else {
        UNKNOWN.to_owned()
    }
}

/// Remove leading PNCs (digits + separator) from a model string.
///
/// `"914501128_EHE6899SA"` becomes `"EHE6899SA"`, and so does
/// `"914501128_123456_EHE6899SA"`. Stripping stops before a PNC with
/// nothing after it, so a bare PNC comes back unchanged.
pub fn strip_pnc_prefix(model: &str) -> &str {
    let mut rest = model.trim();
    while let Some(tail) = after_pnc(rest) {
        rest = tail;
    }
    rest
}

/// The non-empty remainder after a leading PNC and its separators.
fn after_pnc(model: &str) -> Option<&str> {
    let is_sep = |c: char| ID_SEPARATORS.contains(&c) || c == ' ';
    let sep_at = model.find(is_sep)?;
    let (head, tail) = model.split_at(sep_at);
    let rest = tail.trim_start_matches(is_sep);
    (is_pnc(head) && !rest.is_empty()).then_some(rest)
}

fn is_pnc(token: &str) -> bool {
    token.len() >= PNC_MIN_DIGITS && token.bytes().all(|b| b.is_ascii_digit())
}
