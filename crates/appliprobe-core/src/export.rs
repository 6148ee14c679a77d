// ── Inspection export ──
//
// Writes one text artifact per appliance: a metadata header, then the
// reported state and the capability schema as pretty JSON. The file is
// named after the model with any PNC prefix stripped, and an existing
// file of the same name is overwritten.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::{
    ApplianceDetails, ApplianceRecord, ConnectionState, StateSnapshot, UNKNOWN, strip_pnc_prefix,
};
use crate::service::ApplianceService;

pub const STATE_MARKER: &str = "--- STATE ---";
pub const CAPABILITIES_MARKER: &str = "--- CAPABILITIES ---";

/// Artifact file name for a resolved model: `<strippedModel>.txt`.
pub fn file_name(resolved_model: &str) -> String {
    let stem: String = strip_pnc_prefix(resolved_model)
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        format!("{UNKNOWN}.txt")
    } else {
        format!("{stem}.txt")
    }
}

/// Render the artifact text.
pub fn render(
    record: &ApplianceRecord,
    state: &StateSnapshot,
    details: &ApplianceDetails,
    exported_at: DateTime<Utc>,
) -> String {
    let catalog = &details.catalog;
    let connection = match state.connection_state() {
        ConnectionState::Unknown => record.connection_state,
        reported => reported,
    };
    let capabilities = if catalog.is_empty() {
        "none reported".to_owned()
    } else {
        format!("{} ({} writable)", catalog.len(), catalog.writable_count())
    };

    let mut out = String::new();
    let _ = writeln!(out, "Appliance: {}", record.display_name);
    let _ = writeln!(out, "Appliance ID: {}", record.appliance_id);
    let _ = writeln!(out, "Type: {}", record.appliance_type);
    let _ = writeln!(out, "Brand: {}", details.info.brand());
    let _ = writeln!(out, "Model: {}", record.resolved_model);
    let _ = writeln!(out, "Connection: {connection}");
    let _ = writeln!(
        out,
        "Exported: {}",
        exported_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let _ = writeln!(out, "Capabilities: {capabilities}");
    let _ = writeln!(out, "{STATE_MARKER}");
    let _ = writeln!(out, "{}", pretty(state.raw()));
    let _ = writeln!(out, "{CAPABILITIES_MARKER}");
    let _ = writeln!(out, "{}", pretty(catalog.raw()));
    out
}

/// Render and write the artifact into `dir`, returning its path.
pub fn write_export(
    dir: &Path,
    record: &ApplianceRecord,
    state: &StateSnapshot,
    details: &ApplianceDetails,
    exported_at: DateTime<Utc>,
) -> Result<PathBuf, CoreError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(&record.resolved_model));
    std::fs::write(&path, render(record, state, details, exported_at))?;
    info!(appliance_id = %record.appliance_id, path = %path.display(), "inspection exported");
    Ok(path)
}

/// Fetch state and info for one appliance and export them now.
///
/// The state is required. Info is not: apart from an unknown appliance,
/// its failure is logged and the artifact carries an empty catalog.
pub async fn export_appliance<S: ApplianceService + Sync>(
    service: &S,
    record: &ApplianceRecord,
    dir: &Path,
) -> Result<PathBuf, CoreError> {
    let id = record.appliance_id.as_str();
    let state = service.get_state(id).await?;
    let details = match service.get_details(id).await {
        Ok(details) => details,
        Err(e @ CoreError::NotFound { .. }) => return Err(e),
        Err(e) => {
            warn!(appliance_id = id, error = %e, "appliance info unavailable, exporting without capabilities");
            ApplianceDetails::default()
        }
    };
    let record = record.clone().with_info(&details.info);
    write_export(dir, &record, &state, &details, Utc::now())
}

fn pretty(value: &Value) -> String {
    if value.is_null() {
        return "{}".to_owned();
    }
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
