//! Read-only appliance commands: list, state, capabilities.

use serde::Serialize;
use tabled::Tabled;

use appliprobe_core::{
    ApplianceClient, ApplianceRecord, ApplianceService, CapabilityDescriptor, StateSnapshot,
};

use crate::cli::{ApplianceArg, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ApplianceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "ID")]
    id: String,
}

/// A directory record with its 1-based selection index.
#[derive(Serialize)]
struct Listed<'a> {
    index: usize,
    #[serde(flatten)]
    record: &'a ApplianceRecord,
}

impl From<&Listed<'_>> for ApplianceRow {
    fn from(l: &Listed<'_>) -> Self {
        let r = l.record;
        Self {
            index: l.index,
            name: r.display_name.clone(),
            kind: r.appliance_type.clone(),
            model: r.resolved_model.clone(),
            connection: r.connection_state.to_string(),
            id: r.appliance_id.clone(),
        }
    }
}

#[derive(Tabled)]
struct CapabilityRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Type")]
    value_type: String,
    #[tabled(rename = "Access")]
    access: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Values")]
    values: String,
}

impl From<&CapabilityDescriptor> for CapabilityRow {
    fn from(d: &CapabilityDescriptor) -> Self {
        let bound = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        let range = match (d.min, d.max, d.step) {
            (None, None, None) => String::new(),
            (min, max, None) => format!("{}..{}", bound(min), bound(max)),
            (min, max, Some(step)) => format!("{}..{} /{step}", bound(min), bound(max)),
        };
        Self {
            key: d.key.clone(),
            value_type: d.value_type.to_string(),
            access: d.access.to_string(),
            range,
            default: d.default.as_ref().map(ToString::to_string).unwrap_or_default(),
            values: d.values.join(", "),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn list(client: &ApplianceClient, global: &GlobalOpts) -> Result<(), CliError> {
    let directory = util::load_directory(client, global).await?;
    let out = render_directory(&global.output, directory.records());
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Directory listing in the chosen format (shared with the session picker).
pub(crate) fn render_directory(format: &OutputFormat, records: &[ApplianceRecord]) -> String {
    let listed: Vec<Listed<'_>> = records
        .iter()
        .enumerate()
        .map(|(i, record)| Listed {
            index: i + 1,
            record,
        })
        .collect();
    output::render_list(format, &listed, |l| ApplianceRow::from(l), |l| {
        l.record.appliance_id.clone()
    })
}

pub async fn state(
    client: &ApplianceClient,
    args: ApplianceArg,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let directory = util::load_directory(client, global).await?;
    let record = util::resolve_appliance(&directory, &args.appliance)?;
    let snapshot = output::with_spinner(
        "Reading state",
        global.quiet,
        client.get_state(&record.appliance_id),
    )
    .await?;

    let out = output::render_single(
        &global.output,
        &snapshot,
        StateSnapshot::to_pretty,
        |s| s.connection_state().to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn capabilities(
    client: &ApplianceClient,
    args: ApplianceArg,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let directory = util::load_directory(client, global).await?;
    let record = util::resolve_appliance(&directory, &args.appliance)?;
    let catalog = output::with_spinner(
        "Reading capabilities",
        global.quiet,
        client.get_details(&record.appliance_id),
    )
    .await?
    .catalog;

    if catalog.is_empty() {
        if !global.quiet {
            eprintln!("No capabilities reported for {}", record.display_name);
        }
        return Ok(());
    }

    let descriptors: Vec<&CapabilityDescriptor> = catalog.iter().collect();
    let out = output::render_list(
        &global.output,
        &descriptors,
        |d| CapabilityRow::from(*d),
        |d| d.key.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
