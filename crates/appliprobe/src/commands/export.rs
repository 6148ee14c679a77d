//! `appliprobe export`: write inspection artifacts to disk.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tabled::Tabled;

use appliprobe_core::{ApplianceClient, ApplianceRecord, export};

use crate::cli::{ExportArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct Written {
    appliance_id: String,
    path: PathBuf,
}

#[derive(Tabled)]
struct WrittenRow {
    #[tabled(rename = "Appliance")]
    appliance_id: String,
    #[tabled(rename = "File")]
    path: String,
}

impl From<&Written> for WrittenRow {
    fn from(w: &Written) -> Self {
        Self {
            appliance_id: w.appliance_id.clone(),
            path: w.path.display().to_string(),
        }
    }
}

/// Pick the target directory: `--dir`, then config `export_dir`, then `.`.
pub fn target_dir(flag: Option<PathBuf>, configured: Option<PathBuf>) -> PathBuf {
    flag.or(configured).unwrap_or_else(|| PathBuf::from("."))
}

pub async fn handle(
    client: &ApplianceClient,
    args: ExportArgs,
    export_dir: Option<PathBuf>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let directory = util::load_directory(client, global).await?;
    let dir = target_dir(args.dir, export_dir);

    let targets: Vec<&ApplianceRecord> = match args.appliance.as_deref() {
        Some(input) => vec![util::resolve_appliance(&directory, input)?],
        None => directory.records().iter().collect(),
    };

    let mut written = Vec::with_capacity(targets.len());
    for record in targets {
        let path = export_one(client, record, &dir, global).await?;
        written.push(Written {
            appliance_id: record.appliance_id.clone(),
            path,
        });
    }

    let out = output::render_list(&global.output, &written, |w| WrittenRow::from(w), |w| {
        w.path.display().to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn export_one(
    client: &ApplianceClient,
    record: &ApplianceRecord,
    dir: &Path,
    global: &GlobalOpts,
) -> Result<PathBuf, CliError> {
    let message = format!("Exporting {}", record.display_name);
    let path = output::with_spinner(
        &message,
        global.quiet,
        export::export_appliance(client, record, dir),
    )
    .await?;
    Ok(path)
}
