//! Shared helpers for command handlers.

use appliprobe_core::{ApplianceClient, ApplianceRecord, Directory};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Fetch the appliance listing behind a spinner. An empty account is an error.
pub async fn load_directory(
    client: &ApplianceClient,
    global: &GlobalOpts,
) -> Result<Directory, CliError> {
    let directory =
        output::with_spinner("Fetching appliances", global.quiet, Directory::fetch(client)).await?;
    if directory.is_empty() {
        return Err(CliError::EmptyDirectory);
    }
    Ok(directory)
}

/// Resolve an appliance argument (1-based index or exact id).
pub fn resolve_appliance<'a>(
    directory: &'a Directory,
    input: &str,
) -> Result<&'a ApplianceRecord, CliError> {
    Ok(directory.resolve(input)?)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
