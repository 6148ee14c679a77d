//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod appliances;
pub mod config_cmd;
pub mod export;
pub mod session;
pub mod util;

use crate::cli::{Command, GlobalOpts, SessionArgs};
use crate::config::Connection;
use crate::error::CliError;

/// Dispatch a service-bound command to the appropriate handler.
///
/// `None` runs the interactive session.
pub async fn dispatch(
    cmd: Option<Command>,
    conn: &Connection,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = &conn.client;
    match cmd {
        None => session::handle(client, SessionArgs::default(), global).await,
        Some(Command::Session(args)) => session::handle(client, args, global).await,
        Some(Command::List) => appliances::list(client, global).await,
        Some(Command::State(args)) => appliances::state(client, args, global).await,
        Some(Command::Capabilities(args)) => appliances::capabilities(client, args, global).await,
        Some(Command::Export(args)) => {
            export::handle(client, args, conn.export_dir.clone(), global).await
        }
        // Config and Completions are handled before dispatch
        Some(Command::Config(_) | Command::Completions(_)) => Err(CliError::Internal(
            "local command reached the network dispatcher".into(),
        )),
    }
}
