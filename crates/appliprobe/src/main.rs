mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a service connection
        Some(Command::Config(args)) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Some(Command::Completions(args)) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "appliprobe", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the service
        cmd => {
            let conn = config::connect(&cli.global)?;
            tracing::debug!(command = ?cmd, profile = %conn.profile_name, "dispatching command");
            let result = commands::dispatch(cmd, &conn, &cli.global).await;
            config::store_refreshed_tokens(&conn.client, &conn.profile_name).await;
            result
        }
    }
}
