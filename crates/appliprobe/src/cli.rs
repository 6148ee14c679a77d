//! Clap derive structures for the `appliprobe` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// appliprobe -- poke at cloud-connected appliances from a terminal
#[derive(Debug, Parser)]
#[command(
    name = "appliprobe",
    version,
    about = "Inspect and exercise cloud-controlled home appliances",
    long_about = "Interactive diagnostic tool for a cloud appliance-control API.\n\n\
        Lists the appliances on an account, shows their capability schema and\n\
        reported state, and submits ad-hoc JSON commands while showing the\n\
        service's verdict. Runs an interactive session when no subcommand is given.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "APPLIPROBE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "APPLIPROBE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Developer API key
    #[arg(long, env = "API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// OAuth access token
    #[arg(long, env = "ACCESS_TOKEN", global = true, hide_env_values = true)]
    pub access_token: Option<String>,

    /// OAuth refresh token
    #[arg(long, env = "REFRESH_TOKEN", global = true, hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "APPLIPROBE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "APPLIPROBE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive command session (default)
    #[command(alias = "s")]
    Session(SessionArgs),

    /// List the appliances registered to the account
    #[command(alias = "ls")]
    List,

    /// Show the reported state of one appliance
    State(ApplianceArg),

    /// Show the capability schema of one appliance
    #[command(alias = "caps")]
    Capabilities(ApplianceArg),

    /// Write inspection artifacts (state + capabilities) to disk
    Export(ExportArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Per-command arguments ────────────────────────────────────────────

#[derive(Debug, Default, Args)]
pub struct SessionArgs {
    /// Appliance to open (1-based index or id); prompts when omitted
    #[arg(long, short = 'a')]
    pub appliance: Option<String>,

    /// Re-read the state after every accepted command
    #[arg(long)]
    pub state_after: bool,
}

#[derive(Debug, Args)]
pub struct ApplianceArg {
    /// Appliance id or 1-based index from `appliprobe list`
    pub appliance: String,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Appliance id or 1-based index from `appliprobe list`
    #[arg(conflicts_with = "all", required_unless_present = "all")]
    pub appliance: Option<String>,

    /// Export every appliance on the account
    #[arg(long)]
    pub all: bool,

    /// Target directory (default: config `export_dir`, else the working directory)
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
