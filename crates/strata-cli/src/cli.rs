//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Strata - install and upgrade versioned database schemas
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Named target from strata.yml (falls back to STRATA_TARGET)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the schema from scratch
    Install(InstallArgs),

    /// Apply pending upgrade files up to the declared version
    Upgrade(UpgradeArgs),

    /// Show installed and declared versions and pending upgrades
    Status(StatusArgs),

    /// Print the schema version this build declares
    InstallVersion,

    /// Print the default schema name
    DefaultSchema,
}

/// Arguments for the install command
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Schema to install into (default: target or config schema)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Drop an existing installation first
    #[arg(long)]
    pub overwrite: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the upgrade command
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Schema to upgrade (default: target or config schema)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Confirm the upgrade; required
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Schema to inspect (default: target or config schema)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Do not connect; report only what the project files declare
    #[arg(long)]
    pub offline: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
