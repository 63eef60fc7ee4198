//! Clap derive structures for the `nbsync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nbsync -- move NetBox inventory in and out of CSV files
#[derive(Debug, Parser)]
#[command(
    name = "nbsync",
    version,
    about = "Import and export NetBox inventory as CSV",
    long_about = "Bulk-load a directory of CSV/TSV files into NetBox, or snapshot a NetBox\n\
        instance into a directory of CSV files that imports back cleanly.\n\n\
        File names pick the collection and order: 1_manufacturers.csv runs\n\
        before 4_devices.csv. Re-running an import is safe.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// NetBox URL (e.g. https://netbox.example.com)
    #[arg(long, short = 'u', env = "NETBOX_URL", global = true)]
    pub url: Option<String>,

    /// NetBox API token
    #[arg(long, env = "NETBOX_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Settings file (default: ./nbsync.toml, then the platform config dir)
    #[arg(long, short = 'c', env = "NBSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format for the run summary
    #[arg(
        long,
        short = 'o',
        env = "NBSYNC_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
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

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a directory of CSV/TSV files into NetBox
    #[command(alias = "imp")]
    Import(ImportArgs),

    /// Export NetBox inventory into a timestamped snapshot directory
    #[command(alias = "exp")]
    Export(ExportArgs),

    /// Inspect the resolved settings
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Directory holding the input files (searched recursively)
    pub dir: PathBuf,

    /// Update IP addresses matched on (address, VRF) instead of skipping them
    #[arg(long)]
    pub ip_upsert: bool,

    /// Import *cables* files (ignored by default)
    #[arg(long)]
    pub with_cables: bool,

    /// Consecutive connection failures tolerated before giving up
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_failures: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Directory the snapshot directory is created in
    #[arg(default_value = ".")]
    pub base_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved settings (token redacted)
    Show,

    /// Print the settings file path in effect
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
