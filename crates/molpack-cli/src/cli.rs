use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "molpack CLI - A command-line interface for building packed molecular systems (fluid boxes, solvated solutes, periodic cells) with Packmol.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a packed system: size the region, run Packmol and write the result.
    Pack(PackArgs),
    /// Resolve and size a packing request without running Packmol.
    Plan(PlanArgs),
}

/// Arguments for the `pack` subcommand.
#[derive(Args, Debug)]
pub struct PackArgs {
    // --- Core Arguments ---
    /// Path to the packing request in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path for the output structure file (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub overrides: PackingOverrides,
}

/// Arguments for the `plan` subcommand.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the packing request in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Also print the Packmol input files the request would produce.
    #[arg(long)]
    pub show_input: bool,

    #[command(flatten)]
    pub overrides: PackingOverrides,
}

/// Overrides shared by every packing command.
#[derive(Args, Debug, Default)]
pub struct PackingOverrides {
    // --- Packing Overrides ---
    /// Override the packing executable (name on PATH or a full path).
    #[arg(long, value_name = "NAME_OR_PATH")]
    pub tool: Option<String>,

    /// Seed for the packing tool, for reproducible layouts.
    #[arg(long, value_name = "INT")]
    pub seed: Option<i64>,

    /// Override the tolerance gap between molecules, in angstrom.
    #[arg(short, long, value_name = "FLOAT")]
    pub gap: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S packing.seed=42
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
