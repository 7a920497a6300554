mod cli;
mod commands;
mod config;
mod data;
mod error;
mod executor;
mod logging;
mod ui;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();

    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("🚀 molpack CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Parsed CLI arguments: {:?}", cli);

    let result = match cli.command {
        Commands::Pack(args) => {
            info!("Dispatching to 'pack' command.");
            commands::pack::run(args)
        }
        Commands::Plan(args) => {
            info!("Dispatching to 'plan' command.");
            commands::plan::run(args)
        }
    };

    match &result {
        Ok(_) => info!("✅ Command executed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }

    result
}
