use crate::cli::PackArgs;
use crate::config::PartialPackConfig;
use crate::data::BuiltinSource;
use crate::error::{CliError, Result};
use crate::executor::LocalExecutor;
use crate::ui::CliProgressHandler;
use molpack::core::io::pdb::PdbFile;
use molpack::engine::progress::ProgressReporter;
use molpack::workflows;
use tracing::info;

pub fn run(args: PackArgs) -> Result<()> {
    let partial_config = PartialPackConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args.overrides)?;

    let source = BuiltinSource::new()?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.callback());

    println!("Starting packing...");
    info!("Invoking the core packing workflow...");

    let outcome = workflows::pack::run(&final_config, &source, &LocalExecutor, &reporter);
    drop(reporter);
    progress_handler.finish();
    let outcome = outcome?;

    info!(
        "Workflow finished: {} molecules, {} atoms.",
        outcome.plan.totals.molecules, outcome.plan.totals.atoms
    );

    println!();
    print!("{}", outcome.plan.summary_table());
    println!();

    info!("Writing packed structure to {:?}", &args.output);
    PdbFile::write_to_path(&outcome.structure, &args.output).map_err(|e| CliError::FileParsing {
        path: args.output.clone(),
        source: e.into(),
    })?;

    println!(
        "✓ Packed structure ({} atoms) written to: {}",
        outcome.structure.atom_count(),
        args.output.display()
    );

    Ok(())
}
