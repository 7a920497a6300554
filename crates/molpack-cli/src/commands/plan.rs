use crate::cli::PlanArgs;
use crate::config::PartialPackConfig;
use crate::data::BuiltinSource;
use crate::error::Result;
use molpack::core::io::job;
use molpack::engine::error::EngineError;
use molpack::engine::progress::ProgressReporter;
use molpack::workflows;
use tracing::info;

/// Resolves and sizes a request without running the packing tool.
pub fn run(args: PlanArgs) -> Result<()> {
    let partial_config = PartialPackConfig::from_file(&args.config)?;
    let final_config = partial_config.merge_with_cli(&args.overrides)?;

    let source = BuiltinSource::new()?;
    let reporter = ProgressReporter::new();

    info!("Resolving molecules for the dry run...");
    let molecules = workflows::pack::resolve_molecules(&final_config, &source, &reporter)?;
    let plan = workflows::pack::plan(&final_config, &molecules)?;

    println!("{}", plan.sizing_sentence());
    println!();
    print!("{}", plan.summary_table());

    if args.show_input {
        let job = job::assemble(&plan, final_config.seed).map_err(EngineError::from)?;
        info!(
            "Rendered {} input file(s) for '{}'.",
            job.files.len(),
            final_config.tool
        );
        for (name, content) in &job.files {
            println!();
            println!("--- {} ---", name);
            print!("{}", content);
        }
    }

    Ok(())
}
