use crate::core::io::job;
use crate::core::io::pdb::PdbFile;
use crate::core::models::molecule::Molecule;
use crate::core::models::plan::PackingPlan;
use crate::core::models::structure::Structure;
use crate::engine::config::PackConfig;
use crate::engine::error::EngineError;
use crate::engine::executor::{ExecutionReport, ExecutionRequest, Executor};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reconcile;
use crate::engine::sizing;
use crate::engine::source::ChemistrySource;
use tracing::{info, instrument, warn};

/// The products of a completed packing run.
#[derive(Debug, Clone)]
pub struct PackOutcome {
    /// The resolved plan the tool was asked to realize.
    pub plan: PackingPlan,
    /// The packed system with topology and cell reattached.
    pub structure: Structure,
}

/// Runs a complete packing: resolve, size, pack, reconcile.
#[instrument(skip_all, name = "pack_workflow")]
pub fn run(
    config: &PackConfig,
    source: &dyn ChemistrySource,
    executor: &dyn Executor,
    reporter: &ProgressReporter,
) -> Result<PackOutcome, EngineError> {
    // === Phase 1: Resolve molecule specifications ===
    reporter.report(Progress::PhaseStart {
        name: "Resolving molecules",
    });
    info!(
        species = config.species.len(),
        tool = %config.tool,
        "Starting packing workflow."
    );
    let molecules = resolve_molecules(config, source, reporter)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Size the region and fix the composition ===
    reporter.report(Progress::PhaseStart { name: "Sizing" });
    let plan = plan(config, &molecules)?;
    reporter.report(Progress::PhaseFinish);
    reporter.report(Progress::Message(plan.sizing_sentence()));

    // === Phase 3: Run the packing tool ===
    reporter.report(Progress::PhaseStart { name: "Packing" });
    reporter.report(Progress::StatusUpdate {
        text: format!("running {}", config.tool),
    });
    let packed_text = run_tool(config, &plan, executor)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Reconcile the output into a structure ===
    reporter.report(Progress::PhaseStart {
        name: "Reconciling",
    });
    let packed = PdbFile::read_str(&packed_text)?;
    let structure = reconcile::rebuild_structure(&plan, &packed)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        atoms = structure.atom_count(),
        molecules = plan.totals.molecules,
        "Packing workflow complete."
    );
    Ok(PackOutcome { plan, structure })
}

/// Resolves and sizes without touching the external tool.
///
/// This is the dry-run entry point: everything up to and including the
/// finished [`PackingPlan`], with no scratch files and no process spawn.
#[instrument(skip_all, name = "plan_workflow")]
pub fn plan(config: &PackConfig, molecules: &[Molecule]) -> Result<PackingPlan, EngineError> {
    let plan = sizing::resolve_plan(config, molecules)?;
    info!("{}", plan.sizing_sentence());
    Ok(plan)
}

/// Resolves every molecule spec through the chemistry source.
pub fn resolve_molecules(
    config: &PackConfig,
    source: &dyn ChemistrySource,
    reporter: &ProgressReporter,
) -> Result<Vec<Molecule>, EngineError> {
    reporter.report(Progress::TaskStart {
        total_steps: config.species.len() as u64,
    });
    let mut molecules = Vec::with_capacity(config.species.len());
    for spec in &config.species {
        let molecule = source.resolve(spec)?;
        info!(
            label = %molecule.label,
            atoms = molecule.atom_count(),
            "Resolved molecule specification."
        );
        molecules.push(molecule);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(molecules)
}

fn run_tool(
    config: &PackConfig,
    plan: &PackingPlan,
    executor: &dyn Executor,
) -> Result<String, EngineError> {
    let job = job::assemble(plan, config.seed)?;
    let output_file = job.output_file.clone();
    let request = ExecutionRequest::from_job(config.tool.clone(), job);
    info!(
        program = %request.program,
        files = request.files.len(),
        "Invoking the packing tool."
    );

    let report = executor.run(&request)?;
    if !report.success {
        warn!(stderr = %report.stderr.trim(), "Packing tool reported failure.");
        return Err(EngineError::Execution {
            program: request.program,
            detail: failure_detail(&report),
        });
    }
    match report.files.get(&output_file) {
        Some(text) => Ok(text.clone()),
        None => Err(EngineError::Execution {
            program: request.program,
            detail: format!("no '{output_file}' was produced"),
        }),
    }
}

/// Digs the most useful line out of a failed run.
///
/// Packmol reports problems on stdout, so the last line mentioning
/// ERROR wins; the captured stderr is the fallback.
fn failure_detail(report: &ExecutionReport) -> String {
    if let Some(line) = report.stdout.lines().rev().find(|l| l.contains("ERROR")) {
        return format!("exited with a failure status: {}", line.trim());
    }
    let stderr = report.stderr.trim();
    if stderr.is_empty() {
        "exited with a failure status".to_string()
    } else {
        format!("exited with a failure status: {stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::job::{CONTROL_FILE, OUTPUT_FILE};
    use crate::core::models::molecule::{MoleculeDefinition, MoleculeSpec};
    use crate::core::models::region::{RegionExtent, Shape};
    use crate::engine::config::{AmountSpec, DimensionSpec, PackConfigBuilder};
    use nalgebra::Point3;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct StubSource;

    impl ChemistrySource for StubSource {
        fn resolve(&self, spec: &MoleculeSpec) -> Result<Molecule, EngineError> {
            match &spec.definition {
                MoleculeDefinition::Smiles(s) if s == "[Ar]" => Molecule::new(
                    "argon",
                    vec!["Ar".to_string()],
                    vec![Point3::origin()],
                    vec![],
                )
                .map_err(|e| EngineError::Config(e.to_string())),
                other => Err(EngineError::Config(format!("unknown molecule {other}"))),
            }
        }
    }

    struct CannedExecutor {
        report: ExecutionReport,
        seen: Mutex<Option<ExecutionRequest>>,
    }

    impl CannedExecutor {
        fn new(report: ExecutionReport) -> Self {
            Self {
                report,
                seen: Mutex::new(None),
            }
        }
    }

    impl Executor for CannedExecutor {
        fn run(&self, request: &ExecutionRequest) -> Result<ExecutionReport, EngineError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(self.report.clone())
        }
    }

    fn argon_config() -> PackConfig {
        PackConfigBuilder::new()
            .shape(Shape::Cubic)
            .dimensions(DimensionSpec::Explicit(RegionExtent::Cube { edge: 20.0 }))
            .amount(AmountSpec::RoundMolecules { molecules: 3.0 })
            .molecule(MoleculeSpec::fluid(
                MoleculeDefinition::Smiles("[Ar]".into()),
                1.0,
            ))
            .build()
            .unwrap()
    }

    fn request_seen(executor: &CannedExecutor) -> ExecutionRequest {
        executor.seen.lock().unwrap().clone().unwrap()
    }

    /// What a well-behaved packer would write for three argon atoms.
    fn packed_argon_text() -> String {
        let mut packed = Structure::new();
        packed.add_atom("Ar", Point3::new(2.0, 2.0, 2.0));
        packed.add_atom("Ar", Point3::new(10.0, 10.0, 10.0));
        packed.add_atom("Ar", Point3::new(17.5, 17.5, 17.5));
        PdbFile::write_string(&packed).unwrap()
    }

    #[test]
    fn test_run_packs_and_reconciles() {
        let mut files = BTreeMap::new();
        files.insert(OUTPUT_FILE.to_string(), packed_argon_text());
        let executor = CannedExecutor::new(ExecutionReport {
            success: true,
            files,
            ..Default::default()
        });

        let outcome = run(
            &argon_config(),
            &StubSource,
            &executor,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(outcome.plan.totals.molecules, 3);
        assert_eq!(outcome.structure.atom_count(), 3);
        assert_eq!(outcome.structure.coordinates()[2].x, 17.5);

        let request = request_seen(&executor);
        assert_eq!(request.program, "packmol");
        assert_eq!(request.stdin_file, CONTROL_FILE);
        assert!(request.files[CONTROL_FILE].contains("inside cube"));
        assert!(request.files.contains_key("input_1.pdb"));
    }

    #[test]
    fn test_run_surfaces_tool_failure_with_the_error_line() {
        let executor = CannedExecutor::new(ExecutionReport {
            success: false,
            stdout: "packing...\nERROR: Packing could not converge.\n".to_string(),
            ..Default::default()
        });

        match run(
            &argon_config(),
            &StubSource,
            &executor,
            &ProgressReporter::new(),
        ) {
            Err(EngineError::Execution { program, detail }) => {
                assert_eq!(program, "packmol");
                assert!(detail.contains("could not converge"), "{detail}");
            }
            other => panic!("expected an execution error, got {other:?}"),
        }
    }

    #[test]
    fn test_run_fails_when_the_output_file_is_missing() {
        let executor = CannedExecutor::new(ExecutionReport {
            success: true,
            ..Default::default()
        });

        match run(
            &argon_config(),
            &StubSource,
            &executor,
            &ProgressReporter::new(),
        ) {
            Err(EngineError::Execution { detail, .. }) => {
                assert!(detail.contains(OUTPUT_FILE), "{detail}");
            }
            other => panic!("expected an execution error, got {other:?}"),
        }
    }

    #[test]
    fn test_run_propagates_source_errors() {
        let config = PackConfigBuilder::new()
            .shape(Shape::Cubic)
            .dimensions(DimensionSpec::Explicit(RegionExtent::Cube { edge: 20.0 }))
            .amount(AmountSpec::RoundMolecules { molecules: 3.0 })
            .molecule(MoleculeSpec::fluid(
                MoleculeDefinition::Smiles("c1ccccc1".into()),
                1.0,
            ))
            .build()
            .unwrap();
        let executor = CannedExecutor::new(ExecutionReport::default());

        assert!(matches!(
            run(&config, &StubSource, &executor, &ProgressReporter::new()),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_run_reports_phases_in_order() {
        let mut files = BTreeMap::new();
        files.insert(OUTPUT_FILE.to_string(), packed_argon_text());
        let executor = CannedExecutor::new(ExecutionReport {
            success: true,
            files,
            ..Default::default()
        });

        let phases: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
        let messages: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::PhaseStart { name } => phases.lock().unwrap().push(name),
            Progress::Message(text) => messages.lock().unwrap().push(text),
            _ => {}
        }));

        run(&argon_config(), &StubSource, &executor, &reporter).unwrap();
        drop(reporter);

        assert_eq!(
            phases.into_inner().unwrap(),
            vec!["Resolving molecules", "Sizing", "Packing", "Reconciling"]
        );
        let messages = messages.into_inner().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("3 molecules"), "{}", messages[0]);
    }

    #[test]
    fn test_plan_stops_before_the_tool() {
        let molecule = StubSource
            .resolve(&MoleculeSpec::fluid(
                MoleculeDefinition::Smiles("[Ar]".into()),
                1.0,
            ))
            .unwrap();
        let plan = plan(&argon_config(), &[molecule]).unwrap();
        assert_eq!(plan.totals.molecules, 3);
        assert_eq!(plan.region.volume(), 8000.0);
    }
}
