use crate::error::{CliError, Result};
use molpack::core::io::pdb::PdbFile;
use molpack::core::models::molecule::{Molecule, MoleculeDefinition, MoleculeSpec};
use molpack::core::templates::TemplateLibrary;
use molpack::engine::error::EngineError;
use molpack::engine::source::ChemistrySource;
use std::path::Path;
use tracing::debug;

/// Resolves molecule specifications against the builtin template
/// library and structure files on disk.
///
/// SMILES strings and bare names are looked up in the library; a name
/// that contains a path separator or ends in `.pdb` is read from disk
/// instead.
pub struct BuiltinSource {
    templates: TemplateLibrary,
}

impl BuiltinSource {
    pub fn new() -> Result<Self> {
        let templates = TemplateLibrary::builtin()
            .map_err(|e| CliError::Data(format!("Failed to load builtin molecules: {}", e)))?;
        debug!("Loaded {} builtin molecule templates.", templates.len());
        Ok(Self { templates })
    }

    fn known_names(&self) -> String {
        self.templates.names().collect::<Vec<_>>().join(", ")
    }

    fn from_file(&self, path: &str) -> std::result::Result<Molecule, EngineError> {
        debug!(path, "Reading molecule from structure file.");
        let structure = PdbFile::read_from_path(path)?;
        let label = Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(path);
        Molecule::new(
            label,
            structure.symbols().to_vec(),
            structure.coordinates().to_vec(),
            structure.bonds().to_vec(),
        )
        .map_err(|e| EngineError::Config(format!("Structure file '{}' is unusable: {}", path, e)))
    }
}

impl ChemistrySource for BuiltinSource {
    fn resolve(&self, spec: &MoleculeSpec) -> std::result::Result<Molecule, EngineError> {
        match &spec.definition {
            MoleculeDefinition::Smiles(smiles) => self
                .templates
                .get_by_smiles(smiles)
                .map(|t| t.molecule.clone())
                .ok_or_else(|| {
                    EngineError::Config(format!(
                        "No builtin molecule matches SMILES '{}'. Known molecules: {}",
                        smiles,
                        self.known_names()
                    ))
                }),
            MoleculeDefinition::Configuration(name) => {
                if looks_like_path(name) {
                    self.from_file(name)
                } else {
                    self.templates
                        .get(name)
                        .map(|t| t.molecule.clone())
                        .ok_or_else(|| {
                            EngineError::Config(format!(
                                "No builtin molecule is named '{}'. Known molecules: {}",
                                name,
                                self.known_names()
                            ))
                        })
                }
            }
        }
    }
}

fn looks_like_path(value: &str) -> bool {
    value.contains(['/', '\\']) || value.to_lowercase().ends_with(".pdb")
}
