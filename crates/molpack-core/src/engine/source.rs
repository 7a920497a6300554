//! The seam between packing and chemistry.
//!
//! The engine needs full molecules (elements, coordinates, bonds) but
//! only receives [`MoleculeSpec`]s naming them by SMILES or by a stored
//! configuration. A [`ChemistrySource`] closes that gap; the CLI wires
//! in one backed by the builtin template library and structure files,
//! and tests substitute fixed molecules.

use super::error::EngineError;
use crate::core::models::molecule::{Molecule, MoleculeSpec};

/// Resolves molecule specifications into concrete molecules.
pub trait ChemistrySource {
    /// Produces the molecule a spec refers to.
    ///
    /// # Errors
    ///
    /// Implementations return [`EngineError::Config`] when the spec
    /// names something the source does not know, and
    /// [`EngineError::Format`] when a referenced structure file cannot
    /// be read.
    fn resolve(&self, spec: &MoleculeSpec) -> Result<Molecule, EngineError>;
}
