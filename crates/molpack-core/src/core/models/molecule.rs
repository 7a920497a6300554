use super::topology::Bond;
use crate::core::utils::elements;
use nalgebra::Point3;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Role a species plays inside the packing region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A single copy, held fixed at the region center.
    Solute,
    /// Packed in bulk around the solute according to its ratio.
    Fluid,
}

/// Where the chemical definition of a species comes from.
///
/// The engine never interprets the payload itself; a
/// [`ChemistrySource`](crate::engine::source::ChemistrySource)
/// implementation turns it into a concrete [`Molecule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoleculeDefinition {
    /// A SMILES string, e.g. `"O"` for water.
    Smiles(String),
    /// A named configuration: a structure file path or a template name.
    Configuration(String),
}

impl fmt::Display for MoleculeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smiles(s) => write!(f, "smiles: {s}"),
            Self::Configuration(s) => write!(f, "configuration: {s}"),
        }
    }
}

/// One requested species: its role, its definition and its share of the
/// fluid mixture.
///
/// Ratios are relative weights, not percentages; `3.0` against `1.0`
/// requests a 3:1 mixture. The ratio of a solute is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeSpec {
    pub role: Role,
    pub definition: MoleculeDefinition,
    pub ratio: f64,
}

impl MoleculeSpec {
    pub fn solute(definition: MoleculeDefinition) -> Self {
        Self {
            role: Role::Solute,
            definition,
            ratio: 1.0,
        }
    }

    pub fn fluid(definition: MoleculeDefinition, ratio: f64) -> Self {
        Self {
            role: Role::Fluid,
            definition,
            ratio,
        }
    }
}

/// Per-atom annotations carried for one named forcefield.
///
/// `partial_charges` may be left empty when the forcefield assigns
/// types but no charges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForcefieldTags {
    pub atom_types: Vec<String>,
    pub partial_charges: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum MoleculeError {
    #[error("Unknown element symbol '{symbol}'")]
    UnknownElement { symbol: String },
    #[error("Molecule has {elements} elements but {coordinates} coordinates")]
    MismatchedCoordinates { elements: usize, coordinates: usize },
    #[error("Bond references atom index {index} but the molecule has {atoms} atoms")]
    BondOutOfRange { index: usize, atoms: usize },
    #[error("Forcefield '{forcefield}' supplies {actual} annotations for {expected} atoms")]
    TagLengthMismatch {
        forcefield: String,
        expected: usize,
        actual: usize,
    },
}

/// A fully resolved molecular species: elements, one reference geometry
/// and intramolecular bonds.
///
/// The element list is canonicalized at construction and the molar mass
/// is computed once from it, so downstream sizing arithmetic never has
/// to consult the element table again.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub label: String,
    pub elements: Vec<String>,
    pub coordinates: Vec<Point3<f64>>,
    pub bonds: Vec<Bond>,
    pub forcefield: BTreeMap<String, ForcefieldTags>,
    molar_mass: f64,
}

impl Molecule {
    /// Builds a molecule and derives its molar mass.
    ///
    /// # Arguments
    ///
    /// * `label` - Human-readable name used in reports and logs.
    /// * `elements` - Element symbols, one per atom, in atom order.
    /// * `coordinates` - Cartesian positions in angstrom, parallel to `elements`.
    /// * `bonds` - Intramolecular bonds over zero-based atom indices.
    ///
    /// # Errors
    ///
    /// Returns a [`MoleculeError`] if an element symbol is unknown, the
    /// element and coordinate lists disagree in length, or a bond refers
    /// to an atom that does not exist.
    pub fn new(
        label: impl Into<String>,
        elements: Vec<String>,
        coordinates: Vec<Point3<f64>>,
        bonds: Vec<Bond>,
    ) -> Result<Self, MoleculeError> {
        if elements.len() != coordinates.len() {
            return Err(MoleculeError::MismatchedCoordinates {
                elements: elements.len(),
                coordinates: coordinates.len(),
            });
        }

        let mut canonical = Vec::with_capacity(elements.len());
        let mut molar_mass = 0.0;
        for symbol in &elements {
            let canon = elements::canonical_symbol(symbol).ok_or_else(|| {
                MoleculeError::UnknownElement {
                    symbol: symbol.clone(),
                }
            })?;
            // canonical_symbol guarantees the mass lookup succeeds
            molar_mass += elements::atomic_mass(canon).unwrap_or(0.0);
            canonical.push(canon.to_string());
        }

        let atoms = canonical.len();
        for bond in &bonds {
            for index in [bond.atom1, bond.atom2] {
                if index >= atoms {
                    return Err(MoleculeError::BondOutOfRange { index, atoms });
                }
            }
        }

        Ok(Self {
            label: label.into(),
            elements: canonical,
            coordinates,
            bonds,
            forcefield: BTreeMap::new(),
            molar_mass,
        })
    }

    /// Attaches per-atom annotations for one named forcefield.
    ///
    /// # Errors
    ///
    /// Returns [`MoleculeError::TagLengthMismatch`] if the annotation
    /// vectors do not match the atom count. An empty charge vector is
    /// accepted and means "no charges assigned".
    pub fn add_forcefield_tags(
        &mut self,
        forcefield: impl Into<String>,
        tags: ForcefieldTags,
    ) -> Result<(), MoleculeError> {
        let forcefield = forcefield.into();
        let expected = self.atom_count();
        if tags.atom_types.len() != expected {
            return Err(MoleculeError::TagLengthMismatch {
                forcefield,
                expected,
                actual: tags.atom_types.len(),
            });
        }
        if !tags.partial_charges.is_empty() && tags.partial_charges.len() != expected {
            return Err(MoleculeError::TagLengthMismatch {
                forcefield,
                expected,
                actual: tags.partial_charges.len(),
            });
        }
        self.forcefield.insert(forcefield, tags);
        Ok(())
    }

    pub fn atom_count(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Molar mass in g/mol, summed over the element list at construction.
    pub fn molar_mass(&self) -> f64 {
        self.molar_mass
    }
}
