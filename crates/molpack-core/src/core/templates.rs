//! A small library of reference molecule geometries, loaded from TOML.
//!
//! The built-in set covers the fluids most packing runs reach for
//! (water, simple gases, methane). Additional template files with the
//! same schema can be parsed with [`TemplateLibrary::parse_str`] when a
//! caller wants to extend the set.

use crate::core::models::molecule::{Molecule, MoleculeError};
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

const BUILTIN_TEMPLATES: &str = include_str!("templates.toml");

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse template data: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Template '{name}' is invalid: {source}")]
    Invalid {
        name: String,
        #[source]
        source: MoleculeError,
    },
    #[error("Template '{name}' has an unrecognized bond order '{order}'")]
    BadBondOrder { name: String, order: String },
    #[error("Template '{name}' bond references atom {index} of {atoms}")]
    BadBondIndex {
        name: String,
        index: usize,
        atoms: usize,
    },
    #[error("Duplicate template name or alias '{0}'")]
    Duplicate(String),
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(rename = "molecule", default)]
    molecules: Vec<RawTemplate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTemplate {
    name: String,
    smiles: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    atoms: Vec<(String, f64, f64, f64)>,
    #[serde(default)]
    bonds: Vec<(usize, usize, String)>,
}

/// One named reference geometry.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub smiles: Option<String>,
    pub molecule: Molecule,
}

/// Templates indexed by name, alias and SMILES string.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
    by_name: HashMap<String, usize>,
    by_smiles: HashMap<String, usize>,
}

impl TemplateLibrary {
    /// Loads the templates embedded in the crate.
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::parse_str(BUILTIN_TEMPLATES)
    }

    /// Parses a template file in the same TOML schema as the built-in set.
    pub fn parse_str(text: &str) -> Result<Self, TemplateError> {
        let file: TemplateFile = toml::from_str(text)?;
        let mut library = Self {
            templates: Vec::with_capacity(file.molecules.len()),
            by_name: HashMap::new(),
            by_smiles: HashMap::new(),
        };

        for raw in file.molecules {
            let index = library.templates.len();
            let molecule = build_molecule(&raw)?;

            for key in std::iter::once(&raw.name).chain(raw.aliases.iter()) {
                let key = key.to_lowercase();
                if library.by_name.insert(key.clone(), index).is_some() {
                    return Err(TemplateError::Duplicate(key));
                }
            }
            if let Some(smiles) = &raw.smiles
                && library.by_smiles.insert(smiles.clone(), index).is_some()
            {
                return Err(TemplateError::Duplicate(smiles.clone()));
            }

            library.templates.push(Template {
                name: raw.name,
                smiles: raw.smiles,
                molecule,
            });
        }

        Ok(library)
    }

    /// Looks a template up by name or alias, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.templates[index])
    }

    /// Looks a template up by exact SMILES string.
    pub fn get_by_smiles(&self, smiles: &str) -> Option<&Template> {
        self.by_smiles
            .get(smiles)
            .map(|&index| &self.templates[index])
    }

    /// Template names in load order, for diagnostics.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn build_molecule(raw: &RawTemplate) -> Result<Molecule, TemplateError> {
    let mut elements = Vec::with_capacity(raw.atoms.len());
    let mut coordinates = Vec::with_capacity(raw.atoms.len());
    for (symbol, x, y, z) in &raw.atoms {
        elements.push(symbol.clone());
        coordinates.push(Point3::new(*x, *y, *z));
    }

    let mut bonds = Vec::with_capacity(raw.bonds.len());
    for (atom1, atom2, order) in &raw.bonds {
        let order = BondOrder::from_str(order).map_err(|_| TemplateError::BadBondOrder {
            name: raw.name.clone(),
            order: order.clone(),
        })?;
        let mut pair = [0usize; 2];
        for (slot, index) in pair.iter_mut().zip([atom1, atom2]) {
            *slot = index
                .checked_sub(1)
                .filter(|i| *i < raw.atoms.len())
                .ok_or_else(|| TemplateError::BadBondIndex {
                    name: raw.name.clone(),
                    index: *index,
                    atoms: raw.atoms.len(),
                })?;
        }
        bonds.push(Bond::new(pair[0], pair[1], order));
    }

    Molecule::new(&raw.name, elements, coordinates, bonds).map_err(|source| {
        TemplateError::Invalid {
            name: raw.name.clone(),
            source,
        }
    })
}
