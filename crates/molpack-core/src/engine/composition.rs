//! Stoichiometry of the mixture: validation of the requested species and
//! the conversion of relative ratios into integer copy counts.

use super::error::EngineError;
use crate::core::models::molecule::Role;
use crate::core::utils::constants::AVOGADRO;

/// The sizing-relevant numbers of one requested species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesTerms {
    pub role: Role,
    pub ratio: f64,
    pub atom_count: usize,
    pub molar_mass: f64,
}

impl SpeciesTerms {
    pub fn new(role: Role, ratio: f64, atom_count: usize, molar_mass: f64) -> Self {
        Self {
            role,
            ratio,
            atom_count,
            molar_mass,
        }
    }

    pub fn is_fluid(&self) -> bool {
        self.role == Role::Fluid
    }
}

/// Atoms, molecules and mass (gram) contributed by a slice of the mixture.
///
/// For [`fluid_unit`] the values are per unit of scale, where one unit is
/// one formula unit of the requested ratios. For [`solute_share`] they
/// are the absolute contribution of the single solute copy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MixtureShare {
    pub atoms: f64,
    pub molecules: f64,
    pub mass: f64,
}

/// Integer copies per species, in input order, plus the totals they imply.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub copies: Vec<usize>,
    pub molecules: usize,
    pub atoms: usize,
    /// Total mass in gram.
    pub mass: f64,
}

/// Checks the structural rules of a species list before any sizing
/// arithmetic runs against it.
pub fn validate(species: &[SpeciesTerms]) -> Result<(), EngineError> {
    if species.is_empty() {
        return Err(EngineError::EmptyInput(
            "no molecules were specified".to_string(),
        ));
    }

    let solutes = species.iter().filter(|t| t.role == Role::Solute).count();
    if solutes > 1 {
        return Err(EngineError::Config(format!(
            "at most one solute is allowed, got {solutes}"
        )));
    }

    for (index, terms) in species.iter().enumerate() {
        if terms.atom_count == 0 {
            return Err(EngineError::EmptyInput(format!(
                "species {} resolved to zero atoms",
                index + 1
            )));
        }
        if !terms.ratio.is_finite() || terms.ratio < 0.0 {
            return Err(EngineError::Config(format!(
                "ratio of species {} must be a non-negative finite number, got {}",
                index + 1,
                terms.ratio
            )));
        }
    }

    let fluids: Vec<&SpeciesTerms> = species.iter().filter(|t| t.is_fluid()).collect();
    if fluids.is_empty() {
        return Err(EngineError::EmptyInput(
            "no fluid species to pack".to_string(),
        ));
    }
    if fluids.iter().map(|t| t.ratio).sum::<f64>() <= 0.0 {
        return Err(EngineError::Config(
            "fluid ratios must include a positive value".to_string(),
        ));
    }

    Ok(())
}

/// Contribution of one formula unit of the fluid mixture.
pub fn fluid_unit(species: &[SpeciesTerms]) -> MixtureShare {
    let mut unit = MixtureShare::default();
    for terms in species.iter().filter(|t| t.is_fluid()) {
        unit.atoms += terms.ratio * terms.atom_count as f64;
        unit.molecules += terms.ratio;
        unit.mass += terms.ratio * terms.molar_mass / AVOGADRO;
    }
    unit
}

/// Absolute contribution of the solute, zero when there is none.
pub fn solute_share(species: &[SpeciesTerms]) -> MixtureShare {
    let mut share = MixtureShare::default();
    for terms in species.iter().filter(|t| t.role == Role::Solute) {
        share.atoms += terms.atom_count as f64;
        share.molecules += 1.0;
        share.mass += terms.molar_mass / AVOGADRO;
    }
    share
}

/// Turns a fluid scale into integer copies.
///
/// Fluid copies are `round(scale * ratio)`, clamped at zero. A solute
/// always gets exactly one copy. If rounding zeroes out every fluid, the
/// fluid with the largest requested ratio is bumped to a single copy;
/// ties go to the earliest species in input order.
pub fn resolve_copies(scale: f64, species: &[SpeciesTerms]) -> Composition {
    let mut copies = Vec::with_capacity(species.len());
    for terms in species {
        let n = match terms.role {
            Role::Solute => 1,
            Role::Fluid => {
                let raw = (scale * terms.ratio).round();
                if raw > 0.0 { raw as usize } else { 0 }
            }
        };
        copies.push(n);
    }

    let fluid_total: usize = species
        .iter()
        .zip(&copies)
        .filter(|(t, _)| t.is_fluid())
        .map(|(_, &c)| c)
        .sum();
    if fluid_total == 0 {
        let mut best: Option<(usize, f64)> = None;
        for (index, terms) in species.iter().enumerate() {
            if terms.is_fluid() && best.is_none_or(|(_, ratio)| terms.ratio > ratio) {
                best = Some((index, terms.ratio));
            }
        }
        if let Some((index, _)) = best {
            copies[index] = 1;
        }
    }

    let mut molecules = 0usize;
    let mut atoms = 0usize;
    let mut mass = 0.0f64;
    for (terms, &n) in species.iter().zip(&copies) {
        molecules += n;
        atoms += n * terms.atom_count;
        mass += n as f64 * terms.molar_mass / AVOGADRO;
    }

    Composition {
        copies,
        molecules,
        atoms,
        mass,
    }
}
