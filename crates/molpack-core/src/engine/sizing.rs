//! Region sizing and amount resolution.
//!
//! Two entry points live here. [`calculate`] is the abstract solver:
//! given any two independent sizing parameters and the per-unit numbers
//! of the mixture, it derives the full set of mutually consistent
//! figures (size, volume, counts, mass, density). [`resolve_plan`] is
//! the full pipeline: it checks a [`PackConfig`] for contradictions,
//! sizes the region (around the solute if one is present), runs the
//! amount resolution - twice for the density and ideal-gas dimension
//! modes, which need a bootstrap pass - and produces the final
//! [`PackingPlan`] with integer copy counts.

use super::composition::{self, Composition, MixtureShare, SpeciesTerms};
use super::config::{AmountSpec, DimensionSpec, PackConfig};
use super::error::EngineError;
use crate::core::models::molecule::{Molecule, Role};
use crate::core::models::plan::{PackingPlan, PlanTotals, ResolvedSpecies};
use crate::core::models::region::{Region, RegionExtent, Shape};
use crate::core::utils::constants::{
    AVOGADRO, CUBIC_ANGSTROM_PER_ML, ideal_gas_molecules, ideal_gas_volume,
};
use crate::core::utils::geometry::{self, BoundingBox, BoundingSphere};
use std::f64::consts::PI;
use tracing::debug;

/// One of the eight quantities that can pin down a packed system.
///
/// Exactly two parameters of different classes (geometric, amount,
/// intensive) determine everything else; two of the same class are
/// redundant and rejected as not independent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingParameter {
    /// Edge of the equivalent cube, angstrom.
    Size(f64),
    /// Volume in cubic angstrom.
    Volume(f64),
    /// Total molecule count.
    Molecules(f64),
    /// Total atom count.
    Atoms(f64),
    /// Amount of substance in mole.
    Moles(f64),
    /// Total mass in gram.
    Mass(f64),
    /// Density in g/mL.
    Density(f64),
    /// Ideal-gas state: pressure in bar, temperature in kelvin.
    IdealGas { pressure: f64, temperature: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParameterClass {
    Geometric,
    Amount,
    Intensive,
}

impl SizingParameter {
    fn class(&self) -> ParameterClass {
        match self {
            Self::Size(_) | Self::Volume(_) => ParameterClass::Geometric,
            Self::Molecules(_) | Self::Atoms(_) | Self::Moles(_) | Self::Mass(_) => {
                ParameterClass::Amount
            }
            Self::Density(_) | Self::IdealGas { .. } => ParameterClass::Intensive,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Size(_) => "size",
            Self::Volume(_) => "volume",
            Self::Molecules(_) => "number of molecules",
            Self::Atoms(_) => "number of atoms",
            Self::Moles(_) => "amount in moles",
            Self::Mass(_) => "mass",
            Self::Density(_) => "density",
            Self::IdealGas { .. } => "ideal-gas state",
        }
    }
}

/// The mutually consistent figures implied by two independent parameters.
///
/// `units` is the rounded number of formula units of the mixture;
/// `molecules`, `atoms` and `mass` follow from it, except in the
/// density-driven geometric case where mass is the exact density-times-
/// volume budget rather than the rounded-unit mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingSolution {
    pub size: f64,
    pub volume: f64,
    pub units: f64,
    pub molecules: f64,
    pub atoms: f64,
    pub mass: f64,
    pub density: f64,
}

/// Solves the sizing arithmetic for two independent parameters.
///
/// `unit` carries the per-formula-unit contribution of the mixture; for
/// a single species one unit is one molecule. Unit counts are rounded
/// half away from zero and bumped to one when they round to nothing.
pub fn calculate(
    a: SizingParameter,
    b: SizingParameter,
    unit: &MixtureShare,
) -> Result<SizingSolution, EngineError> {
    validate_parameter(&a)?;
    validate_parameter(&b)?;
    if !(unit.atoms > 0.0 && unit.molecules > 0.0 && unit.mass > 0.0) {
        return Err(EngineError::EmptyInput(
            "the mixture contributes no matter to size against".to_string(),
        ));
    }
    if a.class() == b.class() {
        return Err(EngineError::Config(format!(
            "{} and {} are not independent",
            a.name(),
            b.name()
        )));
    }

    let (first, second) = if class_rank(&a) <= class_rank(&b) {
        (a, b)
    } else {
        (b, a)
    };

    let (volume, units, mass, density) = match (first.class(), second.class()) {
        (ParameterClass::Geometric, ParameterClass::Amount) => {
            let volume = geometric_volume(&first);
            let units = round_units(amount_units(&second, unit)?);
            let mass = units * unit.mass;
            (volume, units, mass, density_of(mass, volume))
        }
        (ParameterClass::Geometric, ParameterClass::Intensive) => {
            let volume = geometric_volume(&first);
            match second {
                SizingParameter::Density(density) => {
                    // The mass budget is exact here; rounding shows up in
                    // the unit count, not in the reported mass or density.
                    let mass = density * volume / CUBIC_ANGSTROM_PER_ML;
                    let units = round_units(mass / unit.mass);
                    (volume, units, mass, density)
                }
                SizingParameter::IdealGas {
                    pressure,
                    temperature,
                } => {
                    let target = ideal_gas_molecules(volume, pressure, temperature);
                    let units = round_units(target / unit.molecules);
                    let mass = units * unit.mass;
                    (volume, units, mass, density_of(mass, volume))
                }
                _ => return Err(internal_ordering_error()),
            }
        }
        (ParameterClass::Amount, ParameterClass::Intensive) => {
            let units = round_units(amount_units(&first, unit)?);
            let mass = units * unit.mass;
            match second {
                SizingParameter::Density(density) => {
                    let volume = mass / density * CUBIC_ANGSTROM_PER_ML;
                    (volume, units, mass, density)
                }
                SizingParameter::IdealGas {
                    pressure,
                    temperature,
                } => {
                    let volume = ideal_gas_volume(units * unit.molecules, pressure, temperature);
                    (volume, units, mass, density_of(mass, volume))
                }
                _ => return Err(internal_ordering_error()),
            }
        }
        _ => return Err(internal_ordering_error()),
    };

    Ok(SizingSolution {
        size: volume.cbrt(),
        volume,
        units,
        molecules: units * unit.molecules,
        atoms: units * unit.atoms,
        mass,
        density,
    })
}

fn class_rank(parameter: &SizingParameter) -> u8 {
    match parameter.class() {
        ParameterClass::Geometric => 0,
        ParameterClass::Amount => 1,
        ParameterClass::Intensive => 2,
    }
}

fn geometric_volume(parameter: &SizingParameter) -> f64 {
    match parameter {
        SizingParameter::Size(edge) => edge.powi(3),
        SizingParameter::Volume(volume) => *volume,
        _ => f64::NAN,
    }
}

fn amount_units(parameter: &SizingParameter, unit: &MixtureShare) -> Result<f64, EngineError> {
    match parameter {
        SizingParameter::Molecules(n) => Ok(n / unit.molecules),
        SizingParameter::Atoms(n) => Ok(n / unit.atoms),
        SizingParameter::Moles(n) => Ok(n * AVOGADRO / unit.molecules),
        SizingParameter::Mass(g) => Ok(g / unit.mass),
        _ => Err(internal_ordering_error()),
    }
}

fn round_units(target: f64) -> f64 {
    let rounded = target.round();
    if rounded > 0.0 { rounded } else { 1.0 }
}

fn density_of(mass: f64, volume: f64) -> f64 {
    mass / (volume / CUBIC_ANGSTROM_PER_ML)
}

fn internal_ordering_error() -> EngineError {
    EngineError::Internal("sizing parameter classification broke".to_string())
}

fn validate_parameter(parameter: &SizingParameter) -> Result<(), EngineError> {
    let positive = |value: f64| -> Result<(), EngineError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(EngineError::Config(format!(
                "{} must be positive, got {value}",
                parameter.name()
            )))
        }
    };
    match parameter {
        SizingParameter::Size(v)
        | SizingParameter::Volume(v)
        | SizingParameter::Moles(v)
        | SizingParameter::Mass(v)
        | SizingParameter::Density(v) => positive(*v),
        SizingParameter::Molecules(v) | SizingParameter::Atoms(v) => {
            if v.is_finite() && *v >= 0.0 {
                Ok(())
            } else {
                Err(EngineError::Config(format!(
                    "{} must be non-negative, got {v}",
                    parameter.name()
                )))
            }
        }
        SizingParameter::IdealGas {
            pressure,
            temperature,
        } => {
            positive(*pressure)?;
            positive(*temperature)
        }
    }
}

/// Scale factor the copy resolution applies to the fluid ratios.
///
/// The volume argument only matters for the density and ideal-gas
/// modes, which is what lets the two-pass protocol inject a provisional
/// volume on its first pass.
pub fn amount_scale(
    amount: &AmountSpec,
    volume: f64,
    solute: &MixtureShare,
    unit: &MixtureShare,
) -> Result<f64, EngineError> {
    let scale = match amount {
        AmountSpec::RoundAtoms { atoms } => (atoms - solute.atoms) / unit.atoms,
        AmountSpec::RoundMolecules { molecules } => {
            (molecules - solute.molecules) / unit.molecules
        }
        AmountSpec::UseDensity { density } => {
            let target_mass = density * volume / CUBIC_ANGSTROM_PER_ML;
            (target_mass - solute.mass) / unit.mass
        }
        AmountSpec::UseIdealGas {
            pressure,
            temperature,
        } => {
            let target = ideal_gas_molecules(volume, *pressure, *temperature);
            (target - solute.molecules) / unit.molecules
        }
    };
    if !scale.is_finite() {
        return Err(EngineError::Internal(format!(
            "amount resolution produced a non-finite scale factor {scale}"
        )));
    }
    Ok(scale)
}

/// Resolves a packing request into a complete plan.
///
/// `molecules` must parallel `config.species` in order; the workflow
/// resolves specs through its chemistry source before calling in here.
pub fn resolve_plan(
    config: &PackConfig,
    molecules: &[Molecule],
) -> Result<PackingPlan, EngineError> {
    if config.species.len() != molecules.len() {
        return Err(EngineError::Internal(format!(
            "{} species specs but {} resolved molecules",
            config.species.len(),
            molecules.len()
        )));
    }

    let terms: Vec<SpeciesTerms> = config
        .species
        .iter()
        .zip(molecules)
        .map(|(spec, molecule)| {
            SpeciesTerms::new(
                spec.role,
                spec.ratio,
                molecule.atom_count(),
                molecule.molar_mass(),
            )
        })
        .collect();
    composition::validate(&terms)?;
    validate_config(config)?;

    let solute_index = config.species.iter().position(|s| s.role == Role::Solute);
    let solute_bounds = match solute_index {
        Some(index) => Some(solute_bounds(&molecules[index])?),
        None => None,
    };

    let unit = composition::fluid_unit(&terms);
    let solute = composition::solute_share(&terms);

    let (region, comp) = match &config.dimensions {
        DimensionSpec::Explicit(extent) => {
            let region = region_from_extent(config, *extent)?;
            let comp = resolve_amount(config, region.volume(), &solute, &unit, &terms)?;
            (region, comp)
        }
        DimensionSpec::FromVolume { volume, aspect } => {
            let region = region_from_volume(config, *volume, *aspect)?;
            let comp = resolve_amount(config, region.volume(), &solute, &unit, &terms)?;
            (region, comp)
        }
        DimensionSpec::FromSoluteDimensions { thickness } => {
            // Presence of the solute was checked by validate_config.
            let bounds = solute_bounds
                .as_ref()
                .ok_or_else(|| EngineError::Internal("solute bounds missing".to_string()))?;
            let region = region_from_solute(config, bounds, *thickness)?;
            let comp = resolve_amount(config, region.volume(), &solute, &unit, &terms)?;
            (region, comp)
        }
        DimensionSpec::FromDensity { density } => {
            // Bootstrap pass: provisional copies from the counted amount.
            let provisional = resolve_amount(config, 0.0, &solute, &unit, &terms)?;
            let volume = provisional.mass / density * CUBIC_ANGSTROM_PER_ML;
            debug!(
                provisional_molecules = provisional.molecules,
                volume, "bootstrapped volume from target density"
            );
            let region = region_from_volume(config, volume, None)?;
            // Final pass against the realized volume.
            let amount = AmountSpec::UseDensity { density: *density };
            let scale = amount_scale(&amount, region.volume(), &solute, &unit)?;
            (region, composition::resolve_copies(scale, &terms))
        }
        DimensionSpec::FromIdealGas {
            pressure,
            temperature,
        } => {
            let provisional = resolve_amount(config, 0.0, &solute, &unit, &terms)?;
            let volume = ideal_gas_volume(provisional.molecules as f64, *pressure, *temperature);
            debug!(
                provisional_molecules = provisional.molecules,
                volume, "bootstrapped volume from ideal-gas state"
            );
            let region = region_from_volume(config, volume, None)?;
            let amount = AmountSpec::UseIdealGas {
                pressure: *pressure,
                temperature: *temperature,
            };
            let scale = amount_scale(&amount, region.volume(), &solute, &unit)?;
            (region, composition::resolve_copies(scale, &terms))
        }
    };

    let region = match (&solute_bounds, config.shape) {
        (Some(bounds), shape) => {
            let solute_center = match shape {
                Shape::Spherical => bounds.sphere.center,
                _ => bounds.bbox.center(),
            };
            let offset = region.center() - solute_center;
            region.with_solute_offset(offset)
        }
        (None, _) => region,
    };

    let volume = region.volume();
    let totals = PlanTotals {
        molecules: comp.molecules,
        atoms: comp.atoms,
        mass: comp.mass,
        density: density_of(comp.mass, volume),
    };
    debug!(
        shape = %region.shape(),
        periodic = region.is_periodic(),
        volume,
        molecules = totals.molecules,
        atoms = totals.atoms,
        density = totals.density,
        "resolved packing plan"
    );

    let species = annotate_species(config, molecules, &terms, &comp);
    Ok(PackingPlan {
        region,
        species,
        totals,
        gap: config.gap,
    })
}

struct SoluteBounds {
    bbox: BoundingBox,
    sphere: BoundingSphere,
}

fn solute_bounds(molecule: &Molecule) -> Result<SoluteBounds, EngineError> {
    let bbox = geometry::bounding_box(&molecule.coordinates);
    let sphere = geometry::bounding_sphere(&molecule.coordinates);
    match (bbox, sphere) {
        (Some(bbox), Some(sphere)) => Ok(SoluteBounds { bbox, sphere }),
        _ => Err(EngineError::EmptyInput(format!(
            "solute '{}' has no coordinates to bound",
            molecule.label
        ))),
    }
}

fn resolve_amount(
    config: &PackConfig,
    volume: f64,
    solute: &MixtureShare,
    unit: &MixtureShare,
    terms: &[SpeciesTerms],
) -> Result<Composition, EngineError> {
    let scale = amount_scale(&config.amount, volume, solute, unit)?;
    Ok(composition::resolve_copies(scale, terms))
}

fn annotate_species(
    config: &PackConfig,
    molecules: &[Molecule],
    terms: &[SpeciesTerms],
    comp: &Composition,
) -> Vec<ResolvedSpecies> {
    let ratio_sum: f64 = terms.iter().filter(|t| t.is_fluid()).map(|t| t.ratio).sum();
    let fluid_copies: usize = terms
        .iter()
        .zip(&comp.copies)
        .filter(|(t, _)| t.is_fluid())
        .map(|(_, &c)| c)
        .sum();

    // Solute first; job assembly and reconciliation rely on this order.
    let mut order: Vec<usize> = (0..config.species.len()).collect();
    order.sort_by_key(|&i| config.species[i].role != Role::Solute);

    order
        .into_iter()
        .map(|i| {
            let fluid = terms[i].is_fluid();
            ResolvedSpecies {
                spec: config.species[i].clone(),
                molecule: molecules[i].clone(),
                copies: comp.copies[i],
                requested_percent: fluid.then(|| terms[i].ratio / ratio_sum * 100.0),
                actual_percent: fluid
                    .then(|| comp.copies[i] as f64 / fluid_copies as f64 * 100.0),
            }
        })
        .collect()
}

fn validate_config(config: &PackConfig) -> Result<(), EngineError> {
    if !config.gap.is_finite() || config.gap < 0.0 {
        return Err(EngineError::Config(format!(
            "gap must be a non-negative finite length, got {}",
            config.gap
        )));
    }
    if config.periodic && config.shape == Shape::Spherical {
        return Err(EngineError::Config(
            "spherical regions cannot be periodic".to_string(),
        ));
    }

    let positive = |label: &str, value: f64| -> Result<(), EngineError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(EngineError::Config(format!(
                "{label} must be positive, got {value}"
            )))
        }
    };

    match &config.dimensions {
        DimensionSpec::Explicit(extent) => {
            if extent.shape() != config.shape {
                return Err(EngineError::Config(format!(
                    "explicit {} lengths do not match the requested {} shape",
                    extent.shape(),
                    config.shape
                )));
            }
        }
        DimensionSpec::FromVolume { volume, aspect } => {
            positive("volume", *volume)?;
            if let Some(aspect) = aspect {
                if config.shape != Shape::Rectangular {
                    return Err(EngineError::Config(
                        "aspect ratios only apply to rectangular regions".to_string(),
                    ));
                }
                for value in aspect {
                    positive("aspect ratio", *value)?;
                }
            }
        }
        DimensionSpec::FromSoluteDimensions { thickness } => {
            positive("solvent thickness", *thickness)?;
            if !config.species.iter().any(|s| s.role == Role::Solute) {
                return Err(EngineError::Config(
                    "dimensions from the solute require a solute species".to_string(),
                ));
            }
        }
        DimensionSpec::FromDensity { density } => positive("density", *density)?,
        DimensionSpec::FromIdealGas {
            pressure,
            temperature,
        } => {
            positive("pressure", *pressure)?;
            positive("temperature", *temperature)?;
        }
    }

    match &config.amount {
        AmountSpec::RoundAtoms { atoms } => {
            if !atoms.is_finite() || *atoms < 0.0 {
                return Err(EngineError::Config(format!(
                    "target atom count must be non-negative, got {atoms}"
                )));
            }
        }
        AmountSpec::RoundMolecules { molecules } => {
            if !molecules.is_finite() || *molecules < 0.0 {
                return Err(EngineError::Config(format!(
                    "target molecule count must be non-negative, got {molecules}"
                )));
            }
        }
        AmountSpec::UseDensity { density } => positive("density", *density)?,
        AmountSpec::UseIdealGas {
            pressure,
            temperature,
        } => {
            positive("pressure", *pressure)?;
            positive("temperature", *temperature)?;
        }
    }

    // The intensive dimension modes consume the volume the amount is
    // supposed to produce, so the amount side must be a plain count.
    let dimension_intensive = matches!(
        config.dimensions,
        DimensionSpec::FromDensity { .. } | DimensionSpec::FromIdealGas { .. }
    );
    let amount_intensive = matches!(
        config.amount,
        AmountSpec::UseDensity { .. } | AmountSpec::UseIdealGas { .. }
    );
    if dimension_intensive && amount_intensive {
        return Err(EngineError::Config(format!(
            "'{}' dimensions and '{}' amount are not independent",
            dimension_name(&config.dimensions),
            amount_name(&config.amount)
        )));
    }

    Ok(())
}

fn dimension_name(spec: &DimensionSpec) -> &'static str {
    match spec {
        DimensionSpec::Explicit(_) => "explicit",
        DimensionSpec::FromVolume { .. } => "volume",
        DimensionSpec::FromSoluteDimensions { .. } => "solute dimensions",
        DimensionSpec::FromDensity { .. } => "density",
        DimensionSpec::FromIdealGas { .. } => "ideal gas",
    }
}

fn amount_name(spec: &AmountSpec) -> &'static str {
    match spec {
        AmountSpec::RoundAtoms { .. } => "atom count",
        AmountSpec::RoundMolecules { .. } => "molecule count",
        AmountSpec::UseDensity { .. } => "density",
        AmountSpec::UseIdealGas { .. } => "ideal gas",
    }
}

fn region_from_extent(config: &PackConfig, extent: RegionExtent) -> Result<Region, EngineError> {
    let region = if config.periodic {
        Region::periodic(extent, config.gap)
    } else {
        Region::non_periodic(extent)
    };
    region.map_err(|e| EngineError::Config(e.to_string()))
}

fn region_from_volume(
    config: &PackConfig,
    volume: f64,
    aspect: Option<[f64; 3]>,
) -> Result<Region, EngineError> {
    if !volume.is_finite() || volume <= 0.0 {
        return Err(EngineError::Config(format!(
            "derived volume must be positive, got {volume}"
        )));
    }
    let extent = match config.shape {
        Shape::Cubic => RegionExtent::Cube {
            edge: volume.cbrt(),
        },
        Shape::Rectangular => {
            let aspect = aspect.unwrap_or([1.0, 1.0, 1.0]);
            let factor = (volume / (aspect[0] * aspect[1] * aspect[2])).cbrt();
            RegionExtent::Box {
                lengths: [aspect[0] * factor, aspect[1] * factor, aspect[2] * factor],
            }
        }
        Shape::Spherical => RegionExtent::Sphere {
            diameter: 2.0 * (volume / (4.0 / 3.0 * PI)).cbrt(),
        },
    };
    region_from_extent(config, extent)
}

fn region_from_solute(
    config: &PackConfig,
    bounds: &SoluteBounds,
    thickness: f64,
) -> Result<Region, EngineError> {
    // Periodic cells take the thickness once as margin to the boundary
    // images; non-periodic regions pad both sides.
    let padding = if config.periodic {
        thickness
    } else {
        2.0 * thickness
    };
    let extent = match config.shape {
        Shape::Spherical => RegionExtent::Sphere {
            diameter: 2.0 * (bounds.sphere.radius + thickness),
        },
        Shape::Cubic => RegionExtent::Cube {
            edge: bounds.bbox.longest_side() + padding,
        },
        Shape::Rectangular => {
            let sides = bounds.bbox.sides();
            RegionExtent::Box {
                lengths: [sides.x + padding, sides.y + padding, sides.z + padding],
            }
        }
    };
    region_from_extent(config, extent)
}
