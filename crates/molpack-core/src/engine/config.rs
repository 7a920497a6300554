use crate::core::models::molecule::MoleculeSpec;
use crate::core::models::region::{RegionExtent, Shape};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Packing tolerance and periodic boundary gap applied when none is given.
pub const DEFAULT_GAP: f64 = 2.0;

/// Program invoked when no packing tool is named.
pub const DEFAULT_TOOL: &str = "packmol";

/// How the region's lengths are decided.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionSpec {
    /// Lengths given directly; read as the nominal cell when periodic.
    Explicit(RegionExtent),
    /// Lengths derived from a target volume in cubic angstrom. The
    /// aspect ratio only matters for rectangular regions and defaults
    /// to a cube.
    FromVolume { volume: f64, aspect: Option<[f64; 3]> },
    /// Lengths derived from the solute's extent plus a shell of fluid
    /// `thickness` angstrom thick on every side.
    FromSoluteDimensions { thickness: f64 },
    /// Volume derived from the fluid mass at a target density in g/mL.
    FromDensity { density: f64 },
    /// Volume derived from the ideal-gas law at `pressure` bar and
    /// `temperature` kelvin.
    FromIdealGas { pressure: f64, temperature: f64 },
}

/// How the number of fluid molecules is decided.
#[derive(Debug, Clone, PartialEq)]
pub enum AmountSpec {
    /// Come as close to a target total atom count as rounding allows.
    RoundAtoms { atoms: f64 },
    /// Come as close to a target total molecule count as rounding allows.
    RoundMolecules { molecules: f64 },
    /// Fill the region's volume to a target density in g/mL.
    UseDensity { density: f64 },
    /// Fill the region's volume per the ideal-gas law (bar, kelvin).
    UseIdealGas { pressure: f64, temperature: f64 },
}

/// A complete packing request.
///
/// Built through [`PackConfigBuilder`]; the dimension and amount
/// specifications must be independent of each other, which the sizing
/// resolver checks when the plan is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PackConfig {
    pub shape: Shape,
    pub periodic: bool,
    /// Tolerance between packed molecules, and the boundary gap of a
    /// periodic cell, in angstrom.
    pub gap: f64,
    pub dimensions: DimensionSpec,
    pub amount: AmountSpec,
    /// Requested species, in caller order.
    pub species: Vec<MoleculeSpec>,
    /// Name or path of the packing executable.
    pub tool: String,
    /// Seed forwarded to the packer for reproducible layouts.
    pub seed: Option<i64>,
}

#[derive(Default)]
pub struct PackConfigBuilder {
    shape: Option<Shape>,
    periodic: Option<bool>,
    gap: Option<f64>,
    dimensions: Option<DimensionSpec>,
    amount: Option<AmountSpec>,
    species: Vec<MoleculeSpec>,
    tool: Option<String>,
    seed: Option<i64>,
}

impl PackConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }
    pub fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = Some(periodic);
        self
    }
    pub fn gap(mut self, gap: f64) -> Self {
        self.gap = Some(gap);
        self
    }
    pub fn dimensions(mut self, spec: DimensionSpec) -> Self {
        self.dimensions = Some(spec);
        self
    }
    pub fn amount(mut self, spec: AmountSpec) -> Self {
        self.amount = Some(spec);
        self
    }
    /// Replaces the species list wholesale.
    pub fn species(mut self, species: Vec<MoleculeSpec>) -> Self {
        self.species = species;
        self
    }
    /// Appends one species to the list.
    pub fn molecule(mut self, spec: MoleculeSpec) -> Self {
        self.species.push(spec);
        self
    }
    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<PackConfig, ConfigError> {
        Ok(PackConfig {
            shape: self.shape.ok_or(ConfigError::MissingParameter("shape"))?,
            periodic: self.periodic.unwrap_or(false),
            gap: self.gap.unwrap_or(DEFAULT_GAP),
            dimensions: self
                .dimensions
                .ok_or(ConfigError::MissingParameter("dimensions"))?,
            amount: self.amount.ok_or(ConfigError::MissingParameter("amount"))?,
            species: self.species,
            tool: self.tool.unwrap_or_else(|| DEFAULT_TOOL.to_string()),
            seed: self.seed,
        })
    }
}
