use crate::cli::PackingOverrides;
use crate::error::{CliError, Result};
use molpack::core::models::molecule::{MoleculeDefinition, MoleculeSpec, Role};
use molpack::core::models::region::{RegionExtent, Shape};
use molpack::engine::config::{AmountSpec, DimensionSpec, PackConfig, PackConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialRegion {
    shape: Option<String>,
    periodic: Option<bool>,
    gap: Option<f64>,
    dimensions: Option<PartialDimensions>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", tag = "mode")]
enum PartialDimensions {
    Explicit {
        edge: Option<f64>,
        lengths: Option<[f64; 3]>,
        diameter: Option<f64>,
    },
    Volume {
        volume: f64,
        aspect: Option<[f64; 3]>,
    },
    Solute {
        thickness: f64,
    },
    Density {
        density: f64,
    },
    IdealGas {
        pressure: f64,
        temperature: f64,
    },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", tag = "mode")]
enum PartialAmount {
    Molecules { count: f64 },
    Atoms { count: f64 },
    Density { density: f64 },
    IdealGas { pressure: f64, temperature: f64 },
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialPacking {
    tool: Option<String>,
    seed: Option<i64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct PartialMolecule {
    role: Option<String>,
    smiles: Option<String>,
    name: Option<String>,
    file: Option<String>,
    ratio: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialPackConfig {
    region: Option<PartialRegion>,
    amount: Option<PartialAmount>,
    packing: Option<PartialPacking>,
    #[serde(rename = "molecule", default)]
    molecules: Vec<PartialMolecule>,
}

impl PartialPackConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading packing request from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, overrides: &PackingOverrides) -> Result<PackConfig> {
        self.apply_set_values(&overrides.set_values)?;

        let region = self.region.take().unwrap_or_default();
        let packing = self.packing.take().unwrap_or_default();

        let dimensions = region.dimensions.ok_or_else(|| {
            CliError::Config("`region.dimensions` section is required.".to_string())
        })?;
        let dimensions = convert_dimensions(&dimensions)?;

        let shape = match region.shape.as_deref() {
            Some(name) => Shape::from_str(name).map_err(|e| CliError::Config(e.to_string()))?,
            None => match &dimensions {
                DimensionSpec::Explicit(extent) => extent.shape(),
                _ => Shape::Cubic,
            },
        };

        let amount = self
            .amount
            .ok_or_else(|| CliError::Config("`amount` section is required.".to_string()))?;

        if self.molecules.is_empty() {
            return Err(CliError::Config(
                "At least one `[[molecule]]` entry is required.".to_string(),
            ));
        }

        let mut builder = PackConfigBuilder::new()
            .shape(shape)
            .periodic(region.periodic.unwrap_or(false))
            .dimensions(dimensions)
            .amount(convert_amount(amount));

        if let Some(gap) = overrides.gap.or(region.gap) {
            builder = builder.gap(gap);
        }
        if let Some(tool) = overrides.tool.clone().or(packing.tool) {
            builder = builder.tool(tool);
        }
        if let Some(seed) = overrides.seed.or(packing.seed) {
            builder = builder.seed(seed);
        }

        for molecule in &self.molecules {
            builder = builder.molecule(convert_molecule(molecule)?);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        if set_values.is_empty() {
            return Ok(());
        }
        for kv_pair in set_values {
            let parts: Vec<_> = kv_pair.splitn(2, '=').collect();
            if parts.len() != 2 {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            }
            let key = parts[0];
            let value_str = parts[1];

            match key {
                "region.gap" => {
                    self.region.get_or_insert_with(Default::default).gap =
                        Some(value_str.parse().map_err(|_| {
                            CliError::Config(format!(
                                "Invalid float value for {}: {}",
                                key, value_str
                            ))
                        })?);
                }
                "region.periodic" => {
                    self.region.get_or_insert_with(Default::default).periodic =
                        Some(value_str.parse().map_err(|_| {
                            CliError::Config(format!(
                                "Invalid boolean value for {}: {}",
                                key, value_str
                            ))
                        })?);
                }
                "packing.seed" => {
                    self.packing.get_or_insert_with(Default::default).seed =
                        Some(value_str.parse().map_err(|_| {
                            CliError::Config(format!(
                                "Invalid integer value for {}: {}",
                                key, value_str
                            ))
                        })?);
                }
                "packing.tool" => {
                    self.packing.get_or_insert_with(Default::default).tool =
                        Some(value_str.to_string());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn convert_dimensions(partial: &PartialDimensions) -> Result<DimensionSpec> {
    match partial {
        PartialDimensions::Explicit {
            edge,
            lengths,
            diameter,
        } => {
            let extent = match (edge, lengths, diameter) {
                (Some(edge), None, None) => RegionExtent::Cube { edge: *edge },
                (None, Some(lengths), None) => RegionExtent::Box { lengths: *lengths },
                (None, None, Some(diameter)) => RegionExtent::Sphere {
                    diameter: *diameter,
                },
                _ => {
                    return Err(CliError::Config(
                        "Explicit dimensions need exactly one of `edge`, `lengths` or `diameter`."
                            .to_string(),
                    ));
                }
            };
            Ok(DimensionSpec::Explicit(extent))
        }
        PartialDimensions::Volume { volume, aspect } => Ok(DimensionSpec::FromVolume {
            volume: *volume,
            aspect: *aspect,
        }),
        PartialDimensions::Solute { thickness } => Ok(DimensionSpec::FromSoluteDimensions {
            thickness: *thickness,
        }),
        PartialDimensions::Density { density } => Ok(DimensionSpec::FromDensity {
            density: *density,
        }),
        PartialDimensions::IdealGas {
            pressure,
            temperature,
        } => Ok(DimensionSpec::FromIdealGas {
            pressure: *pressure,
            temperature: *temperature,
        }),
    }
}

fn convert_amount(partial: PartialAmount) -> AmountSpec {
    match partial {
        PartialAmount::Molecules { count } => AmountSpec::RoundMolecules { molecules: count },
        PartialAmount::Atoms { count } => AmountSpec::RoundAtoms { atoms: count },
        PartialAmount::Density { density } => AmountSpec::UseDensity { density },
        PartialAmount::IdealGas {
            pressure,
            temperature,
        } => AmountSpec::UseIdealGas {
            pressure,
            temperature,
        },
    }
}

fn convert_molecule(partial: &PartialMolecule) -> Result<MoleculeSpec> {
    let role = match partial.role.as_deref() {
        None => Role::Fluid,
        Some(name) => match name.to_lowercase().as_str() {
            "solute" => Role::Solute,
            "fluid" => Role::Fluid,
            other => {
                return Err(CliError::Config(format!(
                    "Invalid molecule role '{}', expected solute or fluid.",
                    other
                )));
            }
        },
    };

    let definition = match (&partial.smiles, &partial.name, &partial.file) {
        (Some(smiles), None, None) => MoleculeDefinition::Smiles(smiles.clone()),
        (None, Some(name), None) => MoleculeDefinition::Configuration(name.clone()),
        (None, None, Some(file)) => MoleculeDefinition::Configuration(file.clone()),
        _ => {
            return Err(CliError::Config(
                "Each [[molecule]] needs exactly one of `smiles`, `name` or `file`.".to_string(),
            ));
        }
    };

    Ok(MoleculeSpec {
        role,
        definition,
        ratio: partial.ratio.unwrap_or(1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use molpack::engine::config::{DEFAULT_GAP, DEFAULT_TOOL};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const WATER_BOX: &str = r#"
        [region]
        shape = "cubic"
        periodic = true

        [region.dimensions]
        mode = "explicit"
        edge = 30.0

        [amount]
        mode = "density"
        density = 0.9971

        [[molecule]]
        smiles = "O"
    "#;

    fn write_config_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn parse_pack_overrides(config_path: &Path, extra: &[&str]) -> PackingOverrides {
        let mut args = vec![
            "molpack".to_string(),
            "pack".to_string(),
            "-c".to_string(),
            config_path.to_str().unwrap().to_string(),
            "-o".to_string(),
            "out.pdb".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Pack(pack_args) => pack_args.overrides,
            _ => panic!("Expected 'pack' subcommand"),
        }
    }

    #[test]
    fn load_from_file_and_merge_with_defaults() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "water.toml", WATER_BOX);
        let overrides = parse_pack_overrides(&config_path, &[]);

        let config = PartialPackConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&overrides)
            .unwrap();

        assert_eq!(config.shape, Shape::Cubic);
        assert!(config.periodic);
        assert_eq!(config.gap, DEFAULT_GAP);
        assert_eq!(config.tool, DEFAULT_TOOL);
        assert!(config.seed.is_none());
        assert_eq!(
            config.dimensions,
            DimensionSpec::Explicit(RegionExtent::Cube { edge: 30.0 })
        );
        assert_eq!(config.amount, AmountSpec::UseDensity { density: 0.9971 });
        assert_eq!(config.species.len(), 1);
        assert_eq!(
            config.species[0].definition,
            MoleculeDefinition::Smiles("O".to_string())
        );
    }

    #[test]
    fn cli_args_override_file_values() {
        let content = r#"
            [region]
            gap = 1.5

            [region.dimensions]
            mode = "volume"
            volume = 27000.0

            [amount]
            mode = "molecules"
            count = 500

            [packing]
            tool = "packmol-classic"
            seed = 1

            [[molecule]]
            name = "water"
        "#;
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "override.toml", content);
        let overrides = parse_pack_overrides(
            &config_path,
            &["--tool", "packmol-gpu", "--seed", "42", "-g", "2.5"],
        );

        let config = PartialPackConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&overrides)
            .unwrap();

        assert_eq!(config.tool, "packmol-gpu");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.gap, 2.5);
    }

    #[test]
    fn set_values_override_file_and_defaults() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "set.toml", WATER_BOX);
        let overrides = parse_pack_overrides(
            &config_path,
            &[
                "-S",
                "packing.seed=7",
                "-S",
                "region.gap=3.0",
                "-S",
                "region.periodic=false",
            ],
        );

        let config = PartialPackConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&overrides)
            .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.gap, 3.0);
        assert!(!config.periodic);
    }

    #[test]
    fn unsupported_set_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "bad_set.toml", WATER_BOX);
        let overrides = parse_pack_overrides(&config_path, &["-S", "region.color=red"]);

        let result = PartialPackConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&overrides);

        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("region.color")));
    }

    #[test]
    fn shape_is_inferred_from_explicit_dimensions() {
        let content = r#"
            [region.dimensions]
            mode = "explicit"
            diameter = 25.0

            [amount]
            mode = "molecules"
            count = 100

            [[molecule]]
            name = "argon"
        "#;
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "sphere.toml", content);
        let overrides = parse_pack_overrides(&config_path, &[]);

        let config = PartialPackConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&overrides)
            .unwrap();

        assert_eq!(config.shape, Shape::Spherical);
        assert!(!config.periodic);
    }

    #[test]
    fn shape_defaults_to_cubic_for_derived_dimensions() {
        let content = r#"
            [region.dimensions]
            mode = "density"
            density = 0.9971

            [amount]
            mode = "molecules"
            count = 1000

            [[molecule]]
            smiles = "O"
        "#;
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "derived.toml", content);
        let overrides = parse_pack_overrides(&config_path, &[]);

        let config = PartialPackConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&overrides)
            .unwrap();

        assert_eq!(config.shape, Shape::Cubic);
        assert_eq!(
            config.dimensions,
            DimensionSpec::FromDensity { density: 0.9971 }
        );
    }

    #[test]
    fn molecule_entries_map_roles_and_definitions() {
        let content = r#"
            [region]
            shape = "cubic"

            [region.dimensions]
            mode = "solute"
            thickness = 10.0

            [amount]
            mode = "density"
            density = 0.9971

            [[molecule]]
            role = "solute"
            file = "structures/ligand.pdb"

            [[molecule]]
            smiles = "O"
            ratio = 3.0

            [[molecule]]
            name = "methanol"
        "#;
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "solvate.toml", content);
        let overrides = parse_pack_overrides(&config_path, &[]);

        let config = PartialPackConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&overrides)
            .unwrap();

        assert_eq!(config.species.len(), 3);
        assert_eq!(config.species[0].role, Role::Solute);
        assert_eq!(
            config.species[0].definition,
            MoleculeDefinition::Configuration("structures/ligand.pdb".to_string())
        );
        assert_eq!(config.species[1].role, Role::Fluid);
        assert_eq!(config.species[1].ratio, 3.0);
        assert_eq!(config.species[2].ratio, 1.0);
    }

    #[test]
    fn missing_required_sections_return_errors() {
        let dir = TempDir::new().unwrap();

        let no_dimensions = r#"
            [amount]
            mode = "molecules"
            count = 10

            [[molecule]]
            smiles = "O"
        "#;
        let path = write_config_file(&dir, "no_dims.toml", no_dimensions);
        let overrides = parse_pack_overrides(&path, &[]);
        let result = PartialPackConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&overrides);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("dimensions")));

        let no_amount = r#"
            [region.dimensions]
            mode = "explicit"
            edge = 20.0

            [[molecule]]
            smiles = "O"
        "#;
        let path = write_config_file(&dir, "no_amount.toml", no_amount);
        let result = PartialPackConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&overrides);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("amount")));

        let no_molecules = r#"
            [region.dimensions]
            mode = "explicit"
            edge = 20.0

            [amount]
            mode = "molecules"
            count = 10
        "#;
        let path = write_config_file(&dir, "no_molecules.toml", no_molecules);
        let result = PartialPackConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&overrides);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("molecule")));
    }

    #[test]
    fn ambiguous_molecule_definition_is_rejected() {
        let content = r#"
            [region.dimensions]
            mode = "explicit"
            edge = 20.0

            [amount]
            mode = "molecules"
            count = 10

            [[molecule]]
            smiles = "O"
            name = "water"
        "#;
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "ambiguous.toml", content);
        let overrides = parse_pack_overrides(&config_path, &[]);

        let result = PartialPackConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&overrides);

        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("exactly one")));
    }

    #[test]
    fn invalid_shape_name_is_rejected() {
        let content = r#"
            [region]
            shape = "dodecahedral"

            [region.dimensions]
            mode = "explicit"
            edge = 20.0

            [amount]
            mode = "molecules"
            count = 10

            [[molecule]]
            smiles = "O"
        "#;
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "bad_shape.toml", content);
        let overrides = parse_pack_overrides(&config_path, &[]);

        let result = PartialPackConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&overrides);

        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("dodecahedral")));
    }

    #[test]
    fn unknown_file_keys_are_rejected_at_parse_time() {
        let content = r#"
            [region]
            shpae = "cubic"

            [region.dimensions]
            mode = "explicit"
            edge = 20.0
        "#;
        let dir = TempDir::new().unwrap();
        let config_path = write_config_file(&dir, "typo.toml", content);

        assert!(matches!(
            PartialPackConfig::from_file(&config_path),
            Err(CliError::FileParsing { .. })
        ));
    }
}
