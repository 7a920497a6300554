//! Renders a resolved plan into the file set an external Packmol run
//! consumes: one control file plus one structure file per species.
//!
//! The control grammar is deliberately small: a global header (tolerance,
//! optional seed, output name, file type, connectivity) followed by one
//! `structure` block per species with a positive copy count. A solute is
//! pinned by `center`/`fixed` at the region center; fluids get an
//! `inside` constraint over the packing extent.

use crate::core::io::pdb::{PdbError, PdbFile};
use crate::core::models::molecule::Molecule;
use crate::core::models::plan::PackingPlan;
use crate::core::models::region::RegionExtent;
use crate::core::models::structure::Structure;
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the control file fed to the packer on stdin.
pub const CONTROL_FILE: &str = "input.inp";

/// Name the control file directs the packer to write its output to.
pub const OUTPUT_FILE: &str = "packmol.pdb";

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to render a structure file: {0}")]
    Pdb(#[from] PdbError),
    #[error("Plan is internally inconsistent: {0}")]
    Inconsistent(String),
}

/// The complete file set for one packing run, keyed by file name.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInput {
    pub files: BTreeMap<String, String>,
    pub control_file: String,
    pub output_file: String,
}

/// Renders the control file and per-species structure files for `plan`.
///
/// Species with zero copies produce no block and no file. The walk order
/// is the plan's species order, which reconciliation later mirrors.
pub fn assemble(plan: &PackingPlan, seed: Option<i64>) -> Result<JobInput, JobError> {
    let mut files = BTreeMap::new();
    let mut control = String::new();

    control.push_str(&format!("tolerance {:.4}\n", plan.gap));
    if let Some(seed) = seed {
        control.push_str(&format!("seed {seed}\n"));
    }
    control.push_str(&format!("output {OUTPUT_FILE}\n"));
    control.push_str("filetype pdb\n");
    control.push_str("connect yes\n");

    for (index, entry) in plan.species.iter().enumerate() {
        if entry.copies == 0 {
            continue;
        }
        let file_name = format!("input_{}.pdb", index + 1);
        files.insert(file_name.clone(), molecule_pdb(&entry.molecule)?);

        control.push('\n');
        control.push_str(&format!("structure {file_name}\n"));
        if entry.is_solute() {
            let center = plan.region.center();
            control.push_str("  number 1\n");
            control.push_str("  center\n");
            control.push_str(&format!(
                "  fixed {:.4} {:.4} {:.4} 0.0 0.0 0.0\n",
                center.x, center.y, center.z
            ));
        } else {
            control.push_str(&format!("  number {}\n", entry.copies));
            control.push_str(&format!("  {}\n", constraint_line(plan.region.extent())));
        }
        control.push_str("end structure\n");
    }
    control.push('\n');

    files.insert(CONTROL_FILE.to_string(), control);
    Ok(JobInput {
        files,
        control_file: CONTROL_FILE.to_string(),
        output_file: OUTPUT_FILE.to_string(),
    })
}

fn constraint_line(extent: &RegionExtent) -> String {
    match extent {
        RegionExtent::Cube { edge } => format!("inside cube 0.0 0.0 0.0 {edge:.4}"),
        RegionExtent::Box { lengths } => format!(
            "inside box 0.0 0.0 0.0 {:.4} {:.4} {:.4}",
            lengths[0], lengths[1], lengths[2]
        ),
        RegionExtent::Sphere { diameter } => {
            format!("inside sphere 0.0 0.0 0.0 {:.4}", diameter / 2.0)
        }
    }
}

fn molecule_pdb(molecule: &Molecule) -> Result<String, JobError> {
    let mut structure = Structure::new();
    for (symbol, position) in molecule.elements.iter().zip(&molecule.coordinates) {
        structure.add_atom(symbol.clone(), *position);
    }
    for bond in &molecule.bonds {
        structure
            .add_bond(bond.atom1, bond.atom2, bond.order)
            .map_err(|_| {
                JobError::Inconsistent(format!(
                    "molecule '{}' carries a bond past its own atoms",
                    molecule.label
                ))
            })?;
    }
    Ok(PdbFile::write_string(&structure)?)
}
