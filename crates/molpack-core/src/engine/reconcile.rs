//! Rebuilding structure from the packer's flat output.
//!
//! Packmol writes coordinates only. Everything else about the packed
//! system (which atom belongs to which molecule, bonding, forcefield
//! annotation, the periodic cell) is already known from the plan, so the
//! reconciliation walks the output in plan order and reattaches it. The
//! output must hold exactly the planned atoms in the planned order;
//! anything else means the tool did not do what it was asked and the
//! run is aborted rather than patched up.

use super::error::EngineError;
use crate::core::models::plan::PackingPlan;
use crate::core::models::structure::Structure;
use tracing::error;

/// Merges the packed coordinates with the plan's topology.
///
/// The atom count and per-atom elements are cross-checked against the
/// plan; the species order of the plan is the block order of the control
/// file, which is the order the packer emits. Forcefield annotations are
/// carried over only when every placed species defines them under the
/// same forcefield name, since a partial column is useless downstream.
pub(crate) fn rebuild_structure(
    plan: &PackingPlan,
    packed: &Structure,
) -> Result<Structure, EngineError> {
    let expected = plan.expected_atoms();
    if packed.atom_count() != expected {
        error!(
            expected,
            found = packed.atom_count(),
            "packed output atom count diverges from the plan"
        );
        return Err(EngineError::Internal(format!(
            "the packed output holds {} atoms but the plan expects {}",
            packed.atom_count(),
            expected
        )));
    }

    let symbols = packed.symbols();
    let coordinates = packed.coordinates();
    let mut out = Structure::new();
    let mut cursor = 0usize;
    for species in &plan.species {
        for _ in 0..species.copies {
            let base = out.atom_count();
            for element in &species.molecule.elements {
                if !symbols[cursor].eq_ignore_ascii_case(element) {
                    return Err(EngineError::Internal(format!(
                        "atom {} of the packed output is '{}' where the plan places '{}'",
                        cursor + 1,
                        symbols[cursor],
                        element
                    )));
                }
                out.add_atom(element.clone(), coordinates[cursor]);
                cursor += 1;
            }
            for bond in &species.molecule.bonds {
                let shifted = bond.shifted(base);
                out.add_bond(shifted.atom1, shifted.atom2, shifted.order)
                    .map_err(|e| EngineError::Internal(e.to_string()))?;
            }
        }
    }

    attach_forcefield_columns(plan, &mut out)?;

    if let Some(cell) = plan.region.cell_parameters() {
        out.set_periodic_cell(cell)
            .map_err(|e| EngineError::Internal(e.to_string()))?;
    }

    Ok(out)
}

fn attach_forcefield_columns(
    plan: &PackingPlan,
    out: &mut Structure,
) -> Result<(), EngineError> {
    let placed: Vec<_> = plan.species.iter().filter(|s| s.copies > 0).collect();
    let Some(first) = placed.first() else {
        return Ok(());
    };

    let mut names: Vec<&String> = first.molecule.forcefield.keys().collect();
    names.retain(|name| {
        placed
            .iter()
            .all(|s| s.molecule.forcefield.contains_key(*name))
    });

    for name in names {
        let mut types = Vec::with_capacity(out.atom_count());
        let mut charges = Vec::with_capacity(out.atom_count());
        // Empty charge vectors mean "no charges assigned" for that
        // species, which drops the charge column for the whole system.
        let mut charges_complete = true;
        for species in &placed {
            let tags = &species.molecule.forcefield[name];
            charges_complete &= !tags.partial_charges.is_empty();
            for _ in 0..species.copies {
                types.extend(tags.atom_types.iter().cloned());
                charges.extend(tags.partial_charges.iter().copied());
            }
        }

        out.set_atom_types(name.clone(), types)
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        if charges_complete {
            out.set_partial_charges(name.clone(), charges)
                .map_err(|e| EngineError::Internal(e.to_string()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::molecule::{
        ForcefieldTags, Molecule, MoleculeDefinition, MoleculeSpec,
    };
    use crate::core::models::plan::{PlanTotals, ResolvedSpecies};
    use crate::core::models::region::{Region, RegionExtent};
    use crate::core::models::topology::{Bond, BondOrder};
    use nalgebra::{Point3, Vector3};

    fn water() -> Molecule {
        Molecule::new(
            "water",
            vec!["O".to_string(), "H".to_string(), "H".to_string()],
            vec![
                Point3::new(0.0, 0.0, 0.1173),
                Point3::new(0.0, 0.7572, -0.4692),
                Point3::new(0.0, -0.7572, -0.4692),
            ],
            vec![
                Bond::new(0, 1, BondOrder::Single),
                Bond::new(0, 2, BondOrder::Single),
            ],
        )
        .unwrap()
    }

    fn plan_for(species: Vec<ResolvedSpecies>, region: Region) -> PackingPlan {
        let molecules = species.iter().map(|s| s.copies).sum();
        let atoms = species.iter().map(|s| s.atom_total()).sum();
        PackingPlan {
            region,
            species,
            totals: PlanTotals {
                molecules,
                atoms,
                mass: 0.0,
                density: 0.0,
            },
            gap: 2.0,
        }
    }

    fn fluid_species(molecule: Molecule, copies: usize) -> ResolvedSpecies {
        ResolvedSpecies {
            spec: MoleculeSpec::fluid(MoleculeDefinition::Smiles("O".into()), 1.0),
            molecule,
            copies,
            requested_percent: Some(100.0),
            actual_percent: Some(100.0),
        }
    }

    /// Two waters as the packer would emit them, shifted apart.
    fn packed_waters() -> Structure {
        let template = water();
        let mut packed = Structure::new();
        for shift in [0.0, 3.0] {
            for (symbol, position) in template.elements.iter().zip(&template.coordinates) {
                packed.add_atom(symbol.clone(), position + Vector3::new(shift, 0.0, 0.0));
            }
        }
        packed
    }

    #[test]
    fn test_rebuild_reattaches_bonds_per_copy() {
        let region = Region::non_periodic(RegionExtent::Cube { edge: 10.0 }).unwrap();
        let plan = plan_for(vec![fluid_species(water(), 2)], region);

        let structure = rebuild_structure(&plan, &packed_waters()).unwrap();
        assert_eq!(structure.atom_count(), 6);
        assert_eq!(structure.bonds().len(), 4);
        assert_eq!(structure.bonds()[2], Bond::new(3, 4, BondOrder::Single));
        assert_eq!(structure.bonds()[3], Bond::new(3, 5, BondOrder::Single));
        // Coordinates come from the packer, not the molecule definition.
        assert_eq!(structure.coordinates()[3].x, 3.0);
    }

    #[test]
    fn test_rebuild_rejects_an_atom_count_mismatch() {
        let region = Region::non_periodic(RegionExtent::Cube { edge: 10.0 }).unwrap();
        let plan = plan_for(vec![fluid_species(water(), 3)], region);

        match rebuild_structure(&plan, &packed_waters()) {
            Err(EngineError::Internal(message)) => {
                assert!(message.contains("6 atoms"), "{message}");
                assert!(message.contains("expects 9"), "{message}");
            }
            other => panic!("expected an internal error, got {other:?}"),
        }
    }

    #[test]
    fn test_rebuild_rejects_an_element_mismatch() {
        let region = Region::non_periodic(RegionExtent::Cube { edge: 10.0 }).unwrap();
        let plan = plan_for(vec![fluid_species(water(), 2)], region);

        let mut packed = Structure::new();
        packed.add_atom("N", Point3::origin());
        for _ in 0..5 {
            packed.add_atom("H", Point3::origin());
        }

        assert!(matches!(
            rebuild_structure(&plan, &packed),
            Err(EngineError::Internal(_))
        ));
    }

    #[test]
    fn test_rebuild_accepts_case_differences_in_elements() {
        let region = Region::non_periodic(RegionExtent::Cube { edge: 10.0 }).unwrap();
        let plan = plan_for(vec![fluid_species(water(), 2)], region);

        let mut packed = Structure::new();
        for _ in 0..2 {
            packed.add_atom("O", Point3::origin());
            packed.add_atom("h", Point3::origin());
            packed.add_atom("H", Point3::origin());
        }

        let structure = rebuild_structure(&plan, &packed).unwrap();
        // The rebuilt column keeps the plan's canonical symbols.
        assert_eq!(structure.symbols()[1], "H");
    }

    #[test]
    fn test_rebuild_applies_the_periodic_cell() {
        let region = Region::periodic(RegionExtent::Cube { edge: 12.0 }, 2.0).unwrap();
        let plan = plan_for(vec![fluid_species(water(), 2)], region);

        let structure = rebuild_structure(&plan, &packed_waters()).unwrap();
        assert_eq!(
            structure.cell(),
            Some([12.0, 12.0, 12.0, 90.0, 90.0, 90.0])
        );
        assert_eq!(structure.periodicity(), 3);
    }

    #[test]
    fn test_forcefield_columns_need_every_placed_species() {
        let mut tagged = water();
        tagged
            .add_forcefield_tags(
                "gaff",
                ForcefieldTags {
                    atom_types: vec!["ow".into(), "hw".into(), "hw".into()],
                    partial_charges: vec![-0.834, 0.417, 0.417],
                },
            )
            .unwrap();
        let untagged = water();
        let region = Region::non_periodic(RegionExtent::Cube { edge: 10.0 }).unwrap();

        // Both species tagged: the column survives with one entry per atom.
        let plan = plan_for(
            vec![
                fluid_species(tagged.clone(), 1),
                fluid_species(tagged.clone(), 1),
            ],
            region.clone(),
        );
        let structure = rebuild_structure(&plan, &packed_waters()).unwrap();
        assert_eq!(structure.atom_types()["gaff"].len(), 6);
        assert_eq!(structure.partial_charges()["gaff"][3], -0.834);

        // One species untagged: the column is dropped entirely.
        let plan = plan_for(
            vec![fluid_species(tagged, 1), fluid_species(untagged, 1)],
            region,
        );
        let structure = rebuild_structure(&plan, &packed_waters()).unwrap();
        assert!(structure.atom_types().is_empty());
    }

    #[test]
    fn test_charge_column_drops_when_one_species_has_no_charges() {
        let mut with_charges = water();
        with_charges
            .add_forcefield_tags(
                "gaff",
                ForcefieldTags {
                    atom_types: vec!["ow".into(), "hw".into(), "hw".into()],
                    partial_charges: vec![-0.834, 0.417, 0.417],
                },
            )
            .unwrap();
        let mut types_only = water();
        types_only
            .add_forcefield_tags(
                "gaff",
                ForcefieldTags {
                    atom_types: vec!["ow".into(), "hw".into(), "hw".into()],
                    partial_charges: vec![],
                },
            )
            .unwrap();

        let region = Region::non_periodic(RegionExtent::Cube { edge: 10.0 }).unwrap();
        let plan = plan_for(
            vec![fluid_species(with_charges, 1), fluid_species(types_only, 1)],
            region,
        );

        let structure = rebuild_structure(&plan, &packed_waters()).unwrap();
        assert_eq!(structure.atom_types()["gaff"].len(), 6);
        assert!(structure.partial_charges().is_empty());
    }

    #[test]
    fn test_zero_copy_species_are_skipped() {
        let region = Region::non_periodic(RegionExtent::Cube { edge: 10.0 }).unwrap();
        let plan = plan_for(
            vec![fluid_species(water(), 0), fluid_species(water(), 2)],
            region,
        );

        let structure = rebuild_structure(&plan, &packed_waters()).unwrap();
        assert_eq!(structure.atom_count(), 6);
    }
}
