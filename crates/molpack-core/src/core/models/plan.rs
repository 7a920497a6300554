use super::molecule::{Molecule, MoleculeSpec, Role};
use super::region::{Region, RegionExtent, Shape};

/// One species of the plan with its final copy count.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpecies {
    pub spec: MoleculeSpec,
    pub molecule: Molecule,
    pub copies: usize,
    /// Share of the fluid mixture requested via ratios; `None` for solutes.
    pub requested_percent: Option<f64>,
    /// Share actually achieved after rounding; `None` for solutes.
    pub actual_percent: Option<f64>,
}

impl ResolvedSpecies {
    pub fn is_solute(&self) -> bool {
        self.spec.role == Role::Solute
    }

    /// Atoms contributed by all copies of this species.
    pub fn atom_total(&self) -> usize {
        self.copies * self.molecule.atom_count()
    }
}

/// Aggregate figures for a resolved plan. Mass is in gram, density in g/mL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanTotals {
    pub molecules: usize,
    pub atoms: usize,
    pub mass: f64,
    pub density: f64,
}

/// A fully resolved packing run: the sized region, every species with its
/// copy count, and the aggregate totals.
///
/// Species are ordered solute first. Job assembly and output
/// reconciliation both walk this order, which is what keeps the atom
/// ranges of the packed output attributable to their species.
#[derive(Debug, Clone, PartialEq)]
pub struct PackingPlan {
    pub region: Region,
    pub species: Vec<ResolvedSpecies>,
    pub totals: PlanTotals,
    /// Packing tolerance in angstrom; doubles as the periodic boundary gap.
    pub gap: f64,
}

impl PackingPlan {
    /// Total atom count the packed output must come back with.
    pub fn expected_atoms(&self) -> usize {
        self.species.iter().map(ResolvedSpecies::atom_total).sum()
    }

    /// Fixed-width per-species table for reports and logs.
    pub fn summary_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<16} {:<28} {:>11} {:>8} {:>9}\n",
            "Species", "Definition", "Requested %", "Copies", "Actual %"
        ));
        for entry in &self.species {
            let requested = entry
                .requested_percent
                .map_or_else(|| "-".to_string(), |p| format!("{p:.2}"));
            let actual = entry
                .actual_percent
                .map_or_else(|| "-".to_string(), |p| format!("{p:.2}"));
            out.push_str(&format!(
                "{:<16} {:<28} {:>11} {:>8} {:>9}\n",
                entry.molecule.label,
                entry.spec.definition.to_string(),
                requested,
                entry.copies,
                actual
            ));
        }
        out.push_str(&format!(
            "{:<16} {:<28} {:>11} {:>8} {:>9}\n",
            "Total", "", "", self.totals.molecules, ""
        ));
        out
    }

    /// One-sentence description of the built system.
    pub fn sizing_sentence(&self) -> String {
        let kind = if self.region.is_periodic() {
            "periodic"
        } else {
            "non-periodic"
        };
        let geometry = if let Some([a, b, c]) = self.region.cell_lengths() {
            match self.region.shape() {
                Shape::Cubic => format!("cubic cell {a:.3} Å on a side"),
                _ => format!("rectangular cell {a:.3} x {b:.3} x {c:.3} Å"),
            }
        } else {
            match self.region.extent() {
                RegionExtent::Cube { edge } => format!("cubic region {edge:.3} Å on a side"),
                RegionExtent::Box { lengths } => format!(
                    "rectangular region {:.3} x {:.3} x {:.3} Å",
                    lengths[0], lengths[1], lengths[2]
                ),
                RegionExtent::Sphere { diameter } => {
                    format!("spherical region {diameter:.3} Å in diameter")
                }
            }
        };
        format!(
            "Built a {kind} {geometry} holding {} molecules ({} atoms) at a density of {:.4} g/mL.",
            self.totals.molecules, self.totals.atoms, self.totals.density
        )
    }
}
