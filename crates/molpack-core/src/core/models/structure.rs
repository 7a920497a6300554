use super::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("Bond references atom index {index} but the structure has {atoms} atoms")]
    BondOutOfRange { index: usize, atoms: usize },
    #[error("Column '{column}' supplies {actual} values for {expected} atoms")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("Cell length must be a positive finite value, got {0}")]
    InvalidCellLength(f64),
    #[error("Cell angle must lie strictly between 0 and 180 degrees, got {0}")]
    InvalidCellAngle(f64),
}

/// A flat, possibly periodic collection of atoms: the end product of a
/// packing run.
///
/// Atoms live in parallel columns (symbol, position) addressed by index;
/// bonds and per-forcefield annotation columns refer back to those
/// indices. The periodicity is derived from the presence of a cell:
/// 3 when a cell is set, 0 otherwise.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    symbols: Vec<String>,
    coordinates: Vec<Point3<f64>>,
    bonds: Vec<Bond>,
    atom_types: BTreeMap<String, Vec<String>>,
    partial_charges: BTreeMap<String, Vec<f64>>,
    cell: Option<[f64; 6]>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Removes every atom, bond, annotation column and the cell.
    pub fn clear(&mut self) {
        self.symbols.clear();
        self.coordinates.clear();
        self.bonds.clear();
        self.atom_types.clear();
        self.partial_charges.clear();
        self.cell = None;
    }

    /// Appends an atom and returns its index.
    pub fn add_atom(&mut self, symbol: impl Into<String>, position: Point3<f64>) -> usize {
        self.symbols.push(symbol.into());
        self.coordinates.push(position);
        self.symbols.len() - 1
    }

    pub fn add_bond(
        &mut self,
        atom1: usize,
        atom2: usize,
        order: BondOrder,
    ) -> Result<(), StructureError> {
        let atoms = self.atom_count();
        for index in [atom1, atom2] {
            if index >= atoms {
                return Err(StructureError::BondOutOfRange { index, atoms });
            }
        }
        self.bonds.push(Bond::new(atom1, atom2, order));
        Ok(())
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn coordinates(&self) -> &[Point3<f64>] {
        &self.coordinates
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Replaces the atom-type column for one forcefield.
    pub fn set_atom_types(
        &mut self,
        forcefield: impl Into<String>,
        types: Vec<String>,
    ) -> Result<(), StructureError> {
        let forcefield = forcefield.into();
        if types.len() != self.atom_count() {
            return Err(StructureError::ColumnLengthMismatch {
                column: format!("atom_types[{forcefield}]"),
                expected: self.atom_count(),
                actual: types.len(),
            });
        }
        self.atom_types.insert(forcefield, types);
        Ok(())
    }

    /// Replaces the partial-charge column for one forcefield.
    pub fn set_partial_charges(
        &mut self,
        forcefield: impl Into<String>,
        charges: Vec<f64>,
    ) -> Result<(), StructureError> {
        let forcefield = forcefield.into();
        if charges.len() != self.atom_count() {
            return Err(StructureError::ColumnLengthMismatch {
                column: format!("partial_charges[{forcefield}]"),
                expected: self.atom_count(),
                actual: charges.len(),
            });
        }
        self.partial_charges.insert(forcefield, charges);
        Ok(())
    }

    pub fn atom_types(&self) -> &BTreeMap<String, Vec<String>> {
        &self.atom_types
    }

    pub fn partial_charges(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.partial_charges
    }

    /// Declares the structure periodic with the given cell parameters
    /// `[a, b, c, alpha, beta, gamma]` (angstrom and degrees).
    pub fn set_periodic_cell(&mut self, cell: [f64; 6]) -> Result<(), StructureError> {
        for length in &cell[..3] {
            if !length.is_finite() || *length <= 0.0 {
                return Err(StructureError::InvalidCellLength(*length));
            }
        }
        for angle in &cell[3..] {
            if !angle.is_finite() || *angle <= 0.0 || *angle >= 180.0 {
                return Err(StructureError::InvalidCellAngle(*angle));
            }
        }
        self.cell = Some(cell);
        Ok(())
    }

    pub fn cell(&self) -> Option<[f64; 6]> {
        self.cell
    }

    /// 3 for a periodic structure, 0 otherwise.
    pub fn periodicity(&self) -> u8 {
        if self.cell.is_some() { 3 } else { 0 }
    }
}
