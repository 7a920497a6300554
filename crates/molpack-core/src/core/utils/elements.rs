//! Standard atomic weights for the elements that commonly appear in
//! packed fluids and solutes.
//!
//! Lookups normalize the symbol case first, so `"AR"`, `"ar"` and `"Ar"`
//! all resolve to argon. Values are IUPAC standard atomic weights in
//! g/mol (conventional values where IUPAC quotes an interval).

use phf::{Map, phf_map};

#[rustfmt::skip]
static ATOMIC_MASSES: Map<&'static str, f64> = phf_map! {
    // Periods 1-2
    "H"  => 1.008,        "He" => 4.002602,
    "Li" => 6.94,         "Be" => 9.0121831,    "B"  => 10.81,
    "C"  => 12.011,       "N"  => 14.007,       "O"  => 15.999,
    "F"  => 18.998403163, "Ne" => 20.1797,
    // Period 3
    "Na" => 22.98976928,  "Mg" => 24.305,       "Al" => 26.9815384,
    "Si" => 28.085,       "P"  => 30.973761998, "S"  => 32.06,
    "Cl" => 35.45,        "Ar" => 39.948,
    // Period 4
    "K"  => 39.0983,      "Ca" => 40.078,       "Ti" => 47.867,
    "Cr" => 51.9961,      "Mn" => 54.938043,    "Fe" => 55.845,
    "Co" => 58.933194,    "Ni" => 58.6934,      "Cu" => 63.546,
    "Zn" => 65.38,        "Ga" => 69.723,       "Ge" => 72.630,
    "As" => 74.921595,    "Se" => 78.971,       "Br" => 79.904,
    "Kr" => 83.798,
    // Heavier elements seen in solutes and ionic liquids
    "Rb" => 85.4678,      "Sr" => 87.62,        "Ag" => 107.8682,
    "Cd" => 112.414,      "Sn" => 118.710,      "I"  => 126.90447,
    "Xe" => 131.293,      "Cs" => 132.90545196, "Ba" => 137.327,
    "Pt" => 195.084,      "Au" => 196.96657,    "Hg" => 200.592,
    "Pb" => 207.2,
};

fn normalized(symbol: &str) -> Option<String> {
    let trimmed = symbol.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let mut out = String::with_capacity(trimmed.len());
    out.extend(first.to_uppercase());
    out.extend(chars.flat_map(|c| c.to_lowercase()));
    Some(out)
}

/// Returns the atomic mass in g/mol, or `None` for an unknown symbol.
pub fn atomic_mass(symbol: &str) -> Option<f64> {
    let key = normalized(symbol)?;
    ATOMIC_MASSES.get(key.as_str()).copied()
}

/// Returns the canonically-cased element symbol, or `None` if unknown.
pub fn canonical_symbol(symbol: &str) -> Option<&'static str> {
    let key = normalized(symbol)?;
    ATOMIC_MASSES.get_entry(key.as_str()).map(|(symbol, _)| *symbol)
}
