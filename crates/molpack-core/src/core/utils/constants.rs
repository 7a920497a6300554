//! Physical constants and unit conversion factors.
//!
//! All quantities in this crate are carried in a fixed set of canonical
//! units: lengths in angstrom, volumes in cubic angstrom, masses in gram,
//! molar masses in g/mol, densities in g/mL, pressures in bar and
//! temperatures in kelvin. The factors below convert between those units
//! and the SI values used by the ideal-gas arithmetic.

/// Avogadro constant in 1/mol (2019 SI exact value).
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// Boltzmann constant in J/K (2019 SI exact value).
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Pascal per bar.
pub const PASCAL_PER_BAR: f64 = 1.0e5;

/// Cubic angstrom per millilitre.
pub const CUBIC_ANGSTROM_PER_ML: f64 = 1.0e24;

/// Cubic angstrom per cubic metre.
pub const CUBIC_ANGSTROM_PER_CUBIC_METER: f64 = 1.0e30;

/// Volume in cubic angstrom occupied by `molecules` ideal-gas particles
/// at pressure `pressure` (bar) and temperature `temperature` (K).
#[inline]
pub fn ideal_gas_volume(molecules: f64, pressure: f64, temperature: f64) -> f64 {
    let cubic_meters = molecules * BOLTZMANN * temperature / (pressure * PASCAL_PER_BAR);
    cubic_meters * CUBIC_ANGSTROM_PER_CUBIC_METER
}

/// Number of ideal-gas particles filling `volume` cubic angstrom at
/// pressure `pressure` (bar) and temperature `temperature` (K).
#[inline]
pub fn ideal_gas_molecules(volume: f64, pressure: f64, temperature: f64) -> f64 {
    let cubic_meters = volume / CUBIC_ANGSTROM_PER_CUBIC_METER;
    cubic_meters * pressure * PASCAL_PER_BAR / (BOLTZMANN * temperature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn test_molar_volume_at_standard_conditions() {
        // One mole of ideal gas at 1 bar and 273.15 K occupies 22.710954641485 L.
        let volume = ideal_gas_volume(AVOGADRO, 1.0, 273.15);
        let liters = volume / 1.0e27;
        assert!(f64_approx_equal(liters, 22.710_954_641_485));
    }

    #[test]
    fn test_ideal_gas_round_trip() {
        let molecules = 5.0e5;
        let volume = ideal_gas_volume(molecules, 2.5, 310.0);
        let back = ideal_gas_molecules(volume, 2.5, 310.0);
        assert!((back - molecules).abs() / molecules < 1e-12);
    }
}
