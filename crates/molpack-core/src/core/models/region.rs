use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The shape of the packing region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Cubic,
    Rectangular,
    Spherical,
}

#[derive(Debug, Error)]
#[error("Invalid shape '{0}', expected cubic, rectangular or spherical")]
pub struct ParseShapeError(String);

impl FromStr for Shape {
    type Err = ParseShapeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cubic" | "cube" => Ok(Self::Cubic),
            "rectangular" | "box" => Ok(Self::Rectangular),
            "spherical" | "sphere" => Ok(Self::Spherical),
            _ => Err(ParseShapeError(s.to_string())),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Cubic => "cubic",
                Self::Rectangular => "rectangular",
                Self::Spherical => "spherical",
            }
        )
    }
}

/// Concrete lengths of a region, in angstrom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionExtent {
    Cube { edge: f64 },
    Box { lengths: [f64; 3] },
    Sphere { diameter: f64 },
}

impl RegionExtent {
    pub fn shape(&self) -> Shape {
        match self {
            Self::Cube { .. } => Shape::Cubic,
            Self::Box { .. } => Shape::Rectangular,
            Self::Sphere { .. } => Shape::Spherical,
        }
    }

    /// Enclosed volume in cubic angstrom.
    pub fn volume(&self) -> f64 {
        match self {
            Self::Cube { edge } => edge.powi(3),
            Self::Box { lengths } => lengths[0] * lengths[1] * lengths[2],
            Self::Sphere { diameter } => PI * diameter.powi(3) / 6.0,
        }
    }

    fn lengths(&self) -> Vec<f64> {
        match self {
            Self::Cube { edge } => vec![*edge],
            Self::Box { lengths } => lengths.to_vec(),
            Self::Sphere { diameter } => vec![*diameter],
        }
    }
}

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Region dimension must be a positive finite length, got {value}")]
    InvalidDimension { value: f64 },
    #[error("Gap must be a non-negative finite length, got {value}")]
    InvalidGap { value: f64 },
    #[error("Spherical regions cannot be periodic")]
    PeriodicSphere,
    #[error("Gap {gap} leaves no room inside a cell side of {cell}")]
    GapExceedsCell { cell: f64, gap: f64 },
}

/// A sized packing region.
///
/// For a periodic region the stored extent is the packing extent: the
/// nominal cell shrunk by the gap on every side, so that molecules near
/// one face keep their distance from the images across the boundary.
/// The nominal cell lengths are kept alongside; `cell - extent == gap`
/// holds exactly per axis. Non-periodic regions pack the full extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    extent: RegionExtent,
    cell: Option<[f64; 3]>,
    solute_offset: Option<Vector3<f64>>,
}

impl Region {
    /// Builds a non-periodic region packing the full `extent`.
    pub fn non_periodic(extent: RegionExtent) -> Result<Self, RegionError> {
        validate_lengths(&extent)?;
        Ok(Self {
            extent,
            cell: None,
            solute_offset: None,
        })
    }

    /// Builds a periodic region from the nominal cell `extent`, shrinking
    /// the packing extent by `gap` on every axis.
    ///
    /// # Errors
    ///
    /// Spherical extents are rejected, as are gaps that consume a whole
    /// cell side.
    pub fn periodic(extent: RegionExtent, gap: f64) -> Result<Self, RegionError> {
        validate_lengths(&extent)?;
        if !gap.is_finite() || gap < 0.0 {
            return Err(RegionError::InvalidGap { value: gap });
        }

        let (cell, packed) = match extent {
            RegionExtent::Sphere { .. } => return Err(RegionError::PeriodicSphere),
            RegionExtent::Cube { edge } => {
                if gap >= edge {
                    return Err(RegionError::GapExceedsCell { cell: edge, gap });
                }
                ([edge; 3], RegionExtent::Cube { edge: edge - gap })
            }
            RegionExtent::Box { lengths } => {
                for side in lengths {
                    if gap >= side {
                        return Err(RegionError::GapExceedsCell { cell: side, gap });
                    }
                }
                (
                    lengths,
                    RegionExtent::Box {
                        lengths: [lengths[0] - gap, lengths[1] - gap, lengths[2] - gap],
                    },
                )
            }
        };

        Ok(Self {
            extent: packed,
            cell: Some(cell),
            solute_offset: None,
        })
    }

    /// Records the translation applied to center the solute in the region.
    pub fn with_solute_offset(mut self, offset: Vector3<f64>) -> Self {
        self.solute_offset = Some(offset);
        self
    }

    pub fn shape(&self) -> Shape {
        self.extent.shape()
    }

    /// The packing extent (gap-shrunk for periodic regions).
    pub fn extent(&self) -> &RegionExtent {
        &self.extent
    }

    pub fn is_periodic(&self) -> bool {
        self.cell.is_some()
    }

    /// Nominal cell lengths, present only for periodic regions.
    pub fn cell_lengths(&self) -> Option<[f64; 3]> {
        self.cell
    }

    /// Full crystallographic cell: three lengths and three right angles.
    pub fn cell_parameters(&self) -> Option<[f64; 6]> {
        self.cell
            .map(|[a, b, c]| [a, b, c, 90.0, 90.0, 90.0])
    }

    /// The region volume used for densities and mass budgets: the nominal
    /// cell volume when periodic, otherwise the packing extent volume.
    pub fn volume(&self) -> f64 {
        match self.cell {
            Some([a, b, c]) => a * b * c,
            None => self.extent.volume(),
        }
    }

    /// The point at which a solute is held, in packing coordinates.
    pub fn center(&self) -> Point3<f64> {
        match self.extent {
            RegionExtent::Cube { edge } => Point3::new(edge, edge, edge) * 0.5,
            RegionExtent::Box { lengths } => {
                Point3::new(lengths[0], lengths[1], lengths[2]) * 0.5
            }
            RegionExtent::Sphere { .. } => Point3::origin(),
        }
    }

    pub fn solute_offset(&self) -> Option<Vector3<f64>> {
        self.solute_offset
    }
}

fn validate_lengths(extent: &RegionExtent) -> Result<(), RegionError> {
    for length in extent.lengths() {
        if !length.is_finite() || length <= 0.0 {
            return Err(RegionError::InvalidDimension { value: length });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn test_shape_from_str() {
        assert_eq!("cubic".parse::<Shape>().unwrap(), Shape::Cubic);
        assert_eq!("Cube".parse::<Shape>().unwrap(), Shape::Cubic);
        assert_eq!("box".parse::<Shape>().unwrap(), Shape::Rectangular);
        assert_eq!("SPHERICAL".parse::<Shape>().unwrap(), Shape::Spherical);
        assert!("dodecahedral".parse::<Shape>().is_err());
    }

    #[test]
    fn test_periodic_cube_shrinks_packing_extent_by_gap() {
        let region = Region::periodic(RegionExtent::Cube { edge: 20.0 }, 2.0).unwrap();
        assert!(region.is_periodic());
        match region.extent() {
            RegionExtent::Cube { edge } => {
                let [cell, _, _] = region.cell_lengths().unwrap();
                assert_eq!(cell - edge, 2.0);
            }
            other => panic!("expected a cube, got {other:?}"),
        }
        // Nominal volume comes from the cell, not the shrunk extent.
        assert!(f64_approx_equal(region.volume(), 8000.0));
    }

    #[test]
    fn test_periodic_box_shrinks_every_axis() {
        let region = Region::periodic(
            RegionExtent::Box {
                lengths: [10.0, 20.0, 30.0],
            },
            1.5,
        )
        .unwrap();
        match region.extent() {
            RegionExtent::Box { lengths } => {
                assert!(f64_approx_equal(lengths[0], 8.5));
                assert!(f64_approx_equal(lengths[1], 18.5));
                assert!(f64_approx_equal(lengths[2], 28.5));
            }
            other => panic!("expected a box, got {other:?}"),
        }
        assert_eq!(
            region.cell_parameters().unwrap(),
            [10.0, 20.0, 30.0, 90.0, 90.0, 90.0]
        );
    }

    #[test]
    fn test_periodic_sphere_is_rejected() {
        let result = Region::periodic(RegionExtent::Sphere { diameter: 25.0 }, 2.0);
        assert!(matches!(result, Err(RegionError::PeriodicSphere)));
    }

    #[test]
    fn test_gap_consuming_a_side_is_rejected() {
        let result = Region::periodic(RegionExtent::Cube { edge: 2.0 }, 2.0);
        assert!(matches!(
            result,
            Err(RegionError::GapExceedsCell { .. })
        ));
    }

    #[test]
    fn test_non_positive_dimensions_are_rejected() {
        assert!(Region::non_periodic(RegionExtent::Cube { edge: 0.0 }).is_err());
        assert!(Region::non_periodic(RegionExtent::Sphere { diameter: -3.0 }).is_err());
        assert!(
            Region::non_periodic(RegionExtent::Box {
                lengths: [1.0, f64::NAN, 1.0]
            })
            .is_err()
        );
    }

    #[test]
    fn test_sphere_volume_and_center() {
        let region = Region::non_periodic(RegionExtent::Sphere { diameter: 10.0 }).unwrap();
        assert!(f64_approx_equal(region.volume(), PI * 1000.0 / 6.0));
        assert_eq!(region.center(), Point3::origin());
        assert!(!region.is_periodic());
        assert!(region.cell_parameters().is_none());
    }

    #[test]
    fn test_box_center_is_half_the_packing_extent() {
        let region = Region::non_periodic(RegionExtent::Box {
            lengths: [10.0, 20.0, 30.0],
        })
        .unwrap();
        assert_eq!(region.center(), Point3::new(5.0, 10.0, 15.0));
    }
}
