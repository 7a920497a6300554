//! Shared utilities: element data, physical constants and the small
//! geometric primitives used to size packing regions around a solute.

pub mod constants;
pub mod elements;
pub mod geometry;
