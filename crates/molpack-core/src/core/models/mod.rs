//! # Models Module
//!
//! Domain data structures for packing runs.
//!
//! ## Overview
//!
//! The types here describe a run at three stages. A [`molecule::MoleculeSpec`]
//! is what the caller asks for: a role, a chemical definition and a mixture
//! ratio. A [`plan::PackingPlan`] is what the engine resolves that request
//! into: a sized [`region::Region`] plus concrete copy counts per species.
//! A [`structure::Structure`] is what comes back out after the external
//! packer has run and the flat output has been reconciled against the plan.
//!
//! All models are plain data with validation at construction. None of them
//! perform I/O or talk to the packing tool.

pub mod molecule;
pub mod plan;
pub mod region;
pub mod structure;
pub mod topology;
