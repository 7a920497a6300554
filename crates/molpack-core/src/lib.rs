//! # molpack
//!
//! A library for building packed molecular systems: fluid boxes, solvated
//! solutes, and periodic cells, realized through the Packmol packing tool.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models
//!   (`Molecule`, `Region`, `Structure`), the builtin molecule templates, and
//!   I/O for the PDB format and the packer's control file.
//!
//! - **[`engine`]: The Logic Core.** This layer turns a packing request into a
//!   fully sized plan: it resolves the interplay between region dimensions and
//!   molecule amounts, validates requests, and reconciles the packer's flat
//!   output back into an annotated structure. Its two traits,
//!   `ChemistrySource` and `Executor`, are the only seams to the outside
//!   world.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties the `engine` and `core` together into complete packing runs and
//!   is the entry point for end-users of the library.

pub mod core;
pub mod engine;
pub mod workflows;
