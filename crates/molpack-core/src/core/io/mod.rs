//! # IO Module
//!
//! File formats spoken at the boundary with the external packer.
//!
//! ## Overview
//!
//! Two dialects live here. [`pdb`] is a column-oriented codec for the
//! minimal PDB subset used for structure exchange in both directions.
//! [`job`] renders a resolved plan into the packer's own input grammar:
//! the control file plus the per-species structure files it references.
//! Both operate on in-memory strings; where the files land on disk is
//! the executor's business, not theirs.

pub mod job;
pub mod pdb;
