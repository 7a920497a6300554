//! # Engine Module
//!
//! This module implements the packing engine: the stateful layer that turns a
//! packing request into a fully sized, integer-counted plan and supervises the
//! external tool that realizes it.
//!
//! ## Overview
//!
//! The engine sits between the stateless data models of [`crate::core`] and the
//! user-facing workflow. It validates requests, resolves the interplay between
//! region dimensions and molecule amounts (including the bootstrap pass the
//! density and ideal-gas modes need), and reconciles the packer's flat output
//! back into an annotated structure.
//!
//! ## Architecture
//!
//! The module is organized into submodules with one concern each:
//!
//! - **Configuration** ([`config`]) - Packing parameters, dimension and amount
//!   modes, and the request builder
//! - **Sizing** ([`sizing`]) - The two-parameter sizing solver and the full
//!   plan resolution pipeline
//! - **Stoichiometry** ([`composition`]) - Mixture shares and the conversion
//!   of ratios into integer copy counts
//! - **Chemistry Access** ([`source`]) - The trait through which molecule
//!   specifications become concrete molecules
//! - **Execution** ([`executor`]) - The trait through which the external
//!   packing tool is run
//! - **Progress Monitoring** ([`progress`]) - Progress reporting and user
//!   feedback mechanisms
//! - **Error Handling** ([`error`]) - Engine-specific error types with fault
//!   attribution

pub mod composition;
pub mod config;
pub mod error;
pub mod executor;
pub mod progress;
pub(crate) mod reconcile;
pub mod sizing;
pub mod source;
