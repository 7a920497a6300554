//! # Workflows Module
//!
//! This module provides the high-level entry points that orchestrate complete
//! packing runs.
//!
//! ## Overview
//!
//! Workflows tie the engine and the data models together into end-to-end
//! procedures. They own the call order (resolve, size, pack, reconcile), the
//! progress reporting, and the fault attribution when an external tool
//! misbehaves, so that callers only provide a request and the two seams: a
//! chemistry source and an executor.
//!
//! ## Architecture
//!
//! - **Packing Workflow** ([`pack`]) - The full run from molecule
//!   specifications to a packed, annotated structure, plus the plan-only
//!   variant used for dry runs.

pub mod pack;
