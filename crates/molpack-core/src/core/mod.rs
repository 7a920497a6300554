//! # Core Module
//!
//! Foundational, stateless building blocks for the packing engine.
//!
//! ## Architecture
//!
//! This level of the crate holds pure data and pure functions: the domain
//! models, the file codecs, the template library and small numeric
//! utilities. Nothing here owns a process, reads configuration or keeps
//! state between calls; the [`engine`](crate::engine) layer composes
//! these pieces into actual packing runs.

pub mod io;
pub mod models;
pub mod templates;
pub mod utils;
