//! # World Graph
//!
//! The "Map" crate - the single source of truth for everything Wayfarer knows
//! about an explored game world. It canonicalizes environment observations
//! into stable fingerprints, deduplicates them into a graph of distinct
//! world-states, and records every action transition between them. This crate
//! contains no exploration policy or session logic.

pub mod error;
pub mod fingerprint;
pub mod observation;
pub mod store;

pub use error::*;
pub use fingerprint::*;
pub use observation::*;
pub use store::*;
