//! # Explorer Core (The Wayfarer)
//!
//! The "brain" of the exploration system. This crate drives playthrough
//! sessions over the shared [`world_graph`] store, plans which action to try
//! next with a systematic frontier-first policy, and derives coverage and
//! path-quality statistics from the accumulated map.
//!
//! ## Core Components
//!
//! - **session**: per-playthrough cursor over the graph with an absorbing
//!   terminal lifecycle
//! - **planner**: frontier exploration, breadth-first backtracking, and
//!   exhaustion detection behind one `next_action` seam
//! - **stats**: read-only coverage / efficiency / path-optimality aggregation
//! - **engine**: the transport-agnostic facade callers integrate against
//!
//! ## Design Philosophy
//!
//! - **One map, many walkers**: every session reads and writes the same
//!   deduplicated graph, so nothing is ever explored twice
//! - **Policy behind a seam**: the scripted planner and any learned
//!   decision-maker are interchangeable implementations of `next_action`
//! - **Nothing swallowed**: every rejected operation is a typed error;
//!   non-determinism is recorded on the map, not thrown

pub mod config;
pub mod engine;
pub mod error;
pub mod planner;
pub mod session;
pub mod stats;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use planner::*;
pub use session::*;
pub use stats::*;
