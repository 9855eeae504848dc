//! Shared event types and serialization for the energy market simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! `market-core` depends on it for status events and run summaries.

pub mod event;
pub mod snapshot;

// Re-export event types
pub use event::*;

// Re-export snapshot types
pub use snapshot::{ProducerSnapshot, RunSummary};
