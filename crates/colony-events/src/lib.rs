//! Shared event types and serialization for the colony simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod event;
pub mod timestamp;

// Re-export timestamp types
pub use timestamp::{MarsTimestamp, ParseTimestampError, MILLISOLS_PER_SOL, SECONDS_PER_MILLISOL};

// Re-export event types
pub use event::{generate_event_id, AbortReason, ActivityEvent, ActivityEventKind};
