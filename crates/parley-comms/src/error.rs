//! Error types for the parley-comms crate.
//!
//! Pipeline stages never fail: every runtime problem (missing receiver, no
//! channel, exhausted budget) degrades to a drop or a conservative decision.
//! The errors here cover the authoring API that collaborators use to set up
//! entities and configuration.

use parley_types::EntityId;

/// Errors that can occur while authoring the communication world.
#[derive(Debug, thiserror::Error)]
pub enum CommsError {
    /// The handle refers to a despawned entity or a reused slot.
    #[error("stale entity handle: {0}")]
    StaleEntity(EntityId),

    /// No more entity slots can be allocated.
    #[error("entity arena exhausted at {capacity} slots")]
    ArenaExhausted {
        /// Number of slots already allocated.
        capacity: usize,
    },

    /// A decision configuration failed validation.
    #[error("invalid decision config: {reason}")]
    InvalidConfig {
        /// Description of the offending field.
        reason: String,
    },
}
