//! Traffic source trait and stub implementation.
//!
//! At the start of every running tick the engine asks a [`TrafficSource`]
//! which messages entities want to send, and after the decode stage it hands
//! the source every decision the receivers recorded. The source could be a
//! scripted commander, an AI planner, a recorded log, or a test stub.

use parley_comms::CommsWorld;
use parley_types::{Decision, EntityId, SendRequest};

/// Errors that can occur while collecting traffic.
#[derive(Debug, thiserror::Error)]
pub enum TrafficError {
    /// An internal error in the traffic source.
    #[error("traffic source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// A source of outgoing messages and a sink for the decisions they produce.
pub trait TrafficSource {
    /// Messages to queue this tick, as `(sender, request)` pairs.
    ///
    /// The world is read-only here; the tick cycle queues the requests.
    /// Requests naming a dead sender are rejected individually.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficError`] if the source fails entirely.
    fn collect_sends(
        &mut self,
        tick: u64,
        world: &CommsWorld,
    ) -> Result<Vec<(EntityId, SendRequest)>, TrafficError>;

    /// Receive the decisions drained from the world after decoding.
    fn observe_decisions(&mut self, _tick: u64, _decisions: &[(EntityId, Decision)]) {}
}

/// A stub traffic source that never sends anything.
#[derive(Debug, Clone, Default)]
pub struct StubTrafficSource;

impl StubTrafficSource {
    /// Create a new stub traffic source.
    pub const fn new() -> Self {
        Self
    }
}

impl TrafficSource for StubTrafficSource {
    fn collect_sends(
        &mut self,
        _tick: u64,
        _world: &CommsWorld,
    ) -> Result<Vec<(EntityId, SendRequest)>, TrafficError> {
        Ok(Vec::new())
    }
}
