//! Tick cycle: one pass of the message pipeline.
//!
//! Each tick runs these phases in order:
//!
//! 1. **Clock** -- advance the tick counter (held while the gate is paused).
//! 2. **Registry** -- bind buffers to endpoints that appeared since the last
//!    tick.
//! 3. **Traffic** -- collect send requests from the [`TrafficSource`] and
//!    queue them on their senders.
//! 4. **Build** -- resolve queued sends into attempts.
//! 5. **Dispatch** -- deliver attempts as receipts.
//! 6. **Decode** -- turn receipts into decisions.
//! 7. **Maintain** -- retry or retire unacknowledged messages.
//! 8. **Drain** -- hand recorded decisions back to the traffic source.
//!
//! Phases 2, 3, and 8 are skipped when the [`PipelineGate`] forbids mutation;
//! the stage functions check the gate themselves. The cycle is deterministic
//! given the same initial world and traffic.

use tracing::{debug, info, warn};

use parley_comms::{
    BuildStats, CommsWorld, DecodeStats, DispatchStats, MaintainStats, PipelineGate,
    build_attempts, decode_receipts, dispatch_attempts, ensure_endpoints, maintain_outbound,
};

use crate::clock::{ClockError, SimClock};
use crate::config::{ConfigError, SimulationConfig};
use crate::traffic::{TrafficError, TrafficSource};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The traffic source failed.
    #[error("traffic error: {source}")]
    Traffic {
        /// The underlying traffic error.
        #[from]
        source: TrafficError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// The gate the stages ran under.
    pub gate: PipelineGate,
    /// Endpoints that received buffers this tick.
    pub endpoints_bound: usize,
    /// Send requests queued from the traffic source.
    pub sends_queued: usize,
    /// Send requests rejected because the sender was gone.
    pub sends_rejected: usize,
    /// Attempt builder counters.
    pub build: BuildStats,
    /// Dispatcher counters.
    pub dispatch: DispatchStats,
    /// Decoder counters.
    pub decode: DecodeStats,
    /// Outbound maintenance counters.
    pub maintain: MaintainStats,
    /// Decisions drained and handed to the traffic source.
    pub decisions_drained: usize,
    /// Live entities at end of tick.
    pub entities_alive: usize,
    /// Messages still awaiting acknowledgement at end of tick.
    pub outbound_pending: usize,
    /// Replies and resends queued for the next tick's build.
    pub replies_queued: usize,
}

/// The mutable state passed through the tick cycle.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// The simulation clock.
    pub clock: SimClock,
    /// Entities and every pipeline buffer.
    pub world: CommsWorld,
    /// Feature flag, pause, and time mode.
    pub gate: PipelineGate,
}

impl PipelineState {
    /// Wrap an authored world, starting at tick 0.
    pub const fn new(world: CommsWorld, gate: PipelineGate) -> Self {
        Self {
            clock: SimClock::new(),
            world,
            gate,
        }
    }

    /// An empty world carrying the configured thresholds, verb table, and
    /// startup gate.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let world = CommsWorld::with_config(config.decision.clone(), config.verb_table())?;
        Ok(Self::new(world, config.pipeline.gate()))
    }
}

/// Execute one complete tick of the pipeline.
pub fn run_tick(
    state: &mut PipelineState,
    traffic: &mut dyn TrafficSource,
) -> Result<TickSummary, TickError> {
    let gate = state.gate;
    let tick = if gate.paused {
        state.clock.tick()
    } else {
        state.clock.advance()?
    };

    let mut summary = TickSummary {
        tick,
        gate,
        ..TickSummary::default()
    };

    if gate.allows_mutation() {
        summary.endpoints_bound = ensure_endpoints(&mut state.world);
        for (sender, request) in traffic.collect_sends(tick, &state.world)? {
            match state.world.send(sender, request) {
                Ok(()) => summary.sends_queued = summary.sends_queued.saturating_add(1),
                Err(err) => {
                    warn!(tick, %sender, error = %err, "send rejected");
                    summary.sends_rejected = summary.sends_rejected.saturating_add(1);
                }
            }
        }
    } else {
        debug!(tick, ?gate, "pipeline gated");
    }

    summary.build = build_attempts(&mut state.world, gate, tick);
    summary.dispatch = dispatch_attempts(&mut state.world, gate, tick);
    summary.decode = decode_receipts(&mut state.world, gate, tick);
    summary.maintain = maintain_outbound(&mut state.world, gate, tick);

    if gate.allows_mutation() {
        let decisions = state.world.drain_decisions();
        summary.decisions_drained = decisions.len();
        traffic.observe_decisions(tick, &decisions);
    }

    summary.entities_alive = state.world.live_count();
    summary.outbound_pending = state.world.outbound_total();
    summary.replies_queued = state.world.pending_send_total();

    info!(
        tick,
        sends = summary.sends_queued,
        attempts = summary.build.built,
        delivered = summary.dispatch.delivered,
        decisions = summary.decode.decisions(),
        retried = summary.maintain.retried,
        expired = summary.maintain.expired,
        outbound = summary.outbound_pending,
        queued = summary.replies_queued,
        "Tick completed"
    );

    Ok(summary)
}
