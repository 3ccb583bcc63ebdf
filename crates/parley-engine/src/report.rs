//! Run report: per-tick counters folded into totals for the final summary.

use parley_core::runner::TickCallback;
use parley_core::tick::{PipelineState, TickSummary};
use serde::Serialize;
use tracing::debug;

/// Totals across every tick of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Ticks observed.
    pub ticks: u64,
    /// Ticks on which the gate forbade mutation.
    pub gated_ticks: u64,
    /// Send requests queued by the traffic source.
    pub sends_queued: u64,
    /// Attempts built.
    pub attempts_built: u64,
    /// Sends dropped by the builder.
    pub build_dropped: u64,
    /// Signs attempts that were misread.
    pub misread: u64,
    /// Receipts delivered.
    pub delivered: u64,
    /// Attempts lost in transit.
    pub lost_in_transit: u64,
    /// Duplicate receipts suppressed.
    pub duplicates: u64,
    /// Outbound entries retired by an ack or nack.
    pub acknowledged: u64,
    /// Clarify requests answered with a restatement.
    pub clarified: u64,
    /// Decisions recorded.
    pub decisions: u64,
    /// Resends by outbound maintenance.
    pub retried: u64,
    /// Messages that ran out of retries.
    pub expired: u64,
    /// Messages still awaiting acknowledgement at the last tick.
    pub outbound_pending: u64,
}

fn widen(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

fn bump(total: &mut u64, count: usize) {
    *total = total.saturating_add(widen(count));
}

impl RunReport {
    /// Fold one tick into the totals.
    pub fn record(&mut self, summary: &TickSummary) {
        self.ticks = self.ticks.saturating_add(1);
        if !summary.gate.allows_mutation() {
            self.gated_ticks = self.gated_ticks.saturating_add(1);
        }
        bump(&mut self.sends_queued, summary.sends_queued);
        bump(&mut self.attempts_built, summary.build.built);
        bump(&mut self.build_dropped, summary.build.dropped);
        bump(&mut self.misread, summary.build.misread);
        bump(&mut self.delivered, summary.dispatch.delivered);
        bump(
            &mut self.lost_in_transit,
            summary.dispatch.dropped.saturating_add(summary.dispatch.discarded),
        );
        bump(&mut self.duplicates, summary.decode.duplicates);
        bump(&mut self.acknowledged, summary.decode.acknowledged);
        bump(&mut self.clarified, summary.decode.clarified);
        bump(&mut self.decisions, summary.decode.decisions());
        bump(&mut self.retried, summary.maintain.retried);
        bump(&mut self.expired, summary.maintain.expired);
        self.outbound_pending = widen(summary.outbound_pending);
    }
}

impl TickCallback for RunReport {
    fn on_tick(&mut self, summary: &TickSummary, _state: &PipelineState) {
        self.record(summary);
        debug!(tick = summary.tick, totals = ?self, "Run totals updated");
    }
}

#[cfg(test)]
mod tests {
    use parley_comms::{DecodeStats, DispatchStats, PipelineGate, TimeMode};

    use super::*;

    #[test]
    fn totals_accumulate_and_pending_tracks_latest() {
        let mut report = RunReport::default();
        let busy = TickSummary {
            tick: 1,
            sends_queued: 4,
            dispatch: DispatchStats {
                delivered: 3,
                dropped: 1,
                discarded: 0,
            },
            decode: DecodeStats {
                accepted: 2,
                ignored: 1,
                ..DecodeStats::default()
            },
            outbound_pending: 2,
            ..TickSummary::default()
        };
        let quiet = TickSummary {
            tick: 2,
            gate: PipelineGate {
                mode: TimeMode::CatchUp,
                ..PipelineGate::open()
            },
            ..TickSummary::default()
        };
        report.record(&busy);
        report.record(&busy);
        report.record(&quiet);

        assert_eq!(report.ticks, 3);
        assert_eq!(report.gated_ticks, 1);
        assert_eq!(report.sends_queued, 8);
        assert_eq!(report.delivered, 6);
        assert_eq!(report.lost_in_transit, 2);
        assert_eq!(report.decisions, 6);
        assert_eq!(report.outbound_pending, 0);
    }
}
