//! Pipeline gating: feature flag, pause, and time mode.
//!
//! Every stage checks [`PipelineGate::allows_mutation`] before touching any
//! buffer. A closed gate leaves all queued data in place so the pipeline
//! resumes exactly where it stopped.

use serde::{Deserialize, Serialize};

/// How simulation time is currently flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Live simulation; the pipeline mutates state.
    #[default]
    Record,
    /// Replaying recorded history; no mutation.
    Replay,
    /// Fast-forwarding recorded history; no mutation.
    CatchUp,
}

impl TimeMode {
    /// Whether this is a playback mode.
    pub const fn is_playback(self) -> bool {
        matches!(self, Self::Replay | Self::CatchUp)
    }
}

/// The three switches that decide whether a stage may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineGate {
    /// Feature flag for the whole pipeline.
    pub enabled: bool,
    /// Simulation pause.
    pub paused: bool,
    /// Current time mode.
    pub mode: TimeMode,
}

impl Default for PipelineGate {
    fn default() -> Self {
        Self::open()
    }
}

impl PipelineGate {
    /// Enabled, running, recording.
    pub const fn open() -> Self {
        Self {
            enabled: true,
            paused: false,
            mode: TimeMode::Record,
        }
    }

    /// Whether a stage may mutate pipeline state this tick.
    pub const fn allows_mutation(self) -> bool {
        self.enabled && !self.paused && !self.mode.is_playback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_gate_allows_mutation() {
        assert!(PipelineGate::open().allows_mutation());
    }

    #[test]
    fn any_closed_switch_blocks() {
        let disabled = PipelineGate {
            enabled: false,
            ..PipelineGate::open()
        };
        let paused = PipelineGate {
            paused: true,
            ..PipelineGate::open()
        };
        let replay = PipelineGate {
            mode: TimeMode::Replay,
            ..PipelineGate::open()
        };
        let catch_up = PipelineGate {
            mode: TimeMode::CatchUp,
            ..PipelineGate::open()
        };
        for gate in [disabled, paused, replay, catch_up] {
            assert!(!gate.allows_mutation(), "{gate:?}");
        }
    }
}
