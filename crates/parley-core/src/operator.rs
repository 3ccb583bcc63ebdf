//! Operator control state for runtime run management.
//!
//! The tick loop and whoever drives it (a signal handler, a console, a test)
//! share one [`OperatorState`]. The operator can pause and resume, change
//! tick speed, switch the message pipeline off and on, and request a clean
//! stop without tearing the process down.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationBoundsConfig;

/// Shortest tick interval the operator may set.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Reason why the run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator issued a stop command.
    OperatorStop,
}

/// Shared operator control state.
///
/// Wrapped in [`std::sync::Arc`] and shared between the tick loop and its
/// controllers. Atomic fields keep the loop's per-tick reads lock-free.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the run is currently paused.
    paused: AtomicBool,

    /// Notification used to wake the tick loop when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Whether the message pipeline runs (the feature flag).
    pipeline_enabled: AtomicBool,

    /// Current tick interval in milliseconds (runtime-adjustable).
    tick_interval_ms: AtomicU64,

    /// Wall-clock time when the run started.
    started_at: DateTime<Utc>,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,

    /// Reason the run ended, if it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create a new operator state from configuration.
    pub fn new(tick_interval_ms: u64, bounds: &SimulationBoundsConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            pipeline_enabled: AtomicBool::new(true),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            started_at: Utc::now(),
            max_ticks: bounds.max_ticks,
            max_real_time_seconds: bounds.max_real_time_seconds,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the run is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the run. The tick loop sleeps until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the run and wake the tick loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the run is resumed or a stop is requested.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        // A paused loop must wake up to notice the stop.
        self.resume_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the reason the run ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Get the reason the run ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        self.end_reason.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Pipeline flag
    // -----------------------------------------------------------------------

    /// Whether the message pipeline is switched on.
    pub fn pipeline_enabled(&self) -> bool {
        self.pipeline_enabled.load(Ordering::Acquire)
    }

    /// Switch the message pipeline on or off. Returns the previous setting.
    pub fn set_pipeline_enabled(&self, enabled: bool) -> bool {
        self.pipeline_enabled.swap(enabled, Ordering::AcqRel)
    }

    // -----------------------------------------------------------------------
    // Tick Speed
    // -----------------------------------------------------------------------

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval in milliseconds.
    ///
    /// Returns the previous interval on success, or `None` if the value was
    /// below [`MIN_TICK_INTERVAL_MS`].
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Whether `ticks_run` has reached a nonzero `max_ticks`.
    pub const fn tick_limit_reached(&self, ticks_run: u64) -> bool {
        self.max_ticks > 0 && ticks_run >= self.max_ticks
    }

    /// Whether the elapsed wall-clock time has reached a nonzero
    /// `max_real_time_seconds`.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since the run started.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        // Negative if the wall clock stepped backwards.
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Get the configured max ticks.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Get the configured max real-time seconds.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }

    /// Snapshot of the control plane at `tick`.
    pub async fn status(&self, tick: u64, entities_alive: usize) -> SimulationStatus {
        SimulationStatus {
            tick,
            paused: self.is_paused(),
            stop_requested: self.is_stop_requested(),
            pipeline_enabled: self.pipeline_enabled(),
            tick_interval_ms: self.tick_interval_ms(),
            elapsed_seconds: self.elapsed_seconds(),
            max_ticks: self.max_ticks,
            max_real_time_seconds: self.max_real_time_seconds,
            entities_alive: u64::try_from(entities_alive).unwrap_or(u64::MAX),
            end_reason: self.end_reason().await,
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// JSON-serializable status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Current tick number.
    pub tick: u64,
    /// Whether the run is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Whether the message pipeline is switched on.
    pub pipeline_enabled: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Configured maximum ticks (0 = unlimited).
    pub max_ticks: u64,
    /// Configured maximum real-time seconds (0 = unlimited).
    pub max_real_time_seconds: u64,
    /// Number of live entities.
    pub entities_alive: u64,
    /// The reason the run ended, if applicable.
    pub end_reason: Option<SimulationEndReason>,
    /// ISO 8601 timestamp of when the run started.
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbounded() -> SimulationBoundsConfig {
        SimulationBoundsConfig {
            max_ticks: 0,
            max_real_time_seconds: 0,
        }
    }

    #[test]
    fn initial_state_is_running() {
        let state = OperatorState::new(1000, &unbounded());
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert!(state.pipeline_enabled());
    }

    #[test]
    fn pause_and_resume() {
        let state = OperatorState::new(1000, &unbounded());
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn stop_request() {
        let state = OperatorState::new(1000, &unbounded());
        state.request_stop();
        assert!(state.is_stop_requested());
    }

    #[test]
    fn pipeline_toggle_returns_previous() {
        let state = OperatorState::new(1000, &unbounded());
        assert!(state.set_pipeline_enabled(false));
        assert!(!state.pipeline_enabled());
        assert!(!state.set_pipeline_enabled(true));
    }

    #[test]
    fn set_tick_interval() {
        let state = OperatorState::new(1000, &unbounded());
        assert_eq!(state.set_tick_interval_ms(2000), Some(1000));
        assert_eq!(state.tick_interval_ms(), 2000);
    }

    #[test]
    fn reject_sub_minimum_interval() {
        let state = OperatorState::new(1000, &unbounded());
        assert!(state.set_tick_interval_ms(50).is_none());
        assert_eq!(state.tick_interval_ms(), 1000);
    }

    #[test]
    fn zero_limits_mean_unlimited() {
        let state = OperatorState::new(1000, &unbounded());
        assert!(!state.tick_limit_reached(999_999));
        assert!(!state.time_limit_reached());
    }

    #[test]
    fn tick_limit_reached() {
        let bounds = SimulationBoundsConfig {
            max_ticks: 100,
            max_real_time_seconds: 0,
        };
        let state = OperatorState::new(1000, &bounds);
        assert!(!state.tick_limit_reached(99));
        assert!(state.tick_limit_reached(100));
        assert!(state.tick_limit_reached(101));
    }

    #[tokio::test]
    async fn status_reports_end_reason() {
        let state = OperatorState::new(1000, &unbounded());
        state.set_end_reason(SimulationEndReason::OperatorStop).await;
        let status = state.status(7, 3).await;
        assert_eq!(status.tick, 7);
        assert_eq!(status.entities_alive, 3);
        assert_eq!(status.end_reason, Some(SimulationEndReason::OperatorStop));
    }
}
