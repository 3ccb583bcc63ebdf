//! Simulation clock, tick cycle, and run orchestration for the Parley
//! message pipeline.
//!
//! This crate wraps the four pipeline stages from `parley-comms` in a tick
//! loop with a clock, YAML configuration, and operator controls.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic tick counter.
//! - [`config`] -- Configuration loading from `parley-config.yaml` into
//!   strongly-typed structs.
//! - [`traffic`] -- [`TrafficSource`] trait and [`StubTrafficSource`].
//! - [`tick`] -- One pass of the pipeline and its summary.
//! - [`operator`] -- Pause, resume, speed, pipeline flag, and stop.
//! - [`runner`] -- The async run loop.
//!
//! [`TrafficSource`]: traffic::TrafficSource
//! [`StubTrafficSource`]: traffic::StubTrafficSource

pub mod clock;
pub mod config;
pub mod operator;
pub mod runner;
pub mod tick;
pub mod traffic;
