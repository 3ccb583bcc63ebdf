//! Error types for the drill binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the run so
//! the setup helpers can propagate with `?`.

/// Top-level error for the drill binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: parley_core::config::ConfigError,
    },

    /// Authoring the demo world failed.
    #[error("world error: {source}")]
    World {
        /// The underlying pipeline error.
        #[from]
        source: parley_comms::CommsError,
    },

    /// The run loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: parley_core::runner::RunnerError,
    },

    /// The population parameters cannot be realised.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
