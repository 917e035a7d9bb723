//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the tick
//! loop so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hamlet_core::ConfigError,
    },

    /// Building the world or seeding it failed.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: hamlet_core::SimulationError,
    },

    /// A tick failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: hamlet_core::TickError,
    },
}
