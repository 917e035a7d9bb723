//! Error types for the simulation context.

use hamlet_agents::AgentError;
use hamlet_types::{AgentHandle, TownId};
use hamlet_world::WorldError;

use crate::clock::ClockError;
use crate::config::ConfigError;

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

    /// An agent update failed.
    #[error("agent error for {handle}: {source}")]
    Agent {
        /// The agent being updated.
        handle: AgentHandle,
        /// The underlying agent error.
        source: AgentError,
    },

    /// A town operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// Errors from host operations on the simulation: setup, spawning,
/// removal.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The configuration was rejected.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Every pool slot is taken.
    #[error("agent pool exhausted ({capacity} slots)")]
    PoolExhausted {
        /// Pool capacity.
        capacity: usize,
    },

    /// No town has this ID.
    #[error("town not found: {0}")]
    TownNotFound(TownId),

    /// An agent operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// A town operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}
