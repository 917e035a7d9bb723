//! Simulation context, tick cycle, and orchestration for Hamlet.
//!
//! This crate owns the world-level loop: it advances the clock, updates
//! towns and then their members, elects mayors, and reports what happened.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and elapsed simulated time.
//! - [`config`] -- Configuration loading from `hamlet-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- Tick and host operation errors.
//! - [`simulation`] -- The [`Simulation`] context and its tick.
//! - [`telemetry`] -- Optional metrics sink for population events.

pub mod clock;
pub mod config;
pub mod error;
pub mod simulation;
pub mod telemetry;

pub use clock::{ClockError, SimClock};
pub use config::{ConfigError, SimulationConfig};
pub use error::{SimulationError, TickError};
pub use simulation::{Simulation, TickSummary, TownSummary};
pub use telemetry::{MetricsSink, Telemetry, TracingSink};
