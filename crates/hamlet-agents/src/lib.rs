//! Agents for the Hamlet simulation.
//!
//! Agents live in a generational [`AgentPool`]. Each tick the simulation
//! core hands every live handle to [`update_agent`] together with a
//! [`TickContext`] holding the pool, the towns, the terrain, and the RNG.
//! Agent-to-agent effects (pairing, births, feeding a child, deaths) are
//! applied directly through the pool; anything the core needs to count is
//! reported back as an [`AgentEvent`].
//!
//! # Modules
//!
//! - [`agent`] -- The agent record, timers, and spawn parameters
//! - [`banking`] -- Deposits, loan repayment, and emergency loans
//! - [`behavior`] -- The per-tick state machine and its context
//! - [`config`] -- Lifecycle, occupation, needs, and banking tunables
//! - [`death`] -- Detaching a dead agent from everything that refers to it
//! - [`error`] -- Error types for pool and agent operations
//! - [`membership`] -- Unaffiliated agents joining towns
//! - [`movement`] -- Walk targets and stepping
//! - [`names`] -- Random name generation
//! - [`needs`] -- Hunger and food seeking
//! - [`occupation`] -- The labor market
//! - [`pool`] -- Slot reuse with generation-checked handles
//! - [`social`] -- Relationships and reproduction
//! - [`work`] -- Occupation actions and wages

pub mod agent;
pub mod banking;
pub mod behavior;
pub mod config;
pub mod death;
pub mod error;
pub mod membership;
pub mod movement;
pub mod names;
pub mod needs;
pub mod occupation;
pub mod pool;
pub mod social;
pub mod work;

pub use agent::{Agent, SpawnParams, Timers};
pub use behavior::{AgentEvent, AgentStatus, TickContext, update_agent};
pub use config::{AgentsConfig, BankingConfig, LifecycleConfig, NeedsConfig, OccupationConfig};
pub use death::{DeathCause, DeathRecord, terminate};
pub use error::{AgentError, PoolError};
pub use names::generate_name;
pub use occupation::{
    change_occupation, market_occupation, occupation_counts, reassign_occupation, select_occupation,
};
pub use pool::AgentPool;
pub use work::WorkOutcome;
