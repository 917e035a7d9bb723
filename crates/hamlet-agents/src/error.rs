//! Error types for the hamlet-agents crate.
//!
//! Pool misuse and cross-crate rejections surface as typed errors. A stale
//! handle is an ordinary, recoverable condition: the agent it named has
//! died and its slot may already hold someone else.

use hamlet_bank::BankError;
use hamlet_types::{AgentHandle, TownId};
use rust_decimal::Decimal;
use hamlet_world::WorldError;

/// Errors from pool slot management.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The handle's index is past the end of the pool.
    #[error("handle {0} is outside the pool")]
    OutOfRange(AgentHandle),

    /// The slot has moved on to a later lifetime.
    #[error("handle {0} is stale")]
    Stale(AgentHandle),

    /// The slot is already free.
    #[error("handle {0} was already released")]
    AlreadyReleased(AgentHandle),
}

/// Errors that can occur during agent operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// A pool lookup or release failed.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A town roster or building operation failed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A bank rejected the request.
    #[error(transparent)]
    Bank(#[from] BankError),

    /// The agent's town is not in the simulation.
    #[error("town not found: {0}")]
    TownNotFound(TownId),

    /// The agent is busy and cannot start this activity.
    #[error("agent is busy: {activity}")]
    Busy {
        /// Label of the current activity.
        activity: &'static str,
    },

    /// The agent cannot cover a payment.
    #[error("insufficient money: need {needed}, have {available}")]
    InsufficientMoney {
        /// Amount required.
        needed: Decimal,
        /// Amount on hand.
        available: Decimal,
    },

    /// A money calculation overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: String,
    },
}
