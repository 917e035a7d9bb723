//! Error types for town and building operations.

use hamlet_types::{AgentHandle, BuildingId, TownId};

/// Errors from town roster and building operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The agent is already on this town's roster.
    #[error("agent {agent} is already a member of town {town}")]
    AlreadyMember {
        /// The town.
        town: TownId,
        /// The agent's handle.
        agent: AgentHandle,
    },

    /// The agent is not on this town's roster.
    #[error("agent {agent} is not a member of town {town}")]
    NotMember {
        /// The town.
        town: TownId,
        /// The agent's handle.
        agent: AgentHandle,
    },

    /// No building with this ID in the town.
    #[error("building not found: {0}")]
    BuildingNotFound(BuildingId),

    /// The building does not sell food.
    #[error("building {0} is not a store")]
    NotAStore(BuildingId),

    /// The store has nothing left to sell.
    #[error("store {0} is out of stock")]
    OutOfStock(BuildingId),

    /// The building is not a construction site.
    #[error("building {0} is not under construction")]
    NotUnderConstruction(BuildingId),
}
