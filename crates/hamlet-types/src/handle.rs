//! Generational handles into the agent pool.
//!
//! A handle names one lifetime of one pool slot. When the slot is released
//! its generation advances, so every handle minted for the previous
//! lifetime goes stale and lookups through it fail instead of reaching the
//! slot's next occupant.

use serde::{Deserialize, Serialize};

/// An `(index, generation)` reference to an agent slot.
///
/// Ordering is by slot index first, which is the order the simulation
/// updates agents in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentHandle {
    index: u32,
    generation: u32,
}

impl AgentHandle {
    /// Build a handle from its raw parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index this handle points at.
    pub const fn index(self) -> u32 {
        self.index
    }

    /// The slot lifetime this handle belongs to.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl core::fmt::Display for AgentHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}
