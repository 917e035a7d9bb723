//! A fixed-capacity generational arena of agent slots.
//!
//! Each slot carries a generation counter that advances whenever the slot
//! is handed to a new agent. A [`AgentHandle`] records the generation it
//! was minted with, so once its agent dies and the slot is reused the old
//! handle no longer resolves.
//!
//! Free slots are recycled last-in first-out. Live agents are always
//! iterated in ascending slot order.

use hamlet_types::AgentHandle;
use tracing::warn;

use crate::agent::Agent;
use crate::error::PoolError;

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    agent: Option<Agent>,
}

/// Arena of agent slots with a hard capacity.
#[derive(Debug, Clone)]
pub struct AgentPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    capacity: usize,
}

impl AgentPool {
    /// An empty pool holding at most `capacity` live agents.
    pub const fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
        }
    }

    /// Maximum number of live agents.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live agents.
    pub fn live_count(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    /// Number of agents that can still be acquired.
    pub fn free_count(&self) -> usize {
        self.capacity.saturating_sub(self.live_count())
    }

    /// Whether another agent fits.
    pub fn has_room(&self) -> bool {
        self.free_count() > 0
    }

    /// Store `agent` in a free slot.
    ///
    /// Returns `None` when the pool is full; the caller skips the creation.
    pub fn acquire(&mut self, agent: Agent) -> Option<AgentHandle> {
        if let Some(index) = self.free.pop() {
            let slot = self.slots.get_mut(usize::try_from(index).ok()?)?;
            slot.generation = slot.generation.wrapping_add(1);
            slot.agent = Some(agent);
            return Some(AgentHandle::new(index, slot.generation));
        }
        if self.slots.len() >= self.capacity {
            warn!(capacity = self.capacity, "agent pool exhausted");
            return None;
        }
        let index = u32::try_from(self.slots.len()).ok()?;
        self.slots.push(Slot {
            generation: 0,
            agent: Some(agent),
        });
        Some(AgentHandle::new(index, 0))
    }

    /// Return a slot to the free list, handing back its agent.
    ///
    /// Releasing the same handle twice fails with
    /// [`PoolError::AlreadyReleased`] and leaves the free list untouched.
    pub fn release(&mut self, handle: AgentHandle) -> Result<Agent, PoolError> {
        let slot = self.slot_mut(handle)?;
        let agent = slot.agent.take().ok_or(PoolError::AlreadyReleased(handle))?;
        self.free.push(handle.index());
        Ok(agent)
    }

    /// Whether `handle` names a live agent.
    pub fn is_alive(&self, handle: AgentHandle) -> bool {
        self.get(handle).is_some()
    }

    /// The agent behind `handle`, if it is still alive.
    pub fn get(&self, handle: AgentHandle) -> Option<&Agent> {
        self.try_get(handle).ok()
    }

    /// Mutable access to the agent behind `handle`.
    pub fn get_mut(&mut self, handle: AgentHandle) -> Option<&mut Agent> {
        self.try_get_mut(handle).ok()
    }

    /// Like [`get`](Self::get) but says why the lookup failed.
    pub fn try_get(&self, handle: AgentHandle) -> Result<&Agent, PoolError> {
        let slot = usize::try_from(handle.index())
            .ok()
            .and_then(|i| self.slots.get(i))
            .ok_or(PoolError::OutOfRange(handle))?;
        if slot.generation != handle.generation() {
            return Err(PoolError::Stale(handle));
        }
        slot.agent.as_ref().ok_or(PoolError::AlreadyReleased(handle))
    }

    /// Like [`get_mut`](Self::get_mut) but says why the lookup failed.
    pub fn try_get_mut(&mut self, handle: AgentHandle) -> Result<&mut Agent, PoolError> {
        self.slot_mut(handle)?
            .agent
            .as_mut()
            .ok_or(PoolError::AlreadyReleased(handle))
    }

    /// Live handles in ascending slot order.
    pub fn handles(&self) -> Vec<AgentHandle> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Live agents with their handles, in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentHandle, &Agent)> {
        self.slots.iter().zip(0_u32..).filter_map(|(slot, index)| {
            slot.agent
                .as_ref()
                .map(|a| (AgentHandle::new(index, slot.generation), a))
        })
    }

    fn slot_mut(&mut self, handle: AgentHandle) -> Result<&mut Slot, PoolError> {
        let slot = usize::try_from(handle.index())
            .ok()
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(PoolError::OutOfRange(handle))?;
        if slot.generation != handle.generation() {
            return Err(PoolError::Stale(handle));
        }
        Ok(slot)
    }
}
