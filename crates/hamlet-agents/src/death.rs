//! Death and detachment.
//!
//! An agent dies when its age reaches its lifespan, or when the host
//! removes it. Before its slot returns to the pool, every link that names
//! it is cut: town roster, mayoral office, store job, partner, follow
//! links, and parent/child references. No other agent is left holding a
//! handle that could later resolve to the slot's next occupant.

use hamlet_types::{Activity, AgentHandle, AgentId, Thought, TownId};
use hamlet_world::Town;
use rand::Rng;
use tracing::info;

use crate::agent::roll_between;
use crate::config::LifecycleConfig;
use crate::error::AgentError;
use crate::pool::AgentPool;

/// Why an agent died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Age reached the lifespan.
    OldAge,
    /// Removed by the host.
    Removed,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OldAge => write!(f, "old_age"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// What is left of an agent after it dies.
#[derive(Debug, Clone, PartialEq)]
pub struct DeathRecord {
    /// The slot the agent held.
    pub handle: AgentHandle,
    /// The agent's lifetime ID.
    pub agent_id: AgentId,
    /// Display name.
    pub name: String,
    /// Age at death.
    pub final_age: f64,
    /// Cause of death.
    pub cause: DeathCause,
    /// Town the agent belonged to.
    pub town: Option<TownId>,
}

/// Detach `handle` from everything and release its slot.
///
/// A surviving partner goes through the same cooldown as after a breakup.
pub fn terminate(
    pool: &mut AgentPool,
    towns: &mut [Town],
    handle: AgentHandle,
    cause: DeathCause,
    life: &LifecycleConfig,
    rng: &mut impl Rng,
) -> Result<DeathRecord, AgentError> {
    let agent = pool.try_get(handle)?;
    let town_id = agent.town;
    let partner = agent.partner();
    let following = agent.following;
    let followers: Vec<AgentHandle> = agent.followers.iter().copied().collect();
    let children = agent.children.clone();
    let parent = agent.parent;

    if let Some(town) = towns.iter_mut().find(|t| Some(t.id) == town_id)
        && town.is_member(handle)
    {
        town.remove_member(handle)?;
    }

    if let Some(p) = partner.and_then(|p| pool.get_mut(p))
        && p.partner() == Some(handle)
    {
        p.activity = Activity::Idle;
        p.target = None;
        p.timers.relation_ms = 0.0;
        p.timers.relation_cooldown_ms = roll_between(life.relation_cooldown_ms, rng);
        p.thought = Some(Thought::Heartbroken);
    }
    if let Some(leader) = following.and_then(|f| pool.get_mut(f)) {
        leader.followers.remove(&handle);
    }
    for follower in followers {
        if let Some(f) = pool.get_mut(follower)
            && f.following == Some(handle)
        {
            f.following = None;
        }
    }
    for child in children {
        if let Some(c) = pool.get_mut(child)
            && c.parent == Some(handle)
        {
            c.parent = None;
        }
    }
    if let Some(p) = parent.and_then(|p| pool.get_mut(p)) {
        p.children.retain(|c| *c != handle);
    }

    let agent = pool.release(handle)?;
    info!(
        agent = %agent.name,
        id = %agent.id,
        age = agent.age,
        cause = %cause,
        "agent died"
    );
    Ok(DeathRecord {
        handle,
        agent_id: agent.id,
        name: agent.name,
        final_age: agent.age,
        cause,
        town: agent.town,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hamlet_bank::BankConfig;
    use hamlet_types::{BuildingKind, Occupation, Position};
    use hamlet_world::TownConfig;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::agent::{Agent, SpawnParams};
    use crate::config::AgentsConfig;
    use crate::occupation::change_occupation;

    #[test]
    fn death_cuts_every_link() {
        let cfg = AgentsConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut pool = AgentPool::new(8);
        let mut towns = vec![Town::new(
            TownId::from_random_bytes([2; 16]),
            "Ashford",
            Position::default(),
            TownConfig::default(),
            BankConfig::default(),
        )];
        let town_id = towns.first().unwrap().id;
        let store = towns
            .first_mut()
            .unwrap()
            .construct(BuildingKind::Store, Position::default(), &mut rng);

        let spawn = |rng: &mut SmallRng, age: f64| {
            Agent::spawn(
                SpawnParams {
                    age: Some(age),
                    town: Some(town_id),
                    ..SpawnParams::default()
                },
                &cfg,
                rng,
            )
        };
        let dying = pool.acquire(spawn(&mut rng, 40.0)).unwrap();
        let partner = pool.acquire(spawn(&mut rng, 40.0)).unwrap();
        let child = pool.acquire(spawn(&mut rng, 4.0)).unwrap();
        let grandparent = pool.acquire(spawn(&mut rng, 70.0)).unwrap();

        {
            let town = towns.first_mut().unwrap();
            for h in [dying, partner, child, grandparent] {
                town.add_member(h).unwrap();
            }
            town.set_mayor(dying).unwrap();
            change_occupation(pool.get_mut(dying).unwrap(), dying, Some(town), Occupation::Merchant);
        }
        {
            let d = pool.get_mut(dying).unwrap();
            d.activity = Activity::InRelationship { partner };
            d.children.push(child);
            d.followers.insert(child);
            d.parent = Some(grandparent);
        }
        pool.get_mut(partner).unwrap().activity = Activity::InRelationship { partner: dying };
        {
            let c = pool.get_mut(child).unwrap();
            c.parent = Some(dying);
            c.following = Some(dying);
        }
        pool.get_mut(grandparent).unwrap().children.push(dying);

        let record = terminate(&mut pool, &mut towns, dying, DeathCause::OldAge, &cfg.lifecycle, &mut rng).unwrap();
        assert_eq!(record.town, Some(town_id));

        let town = towns.first().unwrap();
        assert!(!town.is_member(dying));
        assert!(town.mayor().is_none());
        assert!(town.building(store).unwrap().store().unwrap().employees.is_empty());
        let widow = pool.get(partner).unwrap();
        assert_eq!(widow.activity, Activity::Idle);
        assert_eq!(widow.thought, Some(Thought::Heartbroken));
        assert!((5_000.0..10_000.0).contains(&widow.timers.relation_cooldown_ms));
        assert!(pool.get(child).unwrap().parent.is_none());
        assert!(pool.get(child).unwrap().following.is_none());
        assert!(pool.get(grandparent).unwrap().children.is_empty());
        assert!(!pool.is_alive(dying));
    }

    #[test]
    fn terminating_twice_fails() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut pool = AgentPool::new(2);
        let h = pool
            .acquire(Agent::spawn(SpawnParams::default(), &AgentsConfig::default(), &mut rng))
            .unwrap();
        let life = LifecycleConfig::default();
        terminate(&mut pool, &mut [], h, DeathCause::Removed, &life, &mut rng).unwrap();
        assert!(terminate(&mut pool, &mut [], h, DeathCause::Removed, &life, &mut rng).is_err());
    }
}
