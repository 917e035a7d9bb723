//! The per-tick agent state machine.
//!
//! [`update_agent`] runs one agent through a fixed sequence of phases:
//!
//! 1. **Gate** -- agents outside the active radius are skipped.
//! 2. **Timers** -- every countdown advances.
//! 3. **Age** -- the agent ages; at its lifespan it dies and the update
//!    stops.
//! 4. **Thought** -- an idle thought is re-rolled on its timer.
//! 5. **Movement or relationship** -- single agents walk and look for a
//!    partner; paired agents stay with their partner.
//! 6. **Occupation** -- children come of age; workers act on their timer.
//! 7. **Town** -- unaffiliated agents look for a town to join.
//! 8. **Needs** -- hunger and food seeking.
//! 9. **Banking** -- periodic deposits, repayments, and emergency loans.
//!
//! All shared state an update touches is passed in through a
//! [`TickContext`]; nothing is global.

use hamlet_bank::MonetaryPolicy;
use hamlet_types::{Activity, AgentHandle, Occupation, Position, Thought, TownId};
use hamlet_world::{Terrain, Town};
use rand::Rng;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;

use crate::agent::roll_between;
use crate::config::AgentsConfig;
use crate::death::{DeathCause, DeathRecord, terminate};
use crate::error::AgentError;
use crate::occupation::{change_occupation, market_occupation};
use crate::pool::AgentPool;
use crate::{banking, membership, movement, needs, social, work};

// ---------------------------------------------------------------------------
// Context and results
// ---------------------------------------------------------------------------

/// Everything an agent update may read or change.
pub struct TickContext<'a, R: Rng> {
    /// Every agent.
    pub pool: &'a mut AgentPool,
    /// Every town, in creation order.
    pub towns: &'a mut [Town],
    /// Read-only terrain.
    pub terrain: &'a dyn Terrain,
    /// The simulation RNG.
    pub rng: &'a mut R,
    /// Current federal rate.
    pub policy: MonetaryPolicy,
    /// Agent tunables.
    pub config: &'a AgentsConfig,
    /// Current tick number, starting at 1.
    pub tick: u64,
    /// Centre of the active radius, when one is set.
    pub focus: Option<Position>,
    /// Notable things that happened, in order.
    pub events: Vec<AgentEvent>,
}

impl<R: Rng> TickContext<'_, R> {
    /// Take the events recorded so far.
    pub fn drain_events(&mut self) -> Vec<AgentEvent> {
        std::mem::take(&mut self.events)
    }
}

/// A notable change made by an agent update.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// An agent changed occupation.
    OccupationChanged {
        /// The agent.
        agent: AgentHandle,
        /// Previous occupation.
        from: Occupation,
        /// New occupation.
        to: Occupation,
    },
    /// An agent was paid for a work action.
    Paid {
        /// The agent.
        agent: AgentHandle,
        /// Amount paid, bonus included.
        wage: Decimal,
    },
    /// A child was born.
    Born {
        /// The newborn.
        child: AgentHandle,
        /// Its mother.
        mother: AgentHandle,
    },
    /// An agent joined a town.
    JoinedTown {
        /// The agent.
        agent: AgentHandle,
        /// The town.
        town: TownId,
    },
    /// Two agents paired up.
    Paired {
        /// The agent that started it.
        agent: AgentHandle,
        /// Its new partner.
        partner: AgentHandle,
    },
    /// A relationship ended.
    Separated {
        /// The agent whose timer ran out.
        agent: AgentHandle,
        /// The former partner.
        partner: AgentHandle,
    },
    /// An agent died.
    Died(DeathRecord),
}

/// How an update ended for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    /// Already updated this tick.
    Skipped,
    /// Outside the active radius.
    Inactive,
    /// Updated and still alive.
    Alive,
    /// Died during the update.
    Died,
}

/// The town with `id`, if any.
pub(crate) fn town_mut(towns: &mut [Town], id: Option<TownId>) -> Option<&mut Town> {
    let id = id?;
    towns.iter_mut().find(|t| t.id == id)
}

/// Read-only [`town_mut`].
pub(crate) fn town_ref(towns: &[Town], id: Option<TownId>) -> Option<&Town> {
    let id = id?;
    towns.iter().find(|t| t.id == id)
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Run one agent through one tick of `dt_ms`.
pub fn update_agent<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
    dt_ms: f64,
) -> Result<AgentStatus, AgentError> {
    let config = ctx.config;
    let life = &config.lifecycle;
    let tick = ctx.tick;
    let focus = ctx.focus.zip(life.active_radius);

    let agent = ctx.pool.try_get_mut(handle)?;
    if agent.last_tick == tick {
        return Ok(AgentStatus::Skipped);
    }
    agent.last_tick = tick;
    if let Some((centre, radius)) = focus
        && agent.position.distance(centre) > radius
    {
        return Ok(AgentStatus::Inactive);
    }

    agent.timers.tick(dt_ms);

    agent.age += dt_ms * life.age_per_ms;
    if agent.age >= agent.max_age {
        let record = terminate(ctx.pool, ctx.towns, handle, DeathCause::OldAge, life, ctx.rng)?;
        ctx.events.push(AgentEvent::Died(record));
        return Ok(AgentStatus::Died);
    }

    if agent.timers.thought_ms <= 0.0 {
        agent.timers.thought_ms = roll_between(life.thought_interval_ms, ctx.rng);
        if matches!(agent.activity, Activity::Idle | Activity::Wandering) {
            agent.thought = Thought::IDLE.choose(ctx.rng).copied();
        }
    }

    let activity = agent.activity;
    if activity.partner().is_some() {
        social::update_relationship(ctx, handle, dt_ms)?;
    } else if !activity.in_minigame() {
        movement::update_movement(ctx, handle, dt_ms)?;
        social::try_form_relationship(ctx, handle)?;
    }

    update_occupation(ctx, handle)?;
    membership::try_join_town(ctx, handle)?;
    needs::update_needs(ctx, handle, dt_ms)?;
    banking::update_banking(ctx, handle)?;

    Ok(AgentStatus::Alive)
}

/// Coming of age and periodic work.
fn update_occupation<R: Rng>(ctx: &mut TickContext<'_, R>, handle: AgentHandle) -> Result<(), AgentError> {
    let config = ctx.config;
    let life = &config.lifecycle;
    let agent = ctx.pool.try_get(handle)?;

    if agent.occupation == Occupation::Child && !agent.is_child(life) {
        let town_id = agent.town;
        let occupation = market_occupation(
            ctx.pool,
            town_ref(ctx.towns, town_id),
            &config.occupations,
            ctx.rng,
        );
        assign(ctx, handle, occupation)?;
        let agent = ctx.pool.try_get_mut(handle)?;
        if let Some(leader) = agent.following.take()
            && let Some(l) = ctx.pool.get_mut(leader)
        {
            l.followers.remove(&handle);
        }
        return Ok(());
    }

    let agent = ctx.pool.try_get_mut(handle)?;
    if agent.is_child(life)
        || agent.in_relationship()
        || agent.activity.in_minigame()
        || !agent.occupation.is_working()
        || agent.timers.work_ms > 0.0
    {
        return Ok(());
    }
    agent.timers.work_ms = roll_between(life.work_interval_ms, ctx.rng);

    let outcome = work::perform_work(ctx, handle)?;
    if outcome.wage > Decimal::ZERO {
        ctx.events.push(AgentEvent::Paid {
            agent: handle,
            wage: outcome.wage,
        });
    }
    Ok(())
}

/// Change `handle`'s occupation and record the change.
pub(crate) fn assign<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
    occupation: Occupation,
) -> Result<(), AgentError> {
    let agent = ctx.pool.try_get_mut(handle)?;
    let town = town_mut(ctx.towns, agent.town);
    if let Some(from) = change_occupation(agent, handle, town, occupation) {
        ctx.events.push(AgentEvent::OccupationChanged {
            agent: handle,
            from,
            to: occupation,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hamlet_bank::BankConfig;
    use hamlet_types::BuildingKind;
    use hamlet_world::{OpenTerrain, TownConfig};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::agent::{Agent, SpawnParams};

    fn town() -> Town {
        Town::new(
            TownId::from_random_bytes([4; 16]),
            "Millbrook",
            Position::default(),
            TownConfig::default(),
            BankConfig::default(),
        )
    }

    #[test]
    fn agent_dies_at_lifespan() {
        let cfg = AgentsConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut pool = AgentPool::new(4);
        let mut towns = vec![town()];
        let town_id = towns.first().unwrap().id;
        let mut agent = Agent::spawn(
            SpawnParams {
                age: Some(30.0),
                town: Some(town_id),
                ..SpawnParams::default()
            },
            &cfg,
            &mut rng,
        );
        agent.max_age = 30.05;
        let h = pool.acquire(agent).unwrap();
        towns.first_mut().unwrap().add_member(h).unwrap();

        let mut ctx = TickContext {
            pool: &mut pool,
            towns: &mut towns,
            terrain: &OpenTerrain,
            rng: &mut rng,
            policy: MonetaryPolicy::default(),
            config: &cfg,
            tick: 1,
            focus: None,
            events: Vec::new(),
        };
        // 1000 ms ages the agent by 0.1 years.
        assert_eq!(update_agent(&mut ctx, h, 1_000.0).unwrap(), AgentStatus::Died);
        let events = ctx.drain_events();
        assert!(matches!(events.as_slice(), [AgentEvent::Died(r)] if r.cause == DeathCause::OldAge));
        assert!(!pool.is_alive(h));
        assert_eq!(towns.first().unwrap().population(), 0);
    }

    #[test]
    fn second_update_in_same_tick_is_skipped() {
        let cfg = AgentsConfig::default();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut pool = AgentPool::new(4);
        let h = pool
            .acquire(Agent::spawn(SpawnParams::default(), &cfg, &mut rng))
            .unwrap();
        let mut ctx = TickContext {
            pool: &mut pool,
            towns: &mut [],
            terrain: &OpenTerrain,
            rng: &mut rng,
            policy: MonetaryPolicy::default(),
            config: &cfg,
            tick: 1,
            focus: None,
            events: Vec::new(),
        };
        assert_eq!(update_agent(&mut ctx, h, 16.0).unwrap(), AgentStatus::Alive);
        assert_eq!(update_agent(&mut ctx, h, 16.0).unwrap(), AgentStatus::Skipped);
    }

    #[test]
    fn hungry_agent_walks_to_a_distant_store_and_eats() {
        let cfg = AgentsConfig::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut pool = AgentPool::new(4);
        let mut towns = vec![town()];
        let store = towns
            .first_mut()
            .unwrap()
            .construct(BuildingKind::Store, Position::new(80.0, 0.0), &mut rng);
        let stock = towns.first().unwrap().building(store).unwrap().store().unwrap().inventory;
        let town_id = towns.first().unwrap().id;
        let mut agent = Agent::spawn(
            SpawnParams {
                age: Some(30.0),
                occupation: Some(Occupation::Guard),
                town: Some(town_id),
                ..SpawnParams::default()
            },
            &cfg,
            &mut rng,
        );
        agent.hunger = 71.0;
        agent.happiness = 50.0;
        agent.money = Decimal::new(25, 0);
        agent.speed_multiplier = 1.0;
        agent.timers.move_ms = 1e9;
        agent.timers.work_ms = 1e9;
        agent.timers.banking_ms = 1e9;
        let h = pool.acquire(agent).unwrap();
        towns.first_mut().unwrap().add_member(h).unwrap();

        let mut ticks = 0_u32;
        for tick in 1..=100 {
            let mut ctx = TickContext {
                pool: &mut pool,
                towns: &mut towns,
                terrain: &OpenTerrain,
                rng: &mut rng,
                policy: MonetaryPolicy::default(),
                config: &cfg,
                tick,
                focus: None,
                events: Vec::new(),
            };
            assert_eq!(update_agent(&mut ctx, h, 100.0).unwrap(), AgentStatus::Alive);
            ticks += 1;
            if pool.get(h).unwrap().money != Decimal::new(25, 0) {
                break;
            }
        }

        // 6.25 units per 100 ms tick covers the 60 units to reach in 10 ticks.
        assert!(ticks > 1 && ticks < 20, "bought after {ticks} ticks");
        let a = pool.get(h).unwrap();
        assert_eq!(a.money, Decimal::new(15, 0));
        let expected_hunger = 0.1_f64.mul_add(f64::from(ticks), 71.0) - 40.0;
        assert!((a.hunger - expected_hunger).abs() < 1e-6);
        assert!((a.happiness - 60.0).abs() < 1e-9);
        assert_eq!(a.activity, Activity::Idle);
        assert_eq!(a.target, None);
        assert!(a.position.distance(Position::new(80.0, 0.0)) <= cfg.needs.reach);
        let s = towns.first().unwrap().building(store).unwrap().store().unwrap();
        assert_eq!(s.inventory, stock.saturating_sub(1));
        assert_eq!(s.customers, 1);
    }

    #[test]
    fn far_agents_are_inactive() {
        let mut cfg = AgentsConfig::default();
        cfg.lifecycle.active_radius = Some(100.0);
        let mut rng = SmallRng::seed_from_u64(3);
        let mut pool = AgentPool::new(4);
        let h = pool
            .acquire(Agent::spawn(
                SpawnParams {
                    position: Position::new(500.0, 0.0),
                    ..SpawnParams::default()
                },
                &cfg,
                &mut rng,
            ))
            .unwrap();
        let age_before = pool.get(h).unwrap().age;
        let mut ctx = TickContext {
            pool: &mut pool,
            towns: &mut [],
            terrain: &OpenTerrain,
            rng: &mut rng,
            policy: MonetaryPolicy::default(),
            config: &cfg,
            tick: 1,
            focus: Some(Position::default()),
            events: Vec::new(),
        };
        assert_eq!(update_agent(&mut ctx, h, 1_000.0).unwrap(), AgentStatus::Inactive);
        assert!((pool.get(h).unwrap().age - age_before).abs() < f64::EPSILON);
    }

    #[test]
    fn child_coming_of_age_takes_missing_doctor_role() {
        let cfg = AgentsConfig::default();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut pool = AgentPool::new(16);
        let mut towns = vec![town()];
        let town_id = towns.first().unwrap().id;

        for occupation in Occupation::WORKING {
            if occupation == Occupation::Doctor {
                continue;
            }
            let h = pool
                .acquire(Agent::spawn(
                    SpawnParams {
                        age: Some(30.0),
                        occupation: Some(occupation),
                        town: Some(town_id),
                        ..SpawnParams::default()
                    },
                    &cfg,
                    &mut rng,
                ))
                .unwrap();
            towns.first_mut().unwrap().add_member(h).unwrap();
        }
        let mut child = Agent::spawn(
            SpawnParams {
                age: Some(12.99),
                town: Some(town_id),
                ..SpawnParams::default()
            },
            &cfg,
            &mut rng,
        );
        child.max_age = 90.0;
        let child_handle = pool.acquire(child).unwrap();
        towns.first_mut().unwrap().add_member(child_handle).unwrap();
        assert_eq!(pool.get(child_handle).unwrap().occupation, Occupation::Child);

        let mut ctx = TickContext {
            pool: &mut pool,
            towns: &mut towns,
            terrain: &OpenTerrain,
            rng: &mut rng,
            policy: MonetaryPolicy::default(),
            config: &cfg,
            tick: 1,
            focus: None,
            events: Vec::new(),
        };
        // 200 ms ages the child by 0.02 years, past 13.
        update_agent(&mut ctx, child_handle, 200.0).unwrap();
        let events = ctx.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            AgentEvent::OccupationChanged { agent, to: Occupation::Doctor, .. } if *agent == child_handle
        )));
        assert_eq!(pool.get(child_handle).unwrap().occupation, Occupation::Doctor);
    }
}
