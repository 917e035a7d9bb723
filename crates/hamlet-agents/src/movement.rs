//! Walking: target selection and stepping.
//!
//! Young agents stay near whoever they follow, or near home. Everyone else
//! random-walks inside their town's radius, avoiding water. Speed is
//! normalised to a 16 ms reference frame so movement does not depend on
//! the tick length.

use std::f64::consts::TAU;

use hamlet_types::{Activity, AgentHandle, Position};
use hamlet_world::{Terrain, Town};
use rand::Rng;

use crate::agent::roll_between;
use crate::behavior::{TickContext, town_ref};
use crate::config::LifecycleConfig;
use crate::error::AgentError;

/// How far from home or a parent a young agent strays.
const HOME_STRAY: f64 = 20.0;

/// Whether `pos` is a legal walk target.
pub fn is_valid_target(pos: Position, terrain: &dyn Terrain, town: Option<&Town>) -> bool {
    terrain.is_walkable(pos) && town.is_none_or(|t| t.contains(pos))
}

/// A random point inside the walk range of `from`, or `None` after the
/// configured number of failed attempts.
pub fn random_walk_target(
    from: Position,
    terrain: &dyn Terrain,
    town: Option<&Town>,
    config: &LifecycleConfig,
    rng: &mut impl Rng,
) -> Option<Position> {
    (0..config.wander_attempts).find_map(|_| {
        let angle = rng.random_range(0.0..TAU);
        let distance = roll_between((config.wander_min, config.wander_max), rng);
        let candidate = from.offset(angle, distance);
        is_valid_target(candidate, terrain, town).then_some(candidate)
    })
}

/// Pick targets on the move timer and step towards the current target.
pub fn update_movement<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
    dt_ms: f64,
) -> Result<(), AgentError> {
    let config = ctx.config;
    let life = &config.lifecycle;

    let agent = ctx.pool.try_get(handle)?;
    let retarget = agent.timers.move_ms <= 0.0
        && matches!(agent.activity, Activity::Idle | Activity::Wandering | Activity::Working);
    let anchor = if agent.age < life.home_age {
        agent
            .following
            .and_then(|f| ctx.pool.get(f))
            .map(|leader| leader.position)
            .or(agent.home)
    } else {
        None
    };
    let (position, town_id) = (agent.position, agent.town);

    let new_target = if retarget {
        let town = town_ref(ctx.towns, town_id);
        match anchor {
            Some(anchor) => {
                let near = anchor.offset(ctx.rng.random_range(0.0..TAU), ctx.rng.random_range(0.0..HOME_STRAY));
                Some(if is_valid_target(near, ctx.terrain, None) { near } else { anchor })
            }
            None => random_walk_target(position, ctx.terrain, town, life, ctx.rng),
        }
    } else {
        None
    };

    let agent = ctx.pool.try_get_mut(handle)?;
    if retarget {
        agent.timers.move_ms = roll_between(life.move_interval_ms, ctx.rng);
        if let Some(target) = new_target {
            agent.target = Some(target);
            agent.activity = Activity::Wandering;
        }
    }

    if let Some(target) = agent.target {
        let step = life.base_speed * agent.speed_multiplier * dt_ms / life.reference_frame_ms;
        let (next, arrived) = agent.position.step_towards(target, step);
        agent.position = next;
        if arrived {
            agent.target = None;
            if agent.activity == Activity::Wandering {
                agent.activity = Activity::Idle;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hamlet_bank::{BankConfig, MonetaryPolicy};
    use hamlet_types::TownId;
    use hamlet_world::{GridTerrain, OpenTerrain, TownConfig};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::agent::{Agent, SpawnParams};
    use crate::config::AgentsConfig;
    use crate::pool::AgentPool;

    fn town() -> Town {
        Town::new(
            TownId::from_random_bytes([5; 16]),
            "Eastmere",
            Position::new(100.0, 100.0),
            TownConfig::default(),
            BankConfig::default(),
        )
    }

    #[test]
    fn walk_targets_stay_in_town_and_off_water() {
        let mut terrain = GridTerrain::new(20, 20, 20.0);
        for c in 0..20 {
            terrain.set_water(c, 0, true);
        }
        let t = town();
        let cfg = LifecycleConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            if let Some(p) = random_walk_target(Position::new(100.0, 100.0), &terrain, Some(&t), &cfg, &mut rng) {
                assert!(t.contains(p));
                assert!(!terrain.is_water(p));
            }
        }
    }

    #[test]
    fn no_target_when_everything_is_invalid() {
        let mut tiny = town();
        tiny.radius = 1.0;
        let cfg = LifecycleConfig::default();
        let mut rng = SmallRng::seed_from_u64(2);
        assert!(random_walk_target(tiny.position, &OpenTerrain, Some(&tiny), &cfg, &mut rng).is_none());
    }

    #[test]
    fn step_is_normalised_to_reference_frame() {
        let cfg = AgentsConfig::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut pool = AgentPool::new(2);
        let mut agent = Agent::spawn(SpawnParams::default(), &cfg, &mut rng);
        agent.speed_multiplier = 1.0;
        agent.target = Some(Position::new(1_000.0, 0.0));
        agent.timers.move_ms = 10_000.0;
        let h = pool.acquire(agent).unwrap();

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
        update_movement(&mut ctx, h, 32.0).unwrap();
        let a = pool.get(h).unwrap();
        assert!((a.position.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn arrival_returns_wanderer_to_idle() {
        let cfg = AgentsConfig::default();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut pool = AgentPool::new(2);
        let mut agent = Agent::spawn(SpawnParams::default(), &cfg, &mut rng);
        agent.target = Some(Position::new(0.5, 0.0));
        agent.activity = Activity::Wandering;
        agent.timers.move_ms = 10_000.0;
        let h = pool.acquire(agent).unwrap();

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
        update_movement(&mut ctx, h, 16.0).unwrap();
        let a = pool.get(h).unwrap();
        assert!(a.target.is_none());
        assert_eq!(a.activity, Activity::Idle);
    }

    #[test]
    fn young_agent_heads_home() {
        let cfg = AgentsConfig::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut pool = AgentPool::new(2);
        let home = Position::new(300.0, 300.0);
        let mut agent = Agent::spawn(
            SpawnParams {
                age: Some(4.0),
                home: Some(home),
                ..SpawnParams::default()
            },
            &cfg,
            &mut rng,
        );
        agent.timers.move_ms = 0.0;
        let h = pool.acquire(agent).unwrap();

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
        update_movement(&mut ctx, h, 16.0).unwrap();
        let target = pool.get(h).unwrap().target.unwrap();
        assert!(target.distance(home) <= HOME_STRAY + 1e-9);
    }
}
