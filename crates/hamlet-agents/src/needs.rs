//! Hunger and food seeking.
//!
//! Hunger grows with time. Past the threshold an agent tries, in order:
//!
//! 1. eating from its own inventory;
//! 2. if it is a child with a living parent, asking the parent;
//! 3. buying a meal at the nearest stocked store;
//! 4. looking for work, or heading to the workplace it already has.
//!
//! Only the first step happens on the spot. The others walk the agent
//! towards someone or something and complete once it is within reach.

use hamlet_types::{Activity, AgentHandle, Occupation, Position, Thought};
use hamlet_world::Building;
use rand::Rng;
use tracing::debug;

use crate::agent::Agent;
use crate::behavior::{TickContext, assign, town_mut, town_ref};
use crate::error::AgentError;
use crate::occupation::market_occupation;

/// Accumulate hunger and act on it.
pub fn update_needs<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
    dt_ms: f64,
) -> Result<(), AgentError> {
    let config = ctx.config;
    let needs = &config.needs;

    let agent = ctx.pool.try_get_mut(handle)?;
    agent.hunger += needs.hunger_rate * dt_ms.max(0.0);
    if agent.hunger < needs.hunger_threshold {
        return Ok(());
    }

    if agent.take_one().is_some() {
        agent.hunger = (agent.hunger - needs.inventory_meal).max(0.0);
        agent.adjust_happiness(needs.inventory_happiness);
        agent.thought = Some(Thought::HappyFed);
        return Ok(());
    }

    // Paired or playing agents only eat what they carry.
    if agent.in_relationship() || agent.activity.in_minigame() {
        return Ok(());
    }

    let parent = agent.parent.filter(|_| agent.is_child(&config.lifecycle));
    if let Some(parent) = parent.filter(|p| ctx.pool.is_alive(*p)) {
        return ask_parent(ctx, handle, parent);
    }

    if buy_food(ctx, handle)? {
        return Ok(());
    }
    seek_work(ctx, handle)
}

/// Walk to the parent and get fed, or worry the parent.
fn ask_parent<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
    parent: AgentHandle,
) -> Result<(), AgentError> {
    let config = ctx.config;
    let needs = &config.needs;

    let parent_pos = ctx.pool.try_get(parent)?.position;
    let child = ctx.pool.try_get_mut(handle)?;
    if child.timers.food_retry_ms > 0.0 {
        return Ok(());
    }
    child.target = Some(parent_pos);
    child.activity = Activity::SeekingFood;
    child.thought = Some(Thought::AskingParentForFood);
    if child.position.distance(parent_pos) > needs.reach {
        return Ok(());
    }
    let hunger = child.hunger;

    let p = ctx.pool.try_get_mut(parent)?;
    let fed = if p.take_one().is_some() {
        true
    } else if p.money >= needs.meal_price {
        p.spend(needs.meal_price)?;
        true
    } else {
        false
    };

    if fed {
        debug!(parent = %p.name, "fed child");
        let child = ctx.pool.try_get_mut(handle)?;
        child.hunger = (child.hunger - needs.bought_meal).max(0.0);
        child.adjust_happiness(needs.bought_happiness);
        child.thought = Some(Thought::HappyFed);
        child.activity = Activity::Idle;
        child.target = None;
        child.timers.food_retry_ms = needs.parent_retry_for(hunger);
        return Ok(());
    }

    if hunger > needs.starving_hunger {
        p.thought = Some(Thought::VeryWorriedAboutChild);
        p.adjust_happiness(-needs.worried_parent_penalty);
    } else {
        p.thought = Some(Thought::WorriedAboutChild);
    }
    let (parent_unemployed, parent_town) = (p.occupation == Occupation::Unemployed, p.town);
    if parent_unemployed {
        let occupation = market_occupation(
            ctx.pool,
            town_ref(ctx.towns, parent_town),
            &config.occupations,
            ctx.rng,
        );
        assign(ctx, parent, occupation)?;
        ctx.pool.try_get_mut(parent)?.thought = Some(Thought::MustWorkForChild);
    }
    let child = ctx.pool.try_get_mut(handle)?;
    child.timers.food_retry_ms = needs.parent_failed_retry_ms;
    child.activity = Activity::Idle;
    child.target = None;
    Ok(())
}

fn stocked_store(b: &Building) -> bool {
    b.store().is_some_and(|s| s.inventory > 0)
}

/// Head to the nearest stocked store and buy a meal on arrival.
///
/// Returns `false` when the agent cannot afford a meal or there is no
/// stocked store in its town; an errand already under way is dropped.
fn buy_food<R: Rng>(ctx: &mut TickContext<'_, R>, handle: AgentHandle) -> Result<bool, AgentError> {
    let config = ctx.config;
    let needs = &config.needs;

    let agent = ctx.pool.try_get(handle)?;
    let (pos, town_id) = (agent.position, agent.town);
    let store = town_ref(ctx.towns, town_id)
        .filter(|_| agent.money >= needs.meal_price)
        .and_then(|t| t.find_nearest_building(pos, stocked_store))
        .map(|b| (b.id, b.position));
    let Some((store_id, store_pos)) = store else {
        abandon_errand(ctx.pool.try_get_mut(handle)?);
        return Ok(false);
    };

    let agent = ctx.pool.try_get_mut(handle)?;
    agent.target = Some(store_pos);
    agent.activity = Activity::SeekingFood;
    agent.thought = Some(Thought::GettingFood);
    if pos.distance(store_pos) > needs.reach {
        return Ok(true);
    }

    let Some(town) = town_mut(ctx.towns, town_id) else {
        return Ok(false);
    };
    town.sell_food(store_id)?;
    agent.spend(needs.meal_price)?;
    agent.hunger = (agent.hunger - needs.bought_meal).max(0.0);
    agent.adjust_happiness(needs.bought_happiness);
    agent.thought = Some(Thought::HappyFed);
    agent.activity = Activity::Idle;
    agent.target = None;
    debug!(agent = %agent.name, town = %town.name, "bought a meal");
    Ok(true)
}

/// Earn money for food: join the labor market or go to work.
fn seek_work<R: Rng>(ctx: &mut TickContext<'_, R>, handle: AgentHandle) -> Result<(), AgentError> {
    let config = ctx.config;
    let agent = ctx.pool.try_get(handle)?;
    let (occupation, town_id, workplace) = (agent.occupation, agent.town, agent.workplace);

    if occupation == Occupation::Unemployed {
        let next = market_occupation(
            ctx.pool,
            town_ref(ctx.towns, town_id),
            &config.occupations,
            ctx.rng,
        );
        assign(ctx, handle, next)?;
        ctx.pool.try_get_mut(handle)?.thought = Some(Thought::LookingForWork);
        return Ok(());
    }

    let site: Option<Position> = workplace
        .and_then(|id| town_ref(ctx.towns, town_id)?.building(id))
        .map(|b| b.position);
    if occupation.is_working()
        && let Some(site) = site
    {
        let agent = ctx.pool.try_get_mut(handle)?;
        agent.target = Some(site);
        agent.activity = Activity::Working;
        agent.thought = Some(Thought::GoingToWork);
    } else {
        abandon_errand(ctx.pool.try_get_mut(handle)?);
    }
    Ok(())
}

/// Drop an unfinished food errand so wandering and banking resume.
fn abandon_errand(agent: &mut Agent) {
    if agent.activity == Activity::SeekingFood {
        agent.activity = Activity::Idle;
        agent.target = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hamlet_bank::{BankConfig, MonetaryPolicy};
    use hamlet_types::{BuildingKind, TownId};
    use hamlet_world::{OpenTerrain, Town, TownConfig};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rust_decimal::Decimal;

    use super::*;
    use crate::agent::{Agent, SpawnParams};
    use crate::config::AgentsConfig;
    use crate::pool::AgentPool;

    struct World {
        cfg: AgentsConfig,
        rng: SmallRng,
        pool: AgentPool,
        towns: Vec<Town>,
    }

    impl World {
        fn new(seed: u64) -> Self {
            Self {
                cfg: AgentsConfig::default(),
                rng: SmallRng::seed_from_u64(seed),
                pool: AgentPool::new(8),
                towns: vec![Town::new(
                    TownId::from_random_bytes([8; 16]),
                    "Fernvale",
                    Position::default(),
                    TownConfig::default(),
                    BankConfig::default(),
                )],
            }
        }

        fn add(&mut self, age: f64, occupation: Occupation, pos: Position) -> AgentHandle {
            let town = self.towns.first().unwrap().id;
            let mut a = Agent::spawn(
                SpawnParams {
                    position: pos,
                    age: Some(age),
                    occupation: Some(occupation),
                    town: Some(town),
                    ..SpawnParams::default()
                },
                &self.cfg,
                &mut self.rng,
            );
            a.money = Decimal::ZERO;
            a.happiness = 50.0;
            let h = self.pool.acquire(a).unwrap();
            self.towns.first_mut().unwrap().add_member(h).unwrap();
            h
        }

        fn tick(&mut self, h: AgentHandle, dt_ms: f64) {
            let mut ctx = TickContext {
                pool: &mut self.pool,
                towns: &mut self.towns,
                terrain: &OpenTerrain,
                rng: &mut self.rng,
                policy: MonetaryPolicy::default(),
                config: &self.cfg,
                tick: 1,
                focus: None,
                events: Vec::new(),
            };
            update_needs(&mut ctx, h, dt_ms).unwrap();
        }
    }

    #[test]
    fn hunger_grows_without_action_below_threshold() {
        let mut w = World::new(1);
        let h = w.add(30.0, Occupation::Guard, Position::default());
        w.pool.get_mut(h).unwrap().hunger = 0.0;
        w.tick(h, 10_000.0);
        let a = w.pool.get(h).unwrap();
        assert!((a.hunger - 10.0).abs() < 1e-9);
        assert_eq!(a.activity, Activity::Idle);
    }

    #[test]
    fn carried_food_is_eaten_first() {
        let mut w = World::new(2);
        let h = w.add(30.0, Occupation::Guard, Position::default());
        let a = w.pool.get_mut(h).unwrap();
        a.hunger = 75.0;
        a.stow("bread", 1);
        w.tick(h, 0.0);
        let a = w.pool.get(h).unwrap();
        assert!((a.hunger - 45.0).abs() < 1e-9);
        assert!((a.happiness - 55.0).abs() < 1e-9);
        assert!(!a.has_food());
    }

    #[test]
    fn buying_a_meal_at_a_nearby_store() {
        let mut w = World::new(3);
        let mut rng = SmallRng::seed_from_u64(30);
        let store = w
            .towns
            .first_mut()
            .unwrap()
            .construct(BuildingKind::Store, Position::new(10.0, 0.0), &mut rng);
        let h = w.add(30.0, Occupation::Guard, Position::default());
        let a = w.pool.get_mut(h).unwrap();
        a.hunger = 70.0;
        a.money = Decimal::new(10, 0);
        let stock = w.towns.first().unwrap().building(store).unwrap().store().unwrap().inventory;

        w.tick(h, 0.0);
        let a = w.pool.get(h).unwrap();
        assert_eq!(a.money, Decimal::ZERO);
        assert!((a.hunger - 30.0).abs() < 1e-9);
        assert!((a.happiness - 60.0).abs() < 1e-9);
        let s = w.towns.first().unwrap().building(store).unwrap().store().unwrap();
        assert_eq!(s.inventory, stock.saturating_sub(1));
        assert_eq!(s.customers, 1);
    }

    #[test]
    fn distant_store_sets_a_target() {
        let mut w = World::new(4);
        let mut rng = SmallRng::seed_from_u64(40);
        w.towns
            .first_mut()
            .unwrap()
            .construct(BuildingKind::Store, Position::new(80.0, 0.0), &mut rng);
        let h = w.add(30.0, Occupation::Guard, Position::default());
        let a = w.pool.get_mut(h).unwrap();
        a.hunger = 71.0;
        a.money = Decimal::new(25, 0);

        w.tick(h, 0.0);
        let a = w.pool.get(h).unwrap();
        assert_eq!(a.target, Some(Position::new(80.0, 0.0)));
        assert_eq!(a.activity, Activity::SeekingFood);
        assert_eq!(a.money, Decimal::new(25, 0));
    }

    #[test]
    fn parent_pays_for_child_meal() {
        let mut w = World::new(5);
        let parent = w.add(30.0, Occupation::Farmer, Position::default());
        w.pool.get_mut(parent).unwrap().money = Decimal::new(15, 0);
        let child = w.add(6.0, Occupation::Child, Position::new(5.0, 0.0));
        let c = w.pool.get_mut(child).unwrap();
        c.parent = Some(parent);
        c.hunger = 85.0;
        c.timers.food_retry_ms = 0.0;

        w.tick(child, 0.0);
        assert_eq!(w.pool.get(parent).unwrap().money, Decimal::new(5, 0));
        let c = w.pool.get(child).unwrap();
        assert!((c.hunger - 45.0).abs() < 1e-9);
        assert!((c.timers.food_retry_ms - 4_000.0).abs() < 1e-9);
    }

    #[test]
    fn broke_unemployed_parent_takes_a_job() {
        let mut w = World::new(6);
        let parent = w.add(30.0, Occupation::Unemployed, Position::default());
        let child = w.add(6.0, Occupation::Child, Position::new(5.0, 0.0));
        let c = w.pool.get_mut(child).unwrap();
        c.parent = Some(parent);
        c.hunger = 95.0;
        c.timers.food_retry_ms = 0.0;

        w.tick(child, 0.0);
        let p = w.pool.get(parent).unwrap();
        assert!(p.occupation.is_working());
        assert_eq!(p.thought, Some(Thought::MustWorkForChild));
        assert!((p.happiness - 40.0).abs() < 1e-9);
        let c = w.pool.get(child).unwrap();
        assert!((c.timers.food_retry_ms - 15_000.0).abs() < 1e-9);
        assert_eq!(c.activity, Activity::Idle);
        assert_eq!(c.target, None);
    }

    #[test]
    fn store_selling_out_mid_walk_ends_the_errand() {
        let mut w = World::new(8);
        let mut rng = SmallRng::seed_from_u64(80);
        let store = w
            .towns
            .first_mut()
            .unwrap()
            .construct(BuildingKind::Store, Position::new(80.0, 0.0), &mut rng);
        let h = w.add(30.0, Occupation::Guard, Position::default());
        let a = w.pool.get_mut(h).unwrap();
        a.hunger = 71.0;
        a.money = Decimal::new(25, 0);
        w.tick(h, 0.0);
        assert_eq!(w.pool.get(h).unwrap().activity, Activity::SeekingFood);

        w.towns
            .first_mut()
            .unwrap()
            .building_mut(store)
            .and_then(Building::store_mut)
            .unwrap()
            .inventory = 0;
        w.tick(h, 0.0);
        let a = w.pool.get(h).unwrap();
        assert_eq!(a.activity, Activity::Idle);
        assert_eq!(a.target, None);
        assert_eq!(a.money, Decimal::new(25, 0));
    }

    #[test]
    fn running_out_of_money_ends_the_errand() {
        let mut w = World::new(9);
        let h = w.add(30.0, Occupation::Guard, Position::default());
        let a = w.pool.get_mut(h).unwrap();
        a.hunger = 90.0;
        a.activity = Activity::SeekingFood;
        a.target = Some(Position::new(200.0, 0.0));

        w.tick(h, 0.0);
        let a = w.pool.get(h).unwrap();
        assert_eq!(a.workplace, None);
        assert_eq!(a.activity, Activity::Idle);
        assert_eq!(a.target, None);
    }

    #[test]
    fn wandering_resumes_after_a_failed_errand() {
        let mut w = World::new(10);
        let h = w.add(30.0, Occupation::Guard, Position::default());
        let a = w.pool.get_mut(h).unwrap();
        a.hunger = 90.0;
        a.activity = Activity::SeekingFood;
        a.target = Some(Position::new(200.0, 0.0));
        a.timers.move_ms = 0.0;
        w.tick(h, 0.0);

        let mut ctx = TickContext {
            pool: &mut w.pool,
            towns: &mut w.towns,
            terrain: &OpenTerrain,
            rng: &mut w.rng,
            policy: MonetaryPolicy::default(),
            config: &w.cfg,
            tick: 2,
            focus: None,
            events: Vec::new(),
        };
        crate::movement::update_movement(&mut ctx, h, 16.0).unwrap();
        let a = w.pool.get(h).unwrap();
        assert_eq!(a.activity, Activity::Wandering);
        assert!(a.target.is_some());
    }

    #[test]
    fn penniless_unemployed_adult_looks_for_work() {
        let mut w = World::new(7);
        let h = w.add(30.0, Occupation::Unemployed, Position::default());
        w.pool.get_mut(h).unwrap().hunger = 80.0;
        w.tick(h, 0.0);
        let a = w.pool.get(h).unwrap();
        assert!(a.occupation.is_working());
        assert_eq!(a.thought, Some(Thought::LookingForWork));
    }
}
