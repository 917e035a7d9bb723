//! Occupation actions and wages.
//!
//! Each working occupation has one action, run when the agent's work timer
//! fires. A successful action pays `wage * action_wage_fraction *
//! multiplier`, where the multiplier combines trait bonuses with whatever
//! the action itself earned (a completed building, a healed patient, a big
//! congregation). Failed actions pay nothing; most of them send the agent
//! walking towards where the work is.
//!
//! | Occupation | Succeeds when | Extra multiplier |
//! |------------|---------------|------------------|
//! | Farmer     | at a farm     | -- |
//! | Guard      | always        | -- |
//! | Doctor     | an elder is nearby | healing |
//! | Teacher    | a student is nearby | passing on a trait |
//! | Builder    | at a construction site | completing it |
//! | Merchant   | at a store    | customers served |
//! | Priest     | townspeople are nearby | people reached |
//! | Artist     | by chance     | random payout |

use std::f64::consts::TAU;

use hamlet_types::{Activity, AgentHandle, AgentTrait, BuildingId, Occupation, Position, Thought, TownId};
use hamlet_world::Building;
use rand::Rng;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use tracing::debug;

use crate::behavior::{TickContext, town_mut};
use crate::error::AgentError;

/// The result of one work action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkOutcome {
    /// Whether the action counted as work done.
    pub succeeded: bool,
    /// Total paid, bonus included. Zero on failure.
    pub wage: Decimal,
    /// Whether the bonus fired.
    pub bonus: bool,
}

impl WorkOutcome {
    const FAILED: Self = Self {
        succeeded: false,
        wage: Decimal::ZERO,
        bonus: false,
    };
}

/// What an agent's action needs to know about it.
#[derive(Debug, Clone, Copy)]
struct Worker {
    handle: AgentHandle,
    position: Position,
    town: Option<TownId>,
    workplace: Option<BuildingId>,
}

/// Run `handle`'s occupation action and pay it.
pub fn perform_work<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
) -> Result<WorkOutcome, AgentError> {
    let config = ctx.config;
    let occ = &config.occupations;
    let agent = ctx.pool.try_get(handle)?;
    let occupation = agent.occupation;
    let worker = Worker {
        handle,
        position: agent.position,
        town: agent.town,
        workplace: agent.workplace,
    };

    let multiplier = match occupation {
        Occupation::Farmer => farm(ctx, worker)?,
        Occupation::Guard => Some(patrol(ctx, worker)?),
        Occupation::Doctor => heal(ctx, worker)?,
        Occupation::Teacher => teach(ctx, worker)?,
        Occupation::Builder => build(ctx, worker)?,
        Occupation::Merchant => sell(ctx, worker)?,
        Occupation::Priest => preach(ctx, worker)?,
        Occupation::Artist => make_art(ctx, worker)?,
        Occupation::Child | Occupation::Unemployed => None,
    };
    let Some(mut multiplier) = multiplier else {
        return Ok(WorkOutcome::FAILED);
    };

    let agent = ctx.pool.try_get(handle)?;
    if agent.has_trait(AgentTrait::Wise) {
        multiplier *= occ.wise_multiplier;
    }
    if agent.has_trait(AgentTrait::Fast) {
        multiplier *= occ.fast_multiplier;
    }
    let lucky = agent.has_trait(AgentTrait::Lucky);

    let mut wage = action_wage(occ.wage(occupation), occ.action_wage_fraction, multiplier)?;
    let bonus = ctx.rng.random_bool(occ.bonus_chance.clamp(0.0, 1.0));
    if bonus {
        let extra = if lucky {
            wage.checked_mul(Decimal::TWO)
        } else {
            Some(wage)
        };
        wage = extra
            .and_then(|e| wage.checked_add(e))
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: String::from("work bonus"),
            })?;
    }

    let agent = ctx.pool.try_get_mut(handle)?;
    agent.earn(wage)?;
    agent.last_paycheck = wage;
    agent.activity = Activity::Working;
    debug!(agent = %agent.name, occupation = %occupation, wage = %wage, bonus, "paid for work");

    Ok(WorkOutcome {
        succeeded: true,
        wage,
        bonus,
    })
}

/// `base * fraction * multiplier`, rounded to cents.
pub fn action_wage(base: Decimal, fraction: Decimal, multiplier: f64) -> Result<Decimal, AgentError> {
    let overflow = || AgentError::ArithmeticOverflow {
        context: format!("wage {base} x {fraction} x {multiplier}"),
    };
    let multiplier = Decimal::try_from(multiplier).map_err(|_| overflow())?;
    base.checked_mul(fraction)
        .and_then(|w| w.checked_mul(multiplier))
        .map(|w| w.round_dp(2))
        .ok_or_else(overflow)
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

fn think<R: Rng>(ctx: &mut TickContext<'_, R>, w: Worker, thought: Thought) -> Result<(), AgentError> {
    ctx.pool.try_get_mut(w.handle)?.thought = Some(thought);
    Ok(())
}

fn walk_to<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    w: Worker,
    target: Position,
    thought: Thought,
) -> Result<(), AgentError> {
    let agent = ctx.pool.try_get_mut(w.handle)?;
    agent.target = Some(target);
    agent.activity = Activity::Working;
    agent.thought = Some(thought);
    Ok(())
}

/// The preferred site if it still passes `filter`, else the nearest one.
fn site(
    town: &hamlet_world::Town,
    preferred: Option<BuildingId>,
    from: Position,
    filter: fn(&Building) -> bool,
) -> Option<(BuildingId, Position)> {
    preferred
        .and_then(|id| town.building(id))
        .filter(|b| filter(b))
        .or_else(|| town.find_nearest_building(from, filter))
        .map(|b| (b.id, b.position))
}

fn farm<R: Rng>(ctx: &mut TickContext<'_, R>, w: Worker) -> Result<Option<f64>, AgentError> {
    let config = ctx.config;
    let occ = &config.occupations;
    let green_thumb = ctx.pool.try_get(w.handle)?.has_trait(AgentTrait::GreenThumb);
    let Some(town) = town_mut(ctx.towns, w.town) else {
        think(ctx, w, Thought::NeedFarmland)?;
        return Ok(None);
    };
    let Some((_, farm_pos)) = site(town, w.workplace, w.position, Building::is_farm) else {
        think(ctx, w, Thought::NeedFarmland)?;
        return Ok(None);
    };
    if w.position.distance(farm_pos) > occ.work_range {
        walk_to(ctx, w, farm_pos, Thought::GoingToFarm)?;
        return Ok(None);
    }
    let food = if green_thumb {
        occ.farm_food * occ.green_thumb_multiplier
    } else {
        occ.farm_food
    };
    town.add_food(food);
    think(ctx, w, Thought::TendingCrops)?;
    Ok(Some(1.0))
}

fn patrol<R: Rng>(ctx: &mut TickContext<'_, R>, w: Worker) -> Result<f64, AgentError> {
    let angle = ctx.rng.random_range(0.0..TAU);
    let point = match town_mut(ctx.towns, w.town) {
        Some(town) => town.position.offset(angle, town.radius * 0.8),
        None => w.position.offset(angle, ctx.config.lifecycle.wander_min),
    };
    walk_to(ctx, w, point, Thought::Patrolling)?;
    Ok(1.0)
}

/// Nearest other agent of the same town within `range` accepted by `filter`.
fn nearest_townsperson<R: Rng>(
    ctx: &TickContext<'_, R>,
    w: Worker,
    range: f64,
    filter: impl Fn(&crate::agent::Agent) -> bool,
) -> Option<(AgentHandle, Position)> {
    ctx.pool
        .iter()
        .filter(|(h, a)| *h != w.handle && a.town == w.town && filter(*a))
        .map(|(h, a)| (h, a.position, w.position.distance(a.position)))
        .filter(|(_, _, d)| *d <= range)
        .fold(None, |best: Option<(AgentHandle, Position, f64)>, cand| match best {
            Some(b) if b.2 <= cand.2 => Some(b),
            _ => Some(cand),
        })
        .map(|(h, p, _)| (h, p))
}

fn heal<R: Rng>(ctx: &mut TickContext<'_, R>, w: Worker) -> Result<Option<f64>, AgentError> {
    let config = ctx.config;
    let occ = &config.occupations;
    let min_age = occ.patient_min_age;
    let Some((patient, pos)) = nearest_townsperson(ctx, w, occ.doctor_range, |a| a.age >= min_age) else {
        think(ctx, w, Thought::NoPatients)?;
        return Ok(None);
    };
    let mut multiplier = 1.0;
    if ctx.rng.random_bool(occ.heal_chance.clamp(0.0, 1.0)) {
        ctx.pool.try_get_mut(patient)?.max_age += occ.heal_years;
        multiplier = occ.heal_multiplier;
    }
    walk_to(ctx, w, pos, Thought::Healing)?;
    Ok(Some(multiplier))
}

fn teach<R: Rng>(ctx: &mut TickContext<'_, R>, w: Worker) -> Result<Option<f64>, AgentError> {
    let config = ctx.config;
    let occ = &config.occupations;
    let max_age = occ.student_max_age;
    let Some((student, pos)) = nearest_townsperson(ctx, w, occ.teach_range, |a| a.age < max_age) else {
        return Ok(None);
    };
    let wise = ctx.pool.try_get(w.handle)?.has_trait(AgentTrait::Wise);
    let mut multiplier = 1.0;
    if wise && ctx.rng.random_bool(occ.teach_trait_chance.clamp(0.0, 1.0)) {
        let s = ctx.pool.try_get_mut(student)?;
        let missing: Vec<AgentTrait> = AgentTrait::ALL
            .iter()
            .copied()
            .filter(|t| !s.traits.contains(t))
            .collect();
        if let Some(&t) = missing.choose(ctx.rng) {
            s.traits.insert(t);
            multiplier = occ.teach_trait_multiplier;
        }
    }
    walk_to(ctx, w, pos, Thought::Teaching)?;
    Ok(Some(multiplier))
}

fn build<R: Rng>(ctx: &mut TickContext<'_, R>, w: Worker) -> Result<Option<f64>, AgentError> {
    let config = ctx.config;
    let occ = &config.occupations;
    let strong = ctx.pool.try_get(w.handle)?.has_trait(AgentTrait::Strong);
    let Some(town) = town_mut(ctx.towns, w.town) else {
        return Ok(None);
    };
    let Some((site_id, site_pos)) = site(town, w.workplace, w.position, Building::is_under_construction) else {
        return Ok(None);
    };
    if w.position.distance(site_pos) > occ.work_range {
        walk_to(ctx, w, site_pos, Thought::GoingToWork)?;
        return Ok(None);
    }
    let amount = if strong {
        occ.build_progress * occ.strong_build_multiplier
    } else {
        occ.build_progress
    };
    let completed = town.advance_construction(site_id, amount, ctx.rng)?;
    if completed {
        ctx.pool.try_get_mut(w.handle)?.workplace = None;
        think(ctx, w, Thought::FinishedBuilding)?;
        Ok(Some(occ.build_complete_multiplier))
    } else {
        think(ctx, w, Thought::Building)?;
        Ok(Some(1.0))
    }
}

fn sell<R: Rng>(ctx: &mut TickContext<'_, R>, w: Worker) -> Result<Option<f64>, AgentError> {
    let config = ctx.config;
    let occ = &config.occupations;
    let Some(town) = town_mut(ctx.towns, w.town) else {
        return Ok(None);
    };
    let Some((store_id, store_pos)) = site(town, w.workplace, w.position, Building::is_store) else {
        return Ok(None);
    };
    let customers = town
        .building_mut(store_id)
        .and_then(Building::store_mut)
        .map_or(0, |s| {
            s.employees.insert(w.handle);
            s.customers
        });
    ctx.pool.try_get_mut(w.handle)?.workplace = Some(store_id);
    if w.position.distance(store_pos) > occ.work_range {
        walk_to(ctx, w, store_pos, Thought::GoingToWork)?;
        return Ok(None);
    }
    think(ctx, w, Thought::Selling)?;
    let multiplier = (1.0 + f64::from(customers) * occ.merchant_per_customer).min(occ.merchant_max_multiplier);
    Ok(Some(multiplier))
}

fn preach<R: Rng>(ctx: &mut TickContext<'_, R>, w: Worker) -> Result<Option<f64>, AgentError> {
    let config = ctx.config;
    let occ = &config.occupations;
    let reached = ctx
        .pool
        .iter()
        .filter(|(h, a)| *h != w.handle && a.town == w.town && w.position.distance(a.position) <= occ.priest_range)
        .count();
    if reached == 0 || w.town.is_none() {
        return Ok(None);
    }
    let reached = reached as f64;
    if let Some(town) = town_mut(ctx.towns, w.town) {
        town.adjust_happiness(reached * occ.priest_happiness);
    }
    think(ctx, w, Thought::Preaching)?;
    Ok(Some(reached.mul_add(occ.priest_per_person, 1.0)))
}

fn make_art<R: Rng>(ctx: &mut TickContext<'_, R>, w: Worker) -> Result<Option<f64>, AgentError> {
    let config = ctx.config;
    let occ = &config.occupations;
    think(ctx, w, Thought::MakingArt)?;
    if !ctx.rng.random_bool(occ.artist_success_chance.clamp(0.0, 1.0)) {
        return Ok(None);
    }
    Ok(Some(ctx.rng.random_range(1.0..=occ.artist_max_multiplier.max(1.0))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hamlet_bank::{BankConfig, MonetaryPolicy};
    use hamlet_types::BuildingKind;
    use hamlet_world::{OpenTerrain, Town, TownConfig};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::agent::{Agent, SpawnParams};
    use crate::config::AgentsConfig;
    use crate::pool::AgentPool;

    struct Fixture {
        cfg: AgentsConfig,
        rng: SmallRng,
        pool: AgentPool,
        towns: Vec<Town>,
    }

    impl Fixture {
        fn new(seed: u64) -> Self {
            let mut cfg = AgentsConfig::default();
            cfg.occupations.bonus_chance = 0.0;
            Self {
                cfg,
                rng: SmallRng::seed_from_u64(seed),
                pool: AgentPool::new(16),
                towns: vec![Town::new(
                    TownId::from_random_bytes([6; 16]),
                    "Oakhurst",
                    Position::default(),
                    TownConfig::default(),
                    BankConfig::default(),
                )],
            }
        }

        fn town_id(&self) -> TownId {
            self.towns.first().unwrap().id
        }

        fn add(&mut self, occupation: Occupation, age: f64, pos: Position) -> AgentHandle {
            let mut a = Agent::spawn(
                SpawnParams {
                    position: pos,
                    age: Some(age),
                    occupation: Some(occupation),
                    town: Some(self.town_id()),
                    ..SpawnParams::default()
                },
                &self.cfg,
                &mut self.rng,
            );
            a.traits.clear();
            a.money = Decimal::ZERO;
            a.max_age = 200.0;
            let h = self.pool.acquire(a).unwrap();
            self.towns.first_mut().unwrap().add_member(h).unwrap();
            h
        }

        fn work(&mut self, h: AgentHandle) -> WorkOutcome {
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
            perform_work(&mut ctx, h).unwrap()
        }
    }

    #[test]
    fn wage_is_tenth_of_hourly_rate() {
        assert_eq!(
            action_wage(Decimal::new(50, 0), Decimal::new(1, 1), 1.5).unwrap(),
            Decimal::new(750, 2)
        );
    }

    #[test]
    fn guard_always_paid() {
        let mut f = Fixture::new(1);
        let h = f.add(Occupation::Guard, 30.0, Position::default());
        let out = f.work(h);
        assert!(out.succeeded);
        assert_eq!(out.wage, Decimal::new(3, 0));
        let a = f.pool.get(h).unwrap();
        assert_eq!(a.money, Decimal::new(3, 0));
        assert_eq!(a.thought, Some(Thought::Patrolling));
        assert!(a.target.is_some());
    }

    #[test]
    fn farmer_needs_farm_in_reach() {
        let mut f = Fixture::new(2);
        let h = f.add(Occupation::Farmer, 30.0, Position::default());
        assert!(!f.work(h).succeeded);
        assert_eq!(f.pool.get(h).unwrap().thought, Some(Thought::NeedFarmland));

        let mut rng = SmallRng::seed_from_u64(9);
        f.towns
            .first_mut()
            .unwrap()
            .construct(BuildingKind::Farm, Position::new(100.0, 0.0), &mut rng);
        assert!(!f.work(h).succeeded);
        assert_eq!(f.pool.get(h).unwrap().thought, Some(Thought::GoingToFarm));

        f.pool.get_mut(h).unwrap().position = Position::new(95.0, 0.0);
        f.towns.first_mut().unwrap().resources.food = 50.0;
        let out = f.work(h);
        assert!(out.succeeded);
        assert_eq!(out.wage, Decimal::new(250, 2));
        assert!((f.towns.first().unwrap().resources.food - 50.5).abs() < 1e-9);
    }

    #[test]
    fn doctor_without_patients_is_unpaid() {
        let mut f = Fixture::new(3);
        let h = f.add(Occupation::Doctor, 30.0, Position::default());
        f.add(Occupation::Guard, 40.0, Position::new(10.0, 0.0));
        let out = f.work(h);
        assert!(!out.succeeded);
        assert_eq!(f.pool.get(h).unwrap().thought, Some(Thought::NoPatients));
    }

    #[test]
    fn doctor_treats_elder_nearby() {
        let mut f = Fixture::new(4);
        f.cfg.occupations.heal_chance = 1.0;
        let h = f.add(Occupation::Doctor, 30.0, Position::default());
        let elder = f.add(Occupation::Priest, 65.0, Position::new(10.0, 0.0));
        let before = f.pool.get(elder).unwrap().max_age;
        let out = f.work(h);
        assert!(out.succeeded);
        // 50 * 0.1 * 1.5
        assert_eq!(out.wage, Decimal::new(750, 2));
        assert!((f.pool.get(elder).unwrap().max_age - before - 5.0).abs() < 1e-9);
    }

    #[test]
    fn builder_completion_pays_double() {
        let mut f = Fixture::new(5);
        let h = f.add(Occupation::Builder, 30.0, Position::default());
        let mut rng = SmallRng::seed_from_u64(10);
        let site = f
            .towns
            .first_mut()
            .unwrap()
            .start_construction(BuildingKind::School, Position::new(5.0, 0.0), &mut rng);
        f.towns.first_mut().unwrap().advance_construction(site, 95.0, &mut rng).unwrap();

        let out = f.work(h);
        assert!(out.succeeded);
        // 35 * 0.1 * 2
        assert_eq!(out.wage, Decimal::new(7, 0));
        assert!(!f.towns.first().unwrap().building(site).unwrap().is_under_construction());
        assert_eq!(f.pool.get(h).unwrap().thought, Some(Thought::FinishedBuilding));
    }

    #[test]
    fn merchant_multiplier_grows_with_customers() {
        let mut f = Fixture::new(6);
        let h = f.add(Occupation::Merchant, 30.0, Position::default());
        let mut rng = SmallRng::seed_from_u64(11);
        let store = f
            .towns
            .first_mut()
            .unwrap()
            .construct(BuildingKind::Store, Position::new(5.0, 0.0), &mut rng);
        f.towns
            .first_mut()
            .unwrap()
            .building_mut(store)
            .unwrap()
            .store_mut()
            .unwrap()
            .customers = 50;

        let out = f.work(h);
        // 40 * 0.1 * 1.5
        assert_eq!(out.wage, Decimal::new(6, 0));
        let staff = &f.towns.first().unwrap().building(store).unwrap().store().unwrap().employees;
        assert!(staff.contains(&h));
    }

    #[test]
    fn priest_raises_town_happiness() {
        let mut f = Fixture::new(7);
        let h = f.add(Occupation::Priest, 30.0, Position::default());
        f.add(Occupation::Guard, 30.0, Position::new(10.0, 0.0));
        f.add(Occupation::Guard, 30.0, Position::new(0.0, 10.0));
        f.towns.first_mut().unwrap().happiness = 50.0;

        let out = f.work(h);
        // 30 * 0.1 * 1.2
        assert_eq!(out.wage, Decimal::new(360, 2));
        assert!((f.towns.first().unwrap().happiness - 50.2).abs() < 1e-9);
    }

    #[test]
    fn wise_teacher_can_pass_on_a_trait() {
        let mut f = Fixture::new(8);
        f.cfg.occupations.teach_trait_chance = 1.0;
        let h = f.add(Occupation::Teacher, 30.0, Position::default());
        f.pool.get_mut(h).unwrap().traits.insert(AgentTrait::Wise);
        let student = f.add(Occupation::Child, 8.0, Position::new(10.0, 0.0));

        let out = f.work(h);
        // 35 * 0.1 * 2 * 1.2
        assert_eq!(out.wage, Decimal::new(840, 2));
        assert_eq!(f.pool.get(student).unwrap().traits.len(), 1);
    }

    #[test]
    fn artist_pay_is_bounded() {
        let mut f = Fixture::new(9);
        f.cfg.occupations.artist_success_chance = 1.0;
        let h = f.add(Occupation::Artist, 30.0, Position::default());
        for _ in 0..20 {
            let out = f.work(h);
            assert!(out.wage >= Decimal::new(250, 2) && out.wage <= Decimal::new(750, 2));
        }
    }
}
