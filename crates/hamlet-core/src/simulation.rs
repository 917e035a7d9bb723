//! The simulation context and its tick cycle.
//!
//! [`Simulation`] owns every piece of mutable state: the agent pool, the
//! towns, the terrain, the RNG, the monetary policy, telemetry, and the
//! clock. Each call to [`Simulation::step`] runs these phases:
//!
//! 1. **Clock** -- advance the tick counter and elapsed time.
//!
//! 2. **Towns** -- in creation order: resources, happiness, roster
//!    reconciliation, and buildings, then every member in slot order.
//!
//! 3. **Unaffiliated agents** -- every live agent not yet updated this
//!    tick, in slot order.
//!
//! 4. **Mayors** -- a town without a living mayor elects its oldest adult.
//!
//! 5. **Report** -- agent events become metrics and a [`TickSummary`].
//!
//! A run is fully determined by the configured seed: every random draw
//! goes through the one [`SmallRng`] held here.

use hamlet_agents::{
    Agent, AgentError, AgentEvent, AgentPool, AgentsConfig, DeathCause, DeathRecord, LifecycleConfig,
    SpawnParams, TickContext, change_occupation, market_occupation, terminate, update_agent,
};
use hamlet_bank::{BankConfig, MonetaryPolicy};
use hamlet_types::{
    AgentHandle, AgentView, BuildingId, BuildingKind, Minigame, Occupation, Position, Resources,
    TownId, TownView,
};
use hamlet_world::{OpenTerrain, Terrain, Town, TownConfig, WorldError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info, warn};

use crate::clock::SimClock;
use crate::config::SimulationConfig;
use crate::error::{SimulationError, TickError};
use crate::telemetry::{Telemetry, metrics};

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated milliseconds since the start.
    pub elapsed_ms: f64,
    /// Living agents at the end of the tick.
    pub alive: usize,
    /// Children born this tick.
    pub births: u32,
    /// Agents who died this tick.
    pub deaths: Vec<DeathRecord>,
    /// Every town at the end of the tick, in creation order.
    pub towns: Vec<TownSummary>,
}

/// One town's state at the end of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TownSummary {
    /// Town ID.
    pub id: TownId,
    /// Display name.
    pub name: String,
    /// Living members.
    pub population: usize,
    /// Happiness in `[0, 100]`.
    pub happiness: f64,
    /// Supplies.
    pub resources: Resources,
}

/// The whole simulated world.
pub struct Simulation {
    pool: AgentPool,
    towns: Vec<Town>,
    terrain: Box<dyn Terrain>,
    rng: SmallRng,
    policy: MonetaryPolicy,
    agents: AgentsConfig,
    town_config: TownConfig,
    bank_config: BankConfig,
    telemetry: Telemetry,
    clock: SimClock,
    focus: Option<Position>,
}

impl Simulation {
    /// An empty world built from `config`: no towns, no agents, open
    /// terrain, telemetry off.
    pub fn new(config: &SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let capacity = usize::try_from(config.pool.capacity).unwrap_or(usize::MAX);
        info!(
            world = %config.world.name,
            seed = config.world.seed,
            capacity,
            "simulation created"
        );
        Ok(Self {
            pool: AgentPool::new(capacity),
            towns: Vec::new(),
            terrain: Box::new(OpenTerrain),
            rng: SmallRng::seed_from_u64(config.world.seed),
            policy: config.policy(),
            agents: config.agents_config(),
            town_config: config.town.clone(),
            bank_config: config.bank.ledger.clone(),
            telemetry: Telemetry::disabled(),
            clock: SimClock::new(),
            focus: None,
        })
    }

    /// Replace the terrain.
    #[must_use]
    pub fn with_terrain(mut self, terrain: Box<dyn Terrain>) -> Self {
        self.terrain = terrain;
        self
    }

    /// Replace the telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The agent pool.
    pub const fn pool(&self) -> &AgentPool {
        &self.pool
    }

    /// Every town, in creation order.
    pub fn towns(&self) -> &[Town] {
        &self.towns
    }

    /// The town with `id`.
    pub fn town(&self, id: TownId) -> Option<&Town> {
        self.towns.iter().find(|t| t.id == id)
    }

    /// The last tick run. 0 before the first step.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Simulated milliseconds since the start.
    pub const fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed_ms()
    }

    /// Current monetary policy.
    pub const fn policy(&self) -> MonetaryPolicy {
        self.policy
    }

    /// Agent tunables in effect.
    pub const fn agents_config(&self) -> &AgentsConfig {
        &self.agents
    }

    /// Live agents.
    pub fn population(&self) -> usize {
        self.pool.live_count()
    }

    /// Change the federal rate every bank charges against.
    pub fn set_federal_rate(&mut self, rate: Decimal) {
        info!(old = %self.policy.federal_rate, new = %rate, "federal rate changed");
        self.policy = MonetaryPolicy::new(rate);
    }

    /// Centre of the active radius; agents farther away are frozen when
    /// `agents.active_radius` is set.
    pub const fn set_focus(&mut self, focus: Option<Position>) {
        self.focus = focus;
    }

    // -----------------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------------

    /// Found a town at `position`.
    pub fn add_town(&mut self, name: impl Into<String>, position: Position) -> TownId {
        let id = TownId::from_random_bytes(self.rng.random());
        let town = Town::new(
            id,
            name,
            position,
            self.town_config.clone(),
            self.bank_config.clone(),
        );
        info!(town = %town.name, id = %id, "town founded");
        self.towns.push(town);
        id
    }

    /// Put up a finished `kind` in `town`.
    pub fn construct(
        &mut self,
        town: TownId,
        kind: BuildingKind,
        position: Position,
    ) -> Result<BuildingId, SimulationError> {
        let t = find_town_mut(&mut self.towns, Some(town)).ok_or(SimulationError::TownNotFound(town))?;
        Ok(t.construct(kind, position, &mut self.rng))
    }

    /// Open a construction site for `kind` in `town`.
    pub fn start_construction(
        &mut self,
        town: TownId,
        kind: BuildingKind,
        position: Position,
    ) -> Result<BuildingId, SimulationError> {
        let t = find_town_mut(&mut self.towns, Some(town)).ok_or(SimulationError::TownNotFound(town))?;
        Ok(t.start_construction(kind, position, &mut self.rng))
    }

    /// Create an agent.
    ///
    /// Adults without a requested occupation are placed by the labor
    /// market of their town, or given a random role when they have none.
    /// Founders without a generation start at generation 1.
    pub fn spawn(&mut self, mut params: SpawnParams) -> Result<AgentHandle, SimulationError> {
        let capacity = self.pool.capacity();
        if !self.pool.has_room() {
            warn!(capacity, "spawn refused, agent pool exhausted");
            return Err(SimulationError::PoolExhausted { capacity });
        }
        if let Some(town) = params.town
            && self.town(town).is_none()
        {
            return Err(SimulationError::TownNotFound(town));
        }

        let requested = params.occupation.take().filter(|o| *o != Occupation::Child);
        params.generation = params.generation.max(1);
        let agent = Agent::spawn(params, &self.agents, &mut self.rng);
        let working_age = !agent.is_child(&self.agents.lifecycle);
        let (gender, generation, town_id) = (agent.gender, agent.generation, agent.town);
        let handle = self
            .pool
            .acquire(agent)
            .ok_or(SimulationError::PoolExhausted { capacity })?;
        if let Some(town) = find_town_mut(&mut self.towns, town_id) {
            town.add_member(handle)?;
        }

        if working_age {
            let occupation = requested.unwrap_or_else(|| {
                market_occupation(
                    &self.pool,
                    find_town(&self.towns, town_id),
                    &self.agents.occupations,
                    &mut self.rng,
                )
            });
            let agent = self.pool.try_get_mut(handle).map_err(AgentError::from)?;
            change_occupation(agent, handle, find_town_mut(&mut self.towns, town_id), occupation);
        }

        self.telemetry.increment(
            metrics::PERSON_CREATED,
            &[("gender", gender.to_string()), ("generation", generation.to_string())],
        );
        debug!(handle = %handle, generation, "agent spawned");
        Ok(handle)
    }

    /// Remove an agent from the world, detaching it from everything.
    pub fn remove(&mut self, handle: AgentHandle) -> Result<DeathRecord, SimulationError> {
        let record = terminate(
            &mut self.pool,
            &mut self.towns,
            handle,
            DeathCause::Removed,
            &self.agents.lifecycle,
            &mut self.rng,
        )?;
        report_death(&mut self.telemetry, &record);
        Ok(record)
    }

    /// Put an agent into an external minigame.
    pub fn join_minigame(&mut self, handle: AgentHandle, game: Minigame) -> Result<(), SimulationError> {
        self.pool
            .try_get_mut(handle)
            .map_err(AgentError::from)?
            .join_minigame(game)?;
        Ok(())
    }

    /// Take an agent out of any minigame. Returns `false` if it was not
    /// playing.
    pub fn leave_minigame(&mut self, handle: AgentHandle) -> Result<bool, SimulationError> {
        Ok(self
            .pool
            .try_get_mut(handle)
            .map_err(AgentError::from)?
            .leave_minigame())
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the world by `dt_ms` simulated milliseconds.
    pub fn step(&mut self, dt_ms: f64) -> Result<TickSummary, TickError> {
        let tick = self.clock.advance(dt_ms)?;
        let policy = self.policy;

        let mut ctx = TickContext {
            pool: &mut self.pool,
            towns: &mut self.towns,
            terrain: self.terrain.as_ref(),
            rng: &mut self.rng,
            policy,
            config: &self.agents,
            tick,
            focus: self.focus,
            events: Vec::new(),
        };

        for index in 0..ctx.towns.len() {
            let pool = &*ctx.pool;
            let Some(town) = ctx.towns.get_mut(index) else {
                continue;
            };
            let update = town.update(dt_ms, policy, |h| pool.is_alive(h));
            if !update.departed.is_empty() || update.banks_charged > 0 {
                debug!(
                    town = %town.name,
                    departed = update.departed.len(),
                    banks_charged = update.banks_charged,
                    "town updated"
                );
            }
            let members: Vec<AgentHandle> = town.members().collect();
            for handle in members {
                run_agent(&mut ctx, handle, dt_ms)?;
            }
        }

        for handle in ctx.pool.handles() {
            run_agent(&mut ctx, handle, dt_ms)?;
        }
        let events = ctx.drain_events();

        elect_mayors(&mut self.pool, &mut self.towns, &self.agents.lifecycle)?;

        let (births, deaths) = self.report(&events);
        Ok(TickSummary {
            tick,
            elapsed_ms: self.clock.elapsed_ms(),
            alive: self.pool.live_count(),
            births,
            deaths,
            towns: self
                .towns
                .iter()
                .map(|t| TownSummary {
                    id: t.id,
                    name: t.name.clone(),
                    population: t.population(),
                    happiness: t.happiness,
                    resources: t.resources,
                })
                .collect(),
        })
    }

    /// Turn agent events into metrics. Returns births and deaths.
    fn report(&mut self, events: &[AgentEvent]) -> (u32, Vec<DeathRecord>) {
        let mut births: u32 = 0;
        let mut deaths = Vec::new();
        for event in events {
            match event {
                AgentEvent::Born { child, .. } => {
                    births = births.saturating_add(1);
                    if let Some(a) = self.pool.get(*child) {
                        self.telemetry.increment(
                            metrics::PERSON_CREATED,
                            &[("gender", a.gender.to_string()), ("generation", a.generation.to_string())],
                        );
                    }
                }
                AgentEvent::Died(record) => {
                    report_death(&mut self.telemetry, record);
                    deaths.push(record.clone());
                }
                AgentEvent::OccupationChanged { from, to, .. } => {
                    self.telemetry.increment(
                        metrics::PERSON_OCCUPATION_CHANGE,
                        &[("from", from.to_string()), ("to", to.to_string())],
                    );
                }
                AgentEvent::Paid { agent, wage } => {
                    let occupation = self
                        .pool
                        .get(*agent)
                        .map_or_else(String::new, |a| a.occupation.to_string());
                    self.telemetry.record(
                        metrics::PERSON_WAGE,
                        wage.to_f64().unwrap_or_default(),
                        &[("occupation", occupation)],
                    );
                }
                AgentEvent::JoinedTown { .. } | AgentEvent::Paired { .. } | AgentEvent::Separated { .. } => {}
            }
        }
        (births, deaths)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Render data for one agent.
    pub fn agent_view(&self, handle: AgentHandle) -> Option<AgentView> {
        let a = self.pool.get(handle)?;
        let name_of = |h: Option<AgentHandle>| h.and_then(|h| self.pool.get(h)).map(|o| o.name.clone());
        Some(AgentView {
            id: a.id,
            name: a.name.clone(),
            age: a.age,
            gender: a.gender,
            occupation: a.occupation,
            traits: a.traits.iter().copied().collect(),
            activity: a.activity.label().to_owned(),
            thought: a.thought,
            generation: a.generation,
            partner_name: name_of(a.partner()),
            parent_name: name_of(a.parent),
            is_mayor: a.is_mayor,
            money: a.money,
            hunger: a.hunger,
            happiness: a.happiness,
            position: a.position,
            scale: a.scale,
            town: a.town,
        })
    }

    /// Render data for every live agent, in slot order.
    pub fn agent_views(&self) -> Vec<AgentView> {
        self.pool
            .iter()
            .filter_map(|(h, _)| self.agent_view(h))
            .collect()
    }

    /// Render data for one town.
    pub fn town_view(&self, id: TownId) -> Option<TownView> {
        let t = self.town(id)?;
        Some(TownView {
            id: t.id,
            name: t.name.clone(),
            position: t.position,
            radius: t.radius,
            population: u32::try_from(t.population()).unwrap_or(u32::MAX),
            building_count: u32::try_from(t.buildings().len()).unwrap_or(u32::MAX),
            resources: t.resources,
            happiness: t.happiness,
            mayor_name: t.mayor().and_then(|m| self.pool.get(m)).map(|m| m.name.clone()),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn find_town(towns: &[Town], id: Option<TownId>) -> Option<&Town> {
    let id = id?;
    towns.iter().find(|t| t.id == id)
}

fn find_town_mut(towns: &mut [Town], id: Option<TownId>) -> Option<&mut Town> {
    let id = id?;
    towns.iter_mut().find(|t| t.id == id)
}

/// Update one agent unless it died earlier in the tick.
fn run_agent<R: Rng>(ctx: &mut TickContext<'_, R>, handle: AgentHandle, dt_ms: f64) -> Result<(), TickError> {
    if !ctx.pool.is_alive(handle) {
        return Ok(());
    }
    update_agent(ctx, handle, dt_ms)
        .map(|_| ())
        .map_err(|source| TickError::Agent { handle, source })
}

/// Give every town without a living mayor its oldest adult member.
///
/// Ties go to the lower slot.
fn elect_mayors(pool: &mut AgentPool, towns: &mut [Town], life: &LifecycleConfig) -> Result<(), WorldError> {
    for town in towns.iter_mut() {
        if town.mayor().is_some_and(|m| pool.is_alive(m)) {
            continue;
        }
        let elected = town
            .members()
            .filter_map(|h| pool.get(h).filter(|a| a.is_adult(life)).map(|a| (h, a.age)))
            .fold(None, |best: Option<(AgentHandle, f64)>, (h, age)| match best {
                Some((_, best_age)) if best_age >= age => best,
                _ => Some((h, age)),
            });
        let Some((mayor, _)) = elected else {
            continue;
        };
        town.set_mayor(mayor)?;
        if let Some(a) = pool.get_mut(mayor) {
            a.is_mayor = true;
            info!(town = %town.name, mayor = %a.name, "mayor elected");
        }
    }
    Ok(())
}

fn report_death(telemetry: &mut Telemetry, record: &DeathRecord) {
    telemetry.increment(metrics::PERSON_DEATH, &[("cause", record.cause.to_string())]);
    telemetry.record(metrics::PERSON_AGE, record.final_age, &[]);
}
