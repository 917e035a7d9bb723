//! The agent record and its creation.
//!
//! One [`Agent`] holds everything about one lifetime of one simulated
//! person. A record is always built whole by [`Agent::spawn`]; the pool
//! stores a fresh record in a recycled slot rather than patching the old
//! one, so nothing from a previous lifetime survives.

use std::collections::{BTreeMap, BTreeSet};

use hamlet_types::{
    Activity, AgentHandle, AgentId, AgentTrait, BuildingId, Gender, LEVEL_MAX, Minigame,
    Occupation, Position, Thought, TownId,
};
use rand::Rng;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;

use crate::config::{AgentsConfig, LifecycleConfig};
use crate::error::AgentError;
use crate::names::generate_name;

/// Highest number of trait draws at creation.
const MAX_TRAIT_DRAWS: u32 = 3;

/// Roll a value in `[lo, hi)`, or `lo` when the range is empty.
pub(crate) fn roll_between(range: (f64, f64), rng: &mut impl Rng) -> f64 {
    let (lo, hi) = range;
    if lo < hi { rng.random_range(lo..hi) } else { lo }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// Countdown timers in simulated milliseconds. Each stops at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timers {
    /// Until the idle thought is re-rolled.
    pub thought_ms: f64,
    /// Until a new walk target is picked.
    pub move_ms: f64,
    /// Until the next work action.
    pub work_ms: f64,
    /// Until the current relationship ends.
    pub relation_ms: f64,
    /// Until a new relationship may start.
    pub relation_cooldown_ms: f64,
    /// Until another child may be conceived.
    pub reproduction_cooldown_ms: f64,
    /// Until a hungry child asks its parent again.
    pub food_retry_ms: f64,
    /// Until the next banking decision.
    pub banking_ms: f64,
}

impl Timers {
    /// Count every timer down by `dt_ms`, stopping at zero.
    pub fn tick(&mut self, dt_ms: f64) {
        for timer in [
            &mut self.thought_ms,
            &mut self.move_ms,
            &mut self.work_ms,
            &mut self.relation_ms,
            &mut self.relation_cooldown_ms,
            &mut self.reproduction_cooldown_ms,
            &mut self.food_retry_ms,
            &mut self.banking_ms,
        ] {
            *timer = (*timer - dt_ms).max(0.0);
        }
    }
}

// ---------------------------------------------------------------------------
// Spawn parameters
// ---------------------------------------------------------------------------

/// Inputs for creating an agent. Unset fields are rolled.
#[derive(Debug, Clone, Default)]
pub struct SpawnParams {
    /// Where the agent appears.
    pub position: Position,
    /// Gender, or a coin flip.
    pub gender: Option<Gender>,
    /// Age in years, or a founder age roll.
    pub age: Option<f64>,
    /// Occupation for adults. Ignored below working age.
    pub occupation: Option<Occupation>,
    /// The parent, for agents born in the simulation.
    pub parent: Option<AgentHandle>,
    /// Generation number; founders are 1.
    pub generation: u32,
    /// Town the agent belongs to from birth.
    pub town: Option<TownId>,
    /// Home position children drift back towards.
    pub home: Option<Position>,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// One simulated person.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Stable identity for this lifetime.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Gender.
    pub gender: Gender,
    /// Current location.
    pub position: Position,
    /// Where the agent is walking to.
    pub target: Option<Position>,
    /// Age in years.
    pub age: f64,
    /// Age at which the agent dies.
    pub max_age: f64,
    /// Current labor role.
    pub occupation: Occupation,
    /// Creation-time modifiers.
    pub traits: BTreeSet<AgentTrait>,
    /// Movement speed factor.
    pub speed_multiplier: f64,
    /// Draw scale factor.
    pub scale: f64,
    /// Cash on hand.
    pub money: Decimal,
    /// Food items carried, by name.
    pub inventory: BTreeMap<String, u32>,
    /// Hunger; grows without bound until fed.
    pub hunger: f64,
    /// Happiness in `[0, 100]`.
    pub happiness: f64,
    /// What the agent is doing.
    pub activity: Activity,
    /// The thought bubble.
    pub thought: Option<Thought>,
    /// Generation number.
    pub generation: u32,
    /// Parent, while alive.
    pub parent: Option<AgentHandle>,
    /// Children born to this agent.
    pub children: Vec<AgentHandle>,
    /// Agent this one follows.
    pub following: Option<AgentHandle>,
    /// Agents following this one.
    pub followers: BTreeSet<AgentHandle>,
    /// Town membership.
    pub town: Option<TownId>,
    /// Home position.
    pub home: Option<Position>,
    /// Building the agent works at.
    pub workplace: Option<BuildingId>,
    /// Bank the agent uses.
    pub preferred_bank: Option<BuildingId>,
    /// Whether the agent holds the mayor's office.
    pub is_mayor: bool,
    /// Most recent wage received.
    pub last_paycheck: Decimal,
    /// Countdown timers.
    pub timers: Timers,
    /// Simulation tick of the last update.
    pub last_tick: u64,
}

impl Agent {
    /// Build a fresh agent.
    ///
    /// Below working age the occupation is always [`Occupation::Child`];
    /// adults take `params.occupation` or start [`Occupation::Unemployed`]
    /// until the market assigns them.
    pub fn spawn(params: SpawnParams, config: &AgentsConfig, rng: &mut impl Rng) -> Self {
        let life = &config.lifecycle;
        let gender = params.gender.unwrap_or_else(|| {
            if rng.random_bool(0.5) {
                Gender::Masculine
            } else {
                Gender::Feminine
            }
        });
        let age = params.age.unwrap_or_else(|| founder_age(gender, life, rng)).max(0.0);
        let max_age = (life.min_max_age + rng.random_range(0.0..=life.max_age_spread.max(0.0)))
            .max(age + 1.0);

        let mut traits = BTreeSet::new();
        for _ in 0..rng.random_range(1..=MAX_TRAIT_DRAWS) {
            if let Some(t) = AgentTrait::ALL.choose(rng) {
                traits.insert(*t);
            }
        }

        let occupation = if age < life.child_age {
            Occupation::Child
        } else {
            params.occupation.filter(|o| *o != Occupation::Child).unwrap_or(Occupation::Unemployed)
        };

        let timers = Timers {
            thought_ms: roll_between(life.thought_interval_ms, rng),
            move_ms: roll_between(life.move_interval_ms, rng),
            work_ms: roll_between(life.work_interval_ms, rng),
            banking_ms: config.banking.check_interval_ms,
            ..Timers::default()
        };

        Self {
            id: AgentId::from_random_bytes(rng.random()),
            name: generate_name(gender, rng),
            gender,
            position: params.position,
            target: None,
            age,
            max_age,
            occupation,
            speed_multiplier: if traits.contains(&AgentTrait::Fast) {
                life.fast_multiplier
            } else {
                1.0
            },
            scale: if traits.contains(&AgentTrait::Giant) {
                life.giant_scale
            } else {
                1.0
            },
            traits,
            money: life.starting_money,
            inventory: BTreeMap::new(),
            hunger: 0.0,
            happiness: life.starting_happiness.clamp(0.0, LEVEL_MAX),
            activity: Activity::Idle,
            thought: Thought::IDLE.choose(rng).copied(),
            generation: params.generation,
            parent: params.parent,
            children: Vec::new(),
            following: None,
            followers: BTreeSet::new(),
            town: params.town,
            home: params.home,
            workplace: None,
            preferred_bank: None,
            is_mayor: false,
            last_paycheck: Decimal::ZERO,
            timers,
            last_tick: 0,
        }
    }

    /// Below working age.
    pub fn is_child(&self, config: &LifecycleConfig) -> bool {
        self.age < config.child_age
    }

    /// Old enough for relationships.
    pub fn is_adult(&self, config: &LifecycleConfig) -> bool {
        self.age >= config.adult_age
    }

    /// Whether the agent carries `t`.
    pub fn has_trait(&self, t: AgentTrait) -> bool {
        self.traits.contains(&t)
    }

    /// The partner, when in a relationship.
    pub const fn partner(&self) -> Option<AgentHandle> {
        self.activity.partner()
    }

    /// Whether the agent is paired up.
    pub const fn in_relationship(&self) -> bool {
        self.activity.partner().is_some()
    }

    /// Raise happiness by `delta`, then clamp to `[0, 100]`.
    pub fn adjust_happiness(&mut self, delta: f64) {
        self.happiness = (self.happiness + delta).clamp(0.0, LEVEL_MAX);
    }

    /// Add `amount` to cash on hand.
    pub fn earn(&mut self, amount: Decimal) -> Result<(), AgentError> {
        self.money = self
            .money
            .checked_add(amount)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: format!("earning {amount}"),
            })?;
        Ok(())
    }

    /// Take `amount` from cash on hand.
    pub fn spend(&mut self, amount: Decimal) -> Result<(), AgentError> {
        if amount > self.money {
            return Err(AgentError::InsufficientMoney {
                needed: amount,
                available: self.money,
            });
        }
        self.money = self
            .money
            .checked_sub(amount)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: format!("spending {amount}"),
            })?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Inventory
    // -----------------------------------------------------------------------

    /// Whether any food is carried.
    pub fn has_food(&self) -> bool {
        self.inventory.values().any(|q| *q > 0)
    }

    /// Add `quantity` of `item`.
    pub fn stow(&mut self, item: impl Into<String>, quantity: u32) {
        let entry = self.inventory.entry(item.into()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Remove one unit of the first carried item. Returns its name.
    pub fn take_one(&mut self) -> Option<String> {
        let item = self.inventory.iter().find(|(_, q)| **q > 0).map(|(k, _)| k.clone())?;
        if let Some(q) = self.inventory.get_mut(&item) {
            *q = q.saturating_sub(1);
            if *q == 0 {
                self.inventory.remove(&item);
            }
        }
        Some(item)
    }

    // -----------------------------------------------------------------------
    // Minigames
    // -----------------------------------------------------------------------

    /// Enter an external minigame.
    ///
    /// Refused while paired up; the relationship has to end first.
    pub fn join_minigame(&mut self, game: Minigame) -> Result<(), AgentError> {
        if self.in_relationship() {
            return Err(AgentError::Busy {
                activity: self.activity.label(),
            });
        }
        self.activity = match game {
            Minigame::Tag => Activity::PlayingTag { is_it: false },
            Minigame::RockPaperScissors => Activity::PlayingRps,
        };
        self.target = None;
        Ok(())
    }

    /// Leave any minigame. Returns `false` if the agent was not playing.
    pub fn leave_minigame(&mut self) -> bool {
        if !self.activity.in_minigame() {
            return false;
        }
        self.activity = Activity::Idle;
        true
    }
}

/// Founder age: an adult, or for some females a girl.
fn founder_age(gender: Gender, config: &LifecycleConfig, rng: &mut impl Rng) -> f64 {
    let young = gender == Gender::Feminine && rng.random_bool(config.young_female_chance.clamp(0.0, 1.0));
    let (lo, hi) = if young {
        (config.young_female_min_age, config.young_female_max_age)
    } else {
        (config.founder_min_age, config.founder_max_age)
    };
    f64::from(rng.random_range(lo.min(hi)..=hi.max(lo)))
}
