//! Configuration constants and defaults for agent behaviour.
//!
//! Each struct maps to one section of `hamlet-config.yaml`: [`LifecycleConfig`]
//! to `agents`, [`OccupationConfig`] to `occupations`, [`NeedsConfig`] to
//! `needs`, and [`BankingConfig`] to `banking`. The simulation core bundles
//! them into an [`AgentsConfig`] and passes it into every agent update.
//!
//! Times are simulated milliseconds. Money is [`Decimal`].

use std::collections::BTreeMap;

use hamlet_types::Occupation;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Every agent tunable, bundled for the update functions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgentsConfig {
    /// Ageing, movement, timers, relationships.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Wages, ideal ratios, and work action tunables.
    #[serde(default)]
    pub occupations: OccupationConfig,
    /// Hunger and food.
    #[serde(default)]
    pub needs: NeedsConfig,
    /// Agent-side banking behaviour.
    #[serde(default)]
    pub banking: BankingConfig,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Ageing, movement, relationship, and timer parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Age gained per simulated millisecond (default 0.0001, one year per 10 s).
    pub age_per_ms: f64,
    /// Below this age the occupation is always `Child` (default 13).
    pub child_age: f64,
    /// Minimum age for relationships (default 18).
    pub adult_age: f64,
    /// Minimum age to join a town on one's own (default 15).
    pub join_age: f64,
    /// Below this age agents wander back home (default 10).
    pub home_age: f64,
    /// Towns within `radius * join_radius_factor` are candidates (default 1.2).
    pub join_radius_factor: f64,
    /// Youngest founder age (default 15).
    pub founder_min_age: u32,
    /// Oldest founder age (default 20).
    pub founder_max_age: u32,
    /// Chance a founding female starts as a girl (default 0.3).
    pub young_female_chance: f64,
    /// Youngest girl founder (default 8).
    pub young_female_min_age: u32,
    /// Oldest girl founder (default 13).
    pub young_female_max_age: u32,
    /// Shortest lifespan (default 70).
    pub min_max_age: f64,
    /// Random extra lifespan (default 30).
    pub max_age_spread: f64,
    /// Cash a new agent starts with (default 50).
    pub starting_money: Decimal,
    /// Happiness a new agent starts with (default 50).
    pub starting_happiness: f64,
    /// Distance per reference frame at speed multiplier 1 (default 1.0).
    pub base_speed: f64,
    /// Reference frame length the speed is normalised to (default 16 ms).
    pub reference_frame_ms: f64,
    /// Speed multiplier for FAST agents (default 1.5).
    pub fast_multiplier: f64,
    /// Draw scale for GIANT agents (default 1.3).
    pub giant_scale: f64,
    /// Shortest random walk leg (default 50).
    pub wander_min: f64,
    /// Longest random walk leg (default 250).
    pub wander_max: f64,
    /// Random target attempts before standing still (default 10).
    pub wander_attempts: u32,
    /// Move timer range in ms (default 3000..6000).
    pub move_interval_ms: (f64, f64),
    /// Work timer range in ms (default 3000..8000).
    pub work_interval_ms: (f64, f64),
    /// Thought timer range in ms (default 5000..10000).
    pub thought_interval_ms: (f64, f64),
    /// Relationship range (default 30).
    pub relation_range: f64,
    /// Partners stop approaching within this distance (default 20).
    pub relation_hold_distance: f64,
    /// Relationship length range in ms (default 10000..20000).
    pub relation_duration_ms: (f64, f64),
    /// Re-entry cooldown range in ms after a break-up (default 5000..10000).
    pub relation_cooldown_ms: (f64, f64),
    /// Chance per eligible tick of conceiving (default 0.01).
    pub reproduction_chance: f64,
    /// Cooldown after a birth in ms (default 30000).
    pub reproduction_cooldown_ms: f64,
    /// Oldest age at which a mother conceives (default 45).
    pub max_mother_age: f64,
    /// Agents farther than this from the focus point skip their update.
    /// `None` updates everyone (default).
    pub active_radius: Option<f64>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            age_per_ms: 0.000_1,
            child_age: 13.0,
            adult_age: 18.0,
            join_age: 15.0,
            home_age: 10.0,
            join_radius_factor: 1.2,
            founder_min_age: 15,
            founder_max_age: 20,
            young_female_chance: 0.3,
            young_female_min_age: 8,
            young_female_max_age: 13,
            min_max_age: 70.0,
            max_age_spread: 30.0,
            starting_money: Decimal::new(50, 0),
            starting_happiness: 50.0,
            base_speed: 1.0,
            reference_frame_ms: 16.0,
            fast_multiplier: 1.5,
            giant_scale: 1.3,
            wander_min: 50.0,
            wander_max: 250.0,
            wander_attempts: 10,
            move_interval_ms: (3_000.0, 6_000.0),
            work_interval_ms: (3_000.0, 8_000.0),
            thought_interval_ms: (5_000.0, 10_000.0),
            relation_range: 30.0,
            relation_hold_distance: 20.0,
            relation_duration_ms: (10_000.0, 20_000.0),
            relation_cooldown_ms: (5_000.0, 10_000.0),
            reproduction_chance: 0.01,
            reproduction_cooldown_ms: 30_000.0,
            max_mother_age: 45.0,
            active_radius: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Occupations
// ---------------------------------------------------------------------------

/// Wages, labor-market ratios, and work action tunables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OccupationConfig {
    /// Base hourly wage per occupation.
    pub wages: BTreeMap<Occupation, Decimal>,
    /// Share of the population each occupation should hold. Sums to 1.
    pub ideal_ratios: BTreeMap<Occupation, f64>,
    /// Fraction of the hourly wage paid per successful action (default 0.1).
    pub action_wage_fraction: Decimal,
    /// Wage multiplier for WISE agents (default 1.2).
    pub wise_multiplier: f64,
    /// Wage multiplier for FAST agents (default 1.1).
    pub fast_multiplier: f64,
    /// Chance of a bonus after a successful action (default 0.05).
    pub bonus_chance: f64,
    /// Bonus multiplier for LUCKY agents (default 2).
    pub lucky_bonus_multiplier: f64,
    /// Farmers, builders, and merchants work within this distance of their site (default 20).
    pub work_range: f64,
    /// Town food per farming action (default 0.5).
    pub farm_food: f64,
    /// Farm output multiplier for GREEN_THUMB agents (default 1.5).
    pub green_thumb_multiplier: f64,
    /// Youngest patient a doctor treats (default 60).
    pub patient_min_age: f64,
    /// Doctors look for patients within this distance (default 50).
    pub doctor_range: f64,
    /// Chance a treatment extends the patient's life (default 0.5).
    pub heal_chance: f64,
    /// Years added by a successful treatment (default 5).
    pub heal_years: f64,
    /// Wage multiplier for a successful treatment (default 1.5).
    pub heal_multiplier: f64,
    /// Teachers look for students within this distance (default 50).
    pub teach_range: f64,
    /// Students are younger than this (default 18).
    pub student_max_age: f64,
    /// Chance a WISE teacher passes on a trait (default 0.1).
    pub teach_trait_chance: f64,
    /// Wage multiplier for passing on a trait (default 2).
    pub teach_trait_multiplier: f64,
    /// Construction progress per builder action (default 10).
    pub build_progress: f64,
    /// Progress multiplier for STRONG builders (default 1.5).
    pub strong_build_multiplier: f64,
    /// Wage multiplier for completing a building (default 2).
    pub build_complete_multiplier: f64,
    /// Priests reach townspeople within this distance (default 50).
    pub priest_range: f64,
    /// Wage multiplier per person reached (default 0.1).
    pub priest_per_person: f64,
    /// Town happiness per person reached (default 0.1).
    pub priest_happiness: f64,
    /// Chance an artist's work pays (default 0.3).
    pub artist_success_chance: f64,
    /// Highest artist payout multiplier (default 3).
    pub artist_max_multiplier: f64,
    /// Wage multiplier per customer a merchant's store has served (default 0.01).
    pub merchant_per_customer: f64,
    /// Cap on the merchant customer multiplier (default 2).
    pub merchant_max_multiplier: f64,
}

impl OccupationConfig {
    /// Base hourly wage for `occupation`, zero when not listed.
    pub fn wage(&self, occupation: Occupation) -> Decimal {
        self.wages.get(&occupation).copied().unwrap_or(Decimal::ZERO)
    }

    /// Ideal share for `occupation`, zero when not listed.
    pub fn ratio(&self, occupation: Occupation) -> f64 {
        self.ideal_ratios.get(&occupation).copied().unwrap_or(0.0)
    }
}

impl Default for OccupationConfig {
    fn default() -> Self {
        Self {
            wages: BTreeMap::from([
                (Occupation::Doctor, Decimal::new(50, 0)),
                (Occupation::Guard, Decimal::new(30, 0)),
                (Occupation::Builder, Decimal::new(35, 0)),
                (Occupation::Farmer, Decimal::new(25, 0)),
                (Occupation::Merchant, Decimal::new(40, 0)),
                (Occupation::Teacher, Decimal::new(35, 0)),
                (Occupation::Priest, Decimal::new(30, 0)),
                (Occupation::Artist, Decimal::new(25, 0)),
            ]),
            ideal_ratios: BTreeMap::from([
                (Occupation::Farmer, 0.20),
                (Occupation::Builder, 0.15),
                (Occupation::Guard, 0.10),
                (Occupation::Doctor, 0.10),
                (Occupation::Merchant, 0.15),
                (Occupation::Teacher, 0.10),
                (Occupation::Priest, 0.10),
                (Occupation::Artist, 0.10),
            ]),
            action_wage_fraction: Decimal::new(1, 1),
            wise_multiplier: 1.2,
            fast_multiplier: 1.1,
            bonus_chance: 0.05,
            lucky_bonus_multiplier: 2.0,
            work_range: 20.0,
            farm_food: 0.5,
            green_thumb_multiplier: 1.5,
            patient_min_age: 60.0,
            doctor_range: 50.0,
            heal_chance: 0.5,
            heal_years: 5.0,
            heal_multiplier: 1.5,
            teach_range: 50.0,
            student_max_age: 18.0,
            teach_trait_chance: 0.1,
            teach_trait_multiplier: 2.0,
            build_progress: 10.0,
            strong_build_multiplier: 1.5,
            build_complete_multiplier: 2.0,
            priest_range: 50.0,
            priest_per_person: 0.1,
            priest_happiness: 0.1,
            artist_success_chance: 0.3,
            artist_max_multiplier: 3.0,
            merchant_per_customer: 0.01,
            merchant_max_multiplier: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Needs
// ---------------------------------------------------------------------------

/// Hunger and food parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    /// Hunger gained per millisecond (default 0.001).
    pub hunger_rate: f64,
    /// Hunger at which food seeking starts (default 70).
    pub hunger_threshold: f64,
    /// Hunger removed by eating from one's own inventory (default 30).
    pub inventory_meal: f64,
    /// Happiness from eating one's own food (default 5).
    pub inventory_happiness: f64,
    /// Hunger removed by a bought or parent-provided meal (default 40).
    pub bought_meal: f64,
    /// Happiness from a bought or parent-provided meal (default 10).
    pub bought_happiness: f64,
    /// Price of one meal (default 10).
    pub meal_price: Decimal,
    /// Agents act on a store, parent, or bank within this distance (default 20).
    pub reach: f64,
    /// Retry delay after asking a parent (default 5000 ms).
    pub parent_retry_ms: f64,
    /// Retry delay above `urgent_hunger` (default 4000 ms).
    pub parent_retry_urgent_ms: f64,
    /// Retry delay above `starving_hunger` (default 3000 ms).
    pub parent_retry_starving_ms: f64,
    /// Retry delay after a parent could not help (default 15000 ms).
    pub parent_failed_retry_ms: f64,
    /// Hunger counted as urgent (default 80).
    pub urgent_hunger: f64,
    /// Hunger counted as starving (default 90).
    pub starving_hunger: f64,
    /// Happiness a parent loses when it cannot feed a starving child (default 10).
    pub worried_parent_penalty: f64,
}

impl NeedsConfig {
    /// Delay before a child asks its parent again.
    pub fn parent_retry_for(&self, hunger: f64) -> f64 {
        if hunger > self.starving_hunger {
            self.parent_retry_starving_ms
        } else if hunger > self.urgent_hunger {
            self.parent_retry_urgent_ms
        } else {
            self.parent_retry_ms
        }
    }
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            hunger_rate: 0.001,
            hunger_threshold: 70.0,
            inventory_meal: 30.0,
            inventory_happiness: 5.0,
            bought_meal: 40.0,
            bought_happiness: 10.0,
            meal_price: Decimal::new(10, 0),
            reach: 20.0,
            parent_retry_ms: 5_000.0,
            parent_retry_urgent_ms: 4_000.0,
            parent_retry_starving_ms: 3_000.0,
            parent_failed_retry_ms: 15_000.0,
            urgent_hunger: 80.0,
            starving_hunger: 90.0,
            worried_parent_penalty: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Banking
// ---------------------------------------------------------------------------

/// Agent-side banking behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BankingConfig {
    /// Milliseconds between banking decisions (default 5000).
    pub check_interval_ms: f64,
    /// Cash above which an agent heads to the bank (default 100).
    pub deposit_threshold: Decimal,
    /// Cash an agent keeps on hand after banking (default 100).
    pub cash_reserve: Decimal,
    /// Loan requested by a broke agent (default 50).
    pub emergency_loan: Decimal,
}

impl Default for BankingConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 5_000.0,
            deposit_threshold: Decimal::new(100, 0),
            cash_reserve: Decimal::new(100, 0),
            emergency_loan: Decimal::new(50, 0),
        }
    }
}
