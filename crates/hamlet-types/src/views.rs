//! Read-only snapshots handed to renderers.
//!
//! The simulation never draws. A renderer asks for an [`AgentView`] or a
//! [`TownView`] and does whatever it likes with the data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AgentTrait, Gender, Occupation, Thought};
use crate::geometry::Position;
use crate::ids::{AgentId, TownId};

/// Upper bound for every town resource and for happiness.
pub const LEVEL_MAX: f64 = 100.0;

/// A town's shared supplies, each kept in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Resources {
    /// Food stock.
    pub food: f64,
    /// Water stock.
    pub water: f64,
    /// Energy stock.
    pub energy: f64,
}

impl Resources {
    /// All three resources at the same level.
    pub const fn uniform(level: f64) -> Self {
        Self {
            food: level,
            water: level,
            energy: level,
        }
    }

    /// Clamp every resource back into `[0, 100]`.
    pub fn clamp(&mut self) {
        self.food = self.food.clamp(0.0, LEVEL_MAX);
        self.water = self.water.clamp(0.0, LEVEL_MAX);
        self.energy = self.energy.clamp(0.0, LEVEL_MAX);
    }

    /// Sum of the three resources.
    pub fn total(&self) -> f64 {
        self.food + self.water + self.energy
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::uniform(LEVEL_MAX)
    }
}

/// Everything a renderer needs to draw one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentView {
    /// Stable ID.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Current age in years.
    pub age: f64,
    /// Gender.
    pub gender: Gender,
    /// Current occupation.
    pub occupation: Occupation,
    /// Traits held.
    pub traits: Vec<AgentTrait>,
    /// Activity label, see `Activity::label`.
    pub activity: String,
    /// Current thought, if any.
    pub thought: Option<Thought>,
    /// Family generation; founders are generation 1.
    pub generation: u32,
    /// Partner's name while in a relationship.
    pub partner_name: Option<String>,
    /// Parent's name while the parent is alive.
    pub parent_name: Option<String>,
    /// Whether this agent leads its town.
    pub is_mayor: bool,
    /// Cash on hand.
    #[ts(as = "String")]
    pub money: Decimal,
    /// Hunger level.
    pub hunger: f64,
    /// Happiness in `[0, 100]`.
    pub happiness: f64,
    /// Position on the plane.
    pub position: Position,
    /// Draw scale (larger for giants).
    pub scale: f64,
    /// Town membership.
    pub town: Option<TownId>,
}

/// Everything a renderer needs to draw one town.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TownView {
    /// Town ID.
    pub id: TownId,
    /// Display name.
    pub name: String,
    /// Centre of the town.
    pub position: Position,
    /// Town radius.
    pub radius: f64,
    /// Living members.
    pub population: u32,
    /// Number of buildings.
    pub building_count: u32,
    /// Supplies.
    pub resources: Resources,
    /// Happiness in `[0, 100]`.
    pub happiness: f64,
    /// The mayor's name, if one is elected.
    pub mayor_name: Option<String>,
}
