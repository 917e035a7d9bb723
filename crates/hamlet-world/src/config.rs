//! Tunables for the town economy and buildings.
//!
//! The simulation core embeds [`TownConfig`] under the `town:` key of the
//! YAML file; building tunables nest under `town.buildings`.

use std::collections::BTreeMap;

use hamlet_types::BuildingKind;
use serde::Deserialize;

/// Town economy constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TownConfig {
    /// Town radius in world units (default 200).
    pub radius: f64,
    /// Resource units consumed per member per millisecond (default 0.001).
    pub consumption_rate: f64,
    /// Water consumed relative to food (default 0.5).
    pub water_factor: f64,
    /// Energy consumed relative to food (default 0.75).
    pub energy_factor: f64,
    /// Food regenerated per millisecond per well-stocked store (default 0.1).
    pub store_regen_rate: f64,
    /// A store regenerates food while its inventory exceeds this (default 50).
    pub store_regen_threshold: u32,
    /// Resource factor below which happiness falls (default 0.5).
    pub resource_threshold: f64,
    /// Happiness swing from the resource factor (default 0.5).
    pub resource_adjustment: f64,
    /// Happiness penalty while the town has no buildings (default 0.25).
    pub building_penalty: f64,
    /// Members per building above which the town is crowded (default 10).
    pub density_threshold: f64,
    /// Happiness penalty while crowded (default 1.0).
    pub density_penalty: f64,
    /// Scales every happiness signal per millisecond (default 0.001).
    pub time_scale: f64,
    /// Building tunables.
    pub buildings: BuildingConfig,
}

impl Default for TownConfig {
    fn default() -> Self {
        Self {
            radius: 200.0,
            consumption_rate: 0.001,
            water_factor: 0.5,
            energy_factor: 0.75,
            store_regen_rate: 0.1,
            store_regen_threshold: 50,
            resource_threshold: 0.5,
            resource_adjustment: 0.5,
            building_penalty: 0.25,
            density_threshold: 10.0,
            density_penalty: 1.0,
            time_scale: 0.001,
            buildings: BuildingConfig::default(),
        }
    }
}

/// Capacity range for a residential kind, rolled in `step` increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ResidentialRange {
    /// Smallest capacity.
    pub min: u32,
    /// Largest capacity.
    pub max: u32,
    /// Capacity granularity.
    pub step: u32,
}

/// Building constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    /// Store inventory cap (default 100).
    pub store_max_inventory: u32,
    /// Units added on each restock (default 20).
    pub restock_amount: u32,
    /// Milliseconds between restocks (default 30000).
    pub restock_interval_ms: f64,
    /// Below this a store reports that it needs supplies (default 20).
    pub low_stock_threshold: u32,
    /// Town food produced per millisecond by food-producing kinds.
    pub food_production: BTreeMap<BuildingKind, f64>,
    /// Capacity of a house (default 4).
    pub house_capacity: u32,
    /// Hotel capacity range (default 20..=50 in steps of 10).
    pub hotel: ResidentialRange,
    /// Condo capacity range (default 8..=24 in steps of 4).
    pub condo: ResidentialRange,
    /// Progress at which a construction site completes (default 100).
    pub construction_target: f64,
}

impl BuildingConfig {
    /// Food produced per millisecond by `kind`, zero for non-producers.
    pub fn food_rate(&self, kind: BuildingKind) -> f64 {
        self.food_production.get(&kind).copied().unwrap_or(0.0)
    }

    /// Capacity of a public building kind.
    pub const fn public_capacity(kind: BuildingKind) -> u32 {
        match kind {
            BuildingKind::School => 30,
            BuildingKind::Playground => 15,
            BuildingKind::Mall => 50,
            _ => 20,
        }
    }
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            store_max_inventory: 100,
            restock_amount: 20,
            restock_interval_ms: 30_000.0,
            low_stock_threshold: 20,
            food_production: BTreeMap::from([
                (BuildingKind::GroceryStore, 0.000_2),
                (BuildingKind::Supermarket, 0.000_3),
                (BuildingKind::Diner, 0.000_1),
                (BuildingKind::Restaurant, 0.000_15),
            ]),
            house_capacity: 4,
            hotel: ResidentialRange {
                min: 20,
                max: 50,
                step: 10,
            },
            condo: ResidentialRange {
                min: 8,
                max: 24,
                step: 4,
            },
            construction_target: 100.0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn only_food_kinds_produce() {
        let cfg = BuildingConfig::default();
        assert!(cfg.food_rate(BuildingKind::Diner) > 0.0);
        assert!(cfg.food_rate(BuildingKind::Store).abs() < f64::EPSILON);
    }

    #[test]
    fn yaml_overrides_nested_building_values() {
        let yaml = "radius: 150\nbuildings:\n  restock_amount: 5\n";
        let cfg: TownConfig = serde_yml::from_str(yaml).unwrap();
        assert!((cfg.radius - 150.0).abs() < f64::EPSILON);
        assert_eq!(cfg.buildings.restock_amount, 5);
        assert_eq!(cfg.buildings.store_max_inventory, 100);
    }
}
