//! Starting towns and their founders.
//!
//! Every town listed under `world.towns` is founded with a house, a store,
//! a bank, and a farm laid out around its centre, then populated with
//! `world.founders_per_town` agents standing in a ring inside it. Founder
//! age, gender, and occupation are rolled by the simulation.

use std::f64::consts::TAU;

use hamlet_agents::SpawnParams;
use hamlet_core::Simulation;
use hamlet_core::config::WorldConfig;
use hamlet_types::{BuildingKind, Position, TownId};
use tracing::info;

use crate::error::EngineError;

/// Distance of the starting buildings from the town centre.
const BUILDING_RING: f64 = 60.0;

/// Distance of the founders from the town centre.
const FOUNDER_RING: f64 = 30.0;

/// Buildings every starting town gets, one per quarter turn.
const STARTING_BUILDINGS: [BuildingKind; 4] = [
    BuildingKind::House,
    BuildingKind::Store,
    BuildingKind::Bank,
    BuildingKind::Farm,
];

/// What seeding produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Towns founded, in configuration order.
    pub towns: Vec<TownId>,
    /// Founders spawned across all towns.
    pub founders: usize,
}

/// Found every configured town and spawn its founders.
pub fn seed_world(sim: &mut Simulation, world: &WorldConfig) -> Result<SeedReport, EngineError> {
    let mut report = SeedReport::default();
    for seed in &world.towns {
        let centre = Position::new(seed.x, seed.y);
        let town = sim.add_town(seed.name.clone(), centre);

        let quarter = TAU / STARTING_BUILDINGS.len() as f64;
        let mut angle = 0.0;
        for kind in STARTING_BUILDINGS {
            sim.construct(town, kind, centre.offset(angle, BUILDING_RING))?;
            angle += quarter;
        }

        let step = TAU / f64::from(world.founders_per_town.max(1));
        let mut angle = 0.0;
        for _ in 0..world.founders_per_town {
            sim.spawn(SpawnParams {
                position: centre.offset(angle, FOUNDER_RING),
                town: Some(town),
                home: Some(centre),
                ..SpawnParams::default()
            })?;
            report.founders = report.founders.saturating_add(1);
            angle += step;
        }

        info!(
            town = %seed.name,
            founders = world.founders_per_town,
            buildings = STARTING_BUILDINGS.len(),
            "town seeded"
        );
        report.towns.push(town);
    }
    Ok(report)
}
