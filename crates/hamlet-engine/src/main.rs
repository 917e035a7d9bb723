//! Headless driver binary for the Hamlet simulation.
//!
//! Loads configuration, seeds the starting towns, and runs the tick loop
//! until the configured tick count is reached, the population dies out,
//! or the operator interrupts a paced run.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the first CLI argument or `hamlet-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the simulation from the configuration
//! 4. Seed the starting towns and their founders
//! 5. Run the simulation loop
//! 6. Log the result

mod error;
mod seed;

use std::path::{Path, PathBuf};
use std::time::Duration;

use hamlet_core::config::{SimulationConfig, WorldConfig};
use hamlet_core::telemetry::{Telemetry, TracingSink};
use hamlet_core::{Simulation, TickSummary};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG: &str = "hamlet-config.yaml";

/// Ticks between summary log lines.
const SUMMARY_EVERY: u64 = 100;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndReason {
    /// Every configured tick ran.
    Completed,
    /// No agent is left alive.
    Extinct,
    /// Ctrl-C during a paced run.
    Interrupted,
}

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or a tick fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let (config, found) = load_config(&path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("hamlet-engine starting");
    if !found {
        info!(path = %path.display(), "Config file not found, using defaults");
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_ms = config.world.tick_ms,
        ticks = config.world.ticks,
        realtime = config.world.realtime,
        "Configuration loaded"
    );

    // 3. Create the simulation.
    let mut sim = Simulation::new(&config)?
        .with_telemetry(Telemetry::with_sink(Box::new(TracingSink)));
    info!(capacity = config.pool.capacity, "Simulation created");

    // 4. Seed towns and founders.
    let report = seed::seed_world(&mut sim, &config.world)?;
    info!(
        towns = report.towns.len(),
        founders = report.founders,
        "Starting world seeded"
    );

    // 5. Run the simulation.
    let reason = run(&mut sim, &config.world).await?;

    // 6. Log results.
    info!(
        end_reason = ?reason,
        total_ticks = sim.tick(),
        elapsed_ms = sim.elapsed_ms(),
        alive = sim.population(),
        "hamlet-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `path`.
///
/// A missing file yields the defaults; the flag reports whether the file
/// was found. The configuration is validated either way.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    let (mut config, found) = if path.exists() {
        (SimulationConfig::from_file(path)?, true)
    } else {
        (SimulationConfig::default(), false)
    };
    if !found {
        config.apply_env_overrides();
    }
    config.validate()?;
    Ok((config, found))
}

/// Step the simulation `world.ticks` times.
///
/// With `world.realtime` each tick waits for the next `tick_ms` interval
/// and Ctrl-C stops the run; otherwise ticks run back to back.
async fn run(sim: &mut Simulation, world: &WorldConfig) -> Result<EndReason, EngineError> {
    let mut pace = if world.realtime {
        Duration::try_from_secs_f64(world.tick_ms / 1000.0)
            .ok()
            .map(tokio::time::interval)
    } else {
        None
    };
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    for _ in 0..world.ticks {
        if let Some(interval) = pace.as_mut() {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut shutdown => {
                    info!("Interrupted, stopping");
                    return Ok(EndReason::Interrupted);
                }
            }
        }

        let summary = sim.step(world.tick_ms)?;
        if summary.tick.is_multiple_of(SUMMARY_EVERY) {
            log_summary(&summary);
        }
        if summary.alive == 0 {
            info!(tick = summary.tick, "Population extinct");
            return Ok(EndReason::Extinct);
        }
    }
    Ok(EndReason::Completed)
}

fn log_summary(summary: &TickSummary) {
    info!(
        tick = summary.tick,
        alive = summary.alive,
        births = summary.births,
        deaths = summary.deaths.len(),
        "Tick summary"
    );
    for town in &summary.towns {
        info!(
            town = %town.name,
            population = town.population,
            happiness = town.happiness,
            food = town.resources.food,
            water = town.resources.water,
            energy = town.resources.energy,
            "Town status"
        );
    }
}
