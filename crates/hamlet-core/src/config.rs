//! Configuration loading and typed config structures for the Hamlet simulation.
//!
//! The canonical configuration lives in `hamlet-config.yaml` at the project
//! root. Every section and field is optional; anything left out takes the
//! default the simulation was balanced with. Agent, occupation, needs, and
//! banking sections reuse the structs from `hamlet-agents`; the bank and
//! town sections reuse the ones from `hamlet-bank` and `hamlet-world`.

use std::path::Path;

use hamlet_agents::{AgentsConfig, BankingConfig, LifecycleConfig, NeedsConfig, OccupationConfig};
use hamlet_bank::{BankConfig, MonetaryPolicy};
use hamlet_world::TownConfig;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Allowed drift of the ideal occupation ratios from a sum of 1.
const RATIO_TOLERANCE: f64 = 1e-6;

/// Environment variable overriding `world.seed`.
pub const SEED_ENV: &str = "HAMLET_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but breaks a rule.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `hamlet-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World name, seed, timing, and starting towns.
    #[serde(default)]
    pub world: WorldConfig,

    /// Agent pool sizing.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Ageing, movement, timers, relationships.
    #[serde(default)]
    pub agents: LifecycleConfig,

    /// Wages, ideal ratios, and work action tunables.
    #[serde(default)]
    pub occupations: OccupationConfig,

    /// Hunger and food.
    #[serde(default)]
    pub needs: NeedsConfig,

    /// Bank ledger tunables and the federal rate.
    #[serde(default)]
    pub bank: BankSection,

    /// Town economy tunables.
    #[serde(default)]
    pub town: TownConfig,

    /// Agent-side banking behaviour.
    #[serde(default)]
    pub banking: BankingConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `HAMLET_SEED`, when set to an integer, overrides `world.seed`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(SEED_ENV) {
            match val.trim().parse::<u64>() {
                Ok(seed) => self.world.seed = seed,
                Err(e) => tracing::warn!(value = %val, error = %e, "ignoring unparsable {SEED_ENV}"),
            }
        }
    }

    /// Check the rules a YAML schema cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum: f64 = self.occupations.ideal_ratios.values().sum();
        if (sum - 1.0).abs() > RATIO_TOLERANCE {
            return Err(invalid(format!("occupations.ideal_ratios sum to {sum}, expected 1.0")));
        }
        if self.pool.capacity == 0 {
            return Err(invalid("pool.capacity must be at least 1"));
        }
        if !(self.world.tick_ms.is_finite() && self.world.tick_ms > 0.0) {
            return Err(invalid("world.tick_ms must be positive"));
        }

        let rates = [
            ("agents.age_per_ms", self.agents.age_per_ms),
            ("needs.hunger_rate", self.needs.hunger_rate),
            ("town.consumption_rate", self.town.consumption_rate),
            ("town.store_regen_rate", self.town.store_regen_rate),
        ];
        if let Some((name, _)) = rates.iter().find(|(_, r)| *r < 0.0 || r.is_nan()) {
            return Err(invalid(format!("{name} must not be negative")));
        }
        let money_rates = [
            ("bank.federal_rate", self.bank.federal_rate),
            ("bank.interest_margin", self.bank.ledger.interest_margin),
        ];
        if let Some((name, _)) = money_rates.iter().find(|(_, r)| r.is_sign_negative() && !r.is_zero()) {
            return Err(invalid(format!("{name} must not be negative")));
        }
        if self.occupations.wages.values().any(|w| w.is_sign_negative() && !w.is_zero()) {
            return Err(invalid("occupations.wages must not be negative"));
        }
        Ok(())
    }

    /// The agent sections bundled the way agent updates take them.
    pub fn agents_config(&self) -> AgentsConfig {
        AgentsConfig {
            lifecycle: self.agents.clone(),
            occupations: self.occupations.clone(),
            needs: self.needs.clone(),
            banking: self.banking.clone(),
        }
    }

    /// The monetary policy at the configured federal rate.
    pub const fn policy(&self) -> MonetaryPolicy {
        MonetaryPolicy::new(self.bank.federal_rate)
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    pub name: String,
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Simulated milliseconds per tick.
    pub tick_ms: f64,
    /// Ticks the engine runs before stopping.
    pub ticks: u64,
    /// Pace ticks to wall-clock time instead of running flat out.
    pub realtime: bool,
    /// Founders spawned in each starting town.
    pub founders_per_town: u32,
    /// Towns created at startup.
    pub towns: Vec<TownSeed>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "Hamlet".to_owned(),
            seed: 42,
            tick_ms: 16.0,
            ticks: 10_000,
            realtime: false,
            founders_per_town: 5,
            towns: vec![TownSeed {
                name: "Hamlet".to_owned(),
                x: 400.0,
                y: 300.0,
            }],
        }
    }
}

/// A town created at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TownSeed {
    /// Display name.
    pub name: String,
    /// Centre, x coordinate.
    pub x: f64,
    /// Centre, y coordinate.
    pub y: f64,
}

/// Agent pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of live agents.
    pub capacity: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: 500 }
    }
}

/// The `bank:` section: ledger tunables plus the federal rate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BankSection {
    /// Funds, loan limit, margin, interest interval, account rules.
    #[serde(flatten)]
    pub ledger: BankConfig,
    /// Base rate every bank adds its margin to (default 0.05).
    pub federal_rate: Decimal,
}

impl Default for BankSection {
    fn default() -> Self {
        Self {
            ledger: BankConfig::default(),
            federal_rate: MonetaryPolicy::default().federal_rate,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}
