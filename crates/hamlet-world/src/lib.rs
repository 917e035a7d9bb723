//! Towns, buildings, and terrain for the Hamlet simulation.
//!
//! A [`Town`] aggregates a roster of member agents, a list of
//! [`Building`]s, a shared pool of [`Resources`], and a happiness level.
//! The town itself never touches agent records: the simulation core feeds
//! it a liveness query for roster reconciliation and updates members
//! separately.
//!
//! # Modules
//!
//! - [`building`] -- Building records and per-kind state (stores, banks,
//!   housing, public buildings, construction sites)
//! - [`config`] -- [`TownConfig`] and [`BuildingConfig`] tunables
//! - [`error`] -- Error types for town and building operations
//! - [`terrain`] -- The read-only [`Terrain`] query used by movement
//! - [`town`] -- The [`Town`] aggregate economy
//!
//! [`Resources`]: hamlet_types::Resources

pub mod building;
pub mod config;
pub mod error;
pub mod terrain;
pub mod town;

pub use building::{Building, BuildingState, BuildingUpdate, StoreState};
pub use config::{BuildingConfig, ResidentialRange, TownConfig};
pub use error::WorldError;
pub use terrain::{GridTerrain, OpenTerrain, Terrain};
pub use town::{Town, TownUpdate};
