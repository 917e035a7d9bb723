//! Monetary policy shared by every bank in a simulation.

use rust_decimal::Decimal;
use serde::Deserialize;

/// The externally adjustable base rate.
///
/// One value lives in the simulation context and is passed to every bank
/// call that needs it, so changing it affects all banks from the next
/// interest application on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonetaryPolicy {
    /// Base annual rate (default 0.05).
    pub federal_rate: Decimal,
}

impl MonetaryPolicy {
    /// A policy at the given federal rate.
    pub const fn new(federal_rate: Decimal) -> Self {
        Self { federal_rate }
    }
}

impl Default for MonetaryPolicy {
    fn default() -> Self {
        Self {
            federal_rate: Decimal::new(5, 2),
        }
    }
}
