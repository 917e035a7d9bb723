//! Tunables for banks and customer accounts.
//!
//! Defaults match the game balance the simulation ships with. The core
//! crate embeds [`BankConfig`] under the `bank:` key of the YAML file.

use hamlet_types::AccountKind;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Minimum balance and interest rate for one account kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AccountRules {
    /// A withdrawal may never leave the balance below this.
    pub min_balance: Decimal,
    /// Rate compounded once per interest interval.
    pub interest_rate: Decimal,
}

/// Configuration for every bank in the simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    /// Reserve funds a new bank opens with (default 10000).
    pub default_funds: Decimal,
    /// Largest single loan (default 5000).
    pub loan_limit: Decimal,
    /// Added to the federal rate to give the loan rate (default 0.025).
    pub interest_margin: Decimal,
    /// Simulated milliseconds between interest applications (default 10000).
    pub interest_interval_ms: f64,
    /// Checking account rules (minimum 0, rate 0.001).
    pub checking: AccountRules,
    /// Savings account rules (minimum 100, rate 0.02).
    pub savings: AccountRules,
}

impl BankConfig {
    /// Rules for the given account kind.
    pub const fn rules(&self, kind: AccountKind) -> AccountRules {
        match kind {
            AccountKind::Checking => self.checking,
            AccountKind::Savings => self.savings,
        }
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            default_funds: Decimal::new(10_000, 0),
            loan_limit: Decimal::new(5_000, 0),
            interest_margin: Decimal::new(25, 3),
            interest_interval_ms: 10_000.0,
            checking: AccountRules {
                min_balance: Decimal::ZERO,
                interest_rate: Decimal::new(1, 3),
            },
            savings: AccountRules {
                min_balance: Decimal::new(100, 0),
                interest_rate: Decimal::new(2, 2),
            },
        }
    }
}
