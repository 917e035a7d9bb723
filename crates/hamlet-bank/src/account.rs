//! Customer accounts.

use hamlet_types::AccountKind;
use rust_decimal::Decimal;

/// One checking or savings account.
///
/// Timestamps are simulated milliseconds from the owning bank's clock, so
/// interest gating is reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Checking or savings.
    pub kind: AccountKind,
    /// Current balance.
    pub balance: Decimal,
    /// Bank clock when the account was opened.
    pub opened_at_ms: f64,
    /// Bank clock at the last interest application.
    pub last_interest_ms: f64,
}

impl Account {
    /// Open an account at `now_ms` with `initial` in it.
    pub const fn open(kind: AccountKind, initial: Decimal, now_ms: f64) -> Self {
        Self {
            kind,
            balance: initial,
            opened_at_ms: now_ms,
            last_interest_ms: now_ms,
        }
    }
}
