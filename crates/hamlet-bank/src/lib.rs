//! Bank ledger for the Hamlet simulation.
//!
//! A [`Bank`] holds reserve funds, at most one open loan per customer, and
//! any number of checking or savings accounts per customer. All money is
//! [`Decimal`]; nothing here uses floating point for currency.
//!
//! # Modules
//!
//! - [`bank`] -- The [`Bank`] struct: funds, loans, interest, and the timer
//! - [`account`] -- Customer accounts and their per-kind rules
//! - [`config`] -- [`BankConfig`] tunables with their defaults
//! - [`policy`] -- [`MonetaryPolicy`], the process-wide federal rate
//!
//! # Rejections
//!
//! Every business rule (non-positive amount, insufficient funds, duplicate
//! loan, below-minimum balance) is reported as a [`BankError`]. A rejected
//! operation leaves the bank exactly as it was.

pub mod account;
pub mod bank;
pub mod config;
pub mod policy;

pub use account::Account;
pub use bank::{Bank, BankUpdate};
pub use config::{AccountRules, BankConfig};
pub use policy::MonetaryPolicy;

use hamlet_types::{AccountKind, AgentId};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Reasons a bank operation is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BankError {
    /// Amounts must be strictly positive.
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// The bank does not hold enough reserve funds.
    #[error("insufficient bank funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount asked for.
        requested: Decimal,
        /// Funds on hand.
        available: Decimal,
    },

    /// The loan request exceeds the per-loan limit.
    #[error("loan of {amount} exceeds limit {limit}")]
    LoanLimitExceeded {
        /// Amount asked for.
        amount: Decimal,
        /// Configured limit.
        limit: Decimal,
    },

    /// The customer already has an open loan.
    #[error("customer {customer} already holds a loan of {outstanding}")]
    LoanExists {
        /// The customer.
        customer: AgentId,
        /// Principal still owed.
        outstanding: Decimal,
    },

    /// The customer has no open loan.
    #[error("customer {customer} has no open loan")]
    NoLoan {
        /// The customer.
        customer: AgentId,
    },

    /// The deposit or withdrawal would leave the account below its minimum.
    #[error("{kind} account would fall below minimum {minimum} (balance after: {balance_after})")]
    BelowMinimum {
        /// Account kind.
        kind: AccountKind,
        /// The kind's minimum balance.
        minimum: Decimal,
        /// What the balance would have become.
        balance_after: Decimal,
    },

    /// No account at that index for the customer.
    #[error("customer {customer} has no account at index {index}")]
    NoSuchAccount {
        /// The customer.
        customer: AgentId,
        /// The requested index.
        index: usize,
    },

    /// A currency calculation overflowed.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}
