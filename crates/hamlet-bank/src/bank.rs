//! The bank: reserve funds, loans, accounts, and interest.
//!
//! # Funds
//!
//! Reserve funds move with every operation: issuing a loan debits them,
//! repayments and account deposits credit them, account withdrawals debit
//! them, and account interest is credited to both the account and the
//! reserve.
//!
//! # Interest
//!
//! Loan interest compounds at `federal_rate + margin` once per interval.
//! Account interest compounds at each kind's own rate and is gated by the
//! time since that account last earned interest, unless forced.

use std::collections::BTreeMap;

use hamlet_types::{AccountKind, AgentId};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::BankError;
use crate::account::Account;
use crate::config::BankConfig;
use crate::policy::MonetaryPolicy;

/// What a call to [`Bank::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BankUpdate {
    /// Whether the interest timer fired this update.
    pub interest_applied: bool,
    /// Loans charged interest.
    pub loans_charged: usize,
    /// Accounts credited with interest.
    pub accounts_credited: usize,
}

/// A bank's ledger.
#[derive(Debug, Clone)]
pub struct Bank {
    funds: Decimal,
    loans: BTreeMap<AgentId, Decimal>,
    accounts: BTreeMap<AgentId, Vec<Account>>,
    interest_timer_ms: f64,
    clock_ms: f64,
    config: BankConfig,
}

impl Bank {
    /// Open a bank with the configured default funds.
    pub fn new(config: BankConfig) -> Self {
        Self {
            funds: config.default_funds,
            loans: BTreeMap::new(),
            accounts: BTreeMap::new(),
            interest_timer_ms: config.interest_interval_ms,
            clock_ms: 0.0,
            config,
        }
    }

    /// Reserve funds on hand.
    pub const fn funds(&self) -> Decimal {
        self.funds
    }

    /// The bank's configuration.
    pub const fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Loan rate under `policy`: federal rate plus the bank's margin.
    pub fn interest_rate(&self, policy: MonetaryPolicy) -> Decimal {
        policy
            .federal_rate
            .checked_add(self.config.interest_margin)
            .unwrap_or(policy.federal_rate)
    }

    /// Outstanding principal for `customer`, if any.
    pub fn loan(&self, customer: AgentId) -> Option<Decimal> {
        self.loans.get(&customer).copied()
    }

    /// Number of open loans.
    pub fn loan_count(&self) -> usize {
        self.loans.len()
    }

    /// All accounts held by `customer`, oldest first.
    pub fn accounts(&self, customer: AgentId) -> &[Account] {
        self.accounts.get(&customer).map_or(&[], Vec::as_slice)
    }

    /// Total accounts across all customers.
    pub fn account_count(&self) -> usize {
        self.accounts.values().map(Vec::len).sum()
    }

    // -----------------------------------------------------------------------
    // Reserve funds
    // -----------------------------------------------------------------------

    /// Add `amount` to the reserve.
    pub fn deposit(&mut self, amount: Decimal) -> Result<(), BankError> {
        require_positive(amount)?;
        self.funds = self
            .funds
            .checked_add(amount)
            .ok_or(BankError::Overflow("deposit"))?;
        Ok(())
    }

    /// Take `amount` out of the reserve.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), BankError> {
        require_positive(amount)?;
        self.require_funds(amount)?;
        self.funds = self
            .funds
            .checked_sub(amount)
            .ok_or(BankError::Overflow("withdraw"))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Loans
    // -----------------------------------------------------------------------

    /// Lend `amount` to `customer`.
    ///
    /// Rejected when the amount is not positive or above the loan limit,
    /// when the customer already owes money, or when the reserve cannot
    /// cover it. An existing loan is never touched by a rejected request.
    pub fn issue_loan(&mut self, customer: AgentId, amount: Decimal) -> Result<(), BankError> {
        require_positive(amount)?;
        if amount > self.config.loan_limit {
            return Err(BankError::LoanLimitExceeded {
                amount,
                limit: self.config.loan_limit,
            });
        }
        if let Some(outstanding) = self.loan(customer) {
            return Err(BankError::LoanExists {
                customer,
                outstanding,
            });
        }
        self.require_funds(amount)?;

        self.funds = self
            .funds
            .checked_sub(amount)
            .ok_or(BankError::Overflow("issue_loan"))?;
        self.loans.insert(customer, amount);
        info!(customer = %customer, amount = %amount, funds = %self.funds, "loan issued");
        Ok(())
    }

    /// Pay back up to `amount` of `customer`'s loan.
    ///
    /// The payment is capped at what is owed. Returns the amount actually
    /// applied. The loan entry disappears once it reaches zero.
    pub fn repay_loan(&mut self, customer: AgentId, amount: Decimal) -> Result<Decimal, BankError> {
        require_positive(amount)?;
        let outstanding = self.loan(customer).ok_or(BankError::NoLoan { customer })?;
        let payment = amount.min(outstanding);
        let remaining = outstanding
            .checked_sub(payment)
            .ok_or(BankError::Overflow("repay_loan"))?;
        let funds = self
            .funds
            .checked_add(payment)
            .ok_or(BankError::Overflow("repay_loan"))?;

        self.funds = funds;
        if remaining.is_zero() {
            self.loans.remove(&customer);
            info!(customer = %customer, payment = %payment, "loan repaid in full");
        } else {
            self.loans.insert(customer, remaining);
            debug!(customer = %customer, payment = %payment, remaining = %remaining, "loan payment");
        }
        Ok(payment)
    }

    /// Compound every open loan once at the current loan rate.
    ///
    /// Returns the number of loans charged.
    pub fn apply_interest(&mut self, policy: MonetaryPolicy) -> usize {
        let factor = Decimal::ONE
            .checked_add(self.interest_rate(policy))
            .unwrap_or(Decimal::ONE);
        let mut charged: usize = 0;
        for principal in self.loans.values_mut() {
            if let Some(next) = principal.checked_mul(factor) {
                *principal = next;
                charged = charged.saturating_add(1);
            }
        }
        charged
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// Open a new account for `customer` with `initial` in it.
    ///
    /// The initial deposit must meet the kind's minimum balance. It is
    /// credited to the reserve.
    pub fn create_account(
        &mut self,
        customer: AgentId,
        kind: AccountKind,
        initial: Decimal,
    ) -> Result<usize, BankError> {
        let rules = self.config.rules(kind);
        if initial < rules.min_balance || initial.is_sign_negative() {
            return Err(BankError::BelowMinimum {
                kind,
                minimum: rules.min_balance,
                balance_after: initial,
            });
        }
        let funds = self
            .funds
            .checked_add(initial)
            .ok_or(BankError::Overflow("create_account"))?;

        self.funds = funds;
        let list = self.accounts.entry(customer).or_default();
        list.push(Account::open(kind, initial, self.clock_ms));
        let index = list.len().saturating_sub(1);
        debug!(customer = %customer, kind = %kind, initial = %initial, "account opened");
        Ok(index)
    }

    /// Put `amount` into `customer`'s account at `index`.
    pub fn deposit_to_account(
        &mut self,
        customer: AgentId,
        index: usize,
        amount: Decimal,
    ) -> Result<Decimal, BankError> {
        require_positive(amount)?;
        let funds = self
            .funds
            .checked_add(amount)
            .ok_or(BankError::Overflow("deposit_to_account"))?;
        let account = self.account_mut(customer, index)?;
        let balance = account
            .balance
            .checked_add(amount)
            .ok_or(BankError::Overflow("deposit_to_account"))?;

        account.balance = balance;
        self.funds = funds;
        Ok(balance)
    }

    /// Take `amount` out of `customer`'s account at `index`.
    ///
    /// Rejected when the balance would drop below the kind's minimum; the
    /// balance is unchanged in that case.
    pub fn withdraw_from_account(
        &mut self,
        customer: AgentId,
        index: usize,
        amount: Decimal,
    ) -> Result<Decimal, BankError> {
        require_positive(amount)?;
        self.require_funds(amount)?;
        let funds = self
            .funds
            .checked_sub(amount)
            .ok_or(BankError::Overflow("withdraw_from_account"))?;
        let account = self.account(customer, index)?;
        let minimum = self.config.rules(account.kind).min_balance;
        let balance_after = account
            .balance
            .checked_sub(amount)
            .ok_or(BankError::Overflow("withdraw_from_account"))?;
        if balance_after < minimum {
            return Err(BankError::BelowMinimum {
                kind: account.kind,
                minimum,
                balance_after,
            });
        }

        self.account_mut(customer, index)?.balance = balance_after;
        self.funds = funds;
        Ok(balance_after)
    }

    /// Balance of `customer`'s account at `index`.
    pub fn account_balance(&self, customer: AgentId, index: usize) -> Option<Decimal> {
        self.accounts(customer).get(index).map(|a| a.balance)
    }

    /// Compound account balances at each kind's rate.
    ///
    /// Without `force`, an account only earns interest once a full interest
    /// interval has passed since it last did. Returns the number of
    /// accounts credited.
    pub fn apply_account_interest(&mut self, force: bool) -> usize {
        let now = self.clock_ms;
        let interval = self.config.interest_interval_ms;
        let mut credited: usize = 0;
        let mut funds = self.funds;

        for account in self.accounts.values_mut().flatten() {
            if !force && now - account.last_interest_ms < interval {
                continue;
            }
            let rate = self.config.rules(account.kind).interest_rate;
            let Some(interest) = account.balance.checked_mul(rate) else {
                continue;
            };
            let (Some(balance), Some(next_funds)) =
                (account.balance.checked_add(interest), funds.checked_add(interest))
            else {
                continue;
            };
            account.balance = balance;
            account.last_interest_ms = now;
            funds = next_funds;
            credited = credited.saturating_add(1);
        }

        self.funds = funds;
        credited
    }

    /// Advance the bank clock by `dt_ms`.
    ///
    /// When the interest timer runs out, loan interest is applied, account
    /// interest is force-applied, and the timer restarts.
    pub fn update(&mut self, dt_ms: f64, policy: MonetaryPolicy) -> BankUpdate {
        let dt = dt_ms.max(0.0);
        self.clock_ms += dt;
        self.interest_timer_ms -= dt;
        if self.interest_timer_ms > 0.0 {
            return BankUpdate::default();
        }

        let loans_charged = self.apply_interest(policy);
        let accounts_credited = self.apply_account_interest(true);
        self.interest_timer_ms = self.config.interest_interval_ms;
        debug!(
            loans_charged,
            accounts_credited,
            funds = %self.funds,
            "bank interest applied"
        );
        BankUpdate {
            interest_applied: true,
            loans_charged,
            accounts_credited,
        }
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn require_funds(&self, amount: Decimal) -> Result<(), BankError> {
        if amount > self.funds {
            return Err(BankError::InsufficientFunds {
                requested: amount,
                available: self.funds,
            });
        }
        Ok(())
    }

    fn account(&self, customer: AgentId, index: usize) -> Result<&Account, BankError> {
        self.accounts(customer)
            .get(index)
            .ok_or(BankError::NoSuchAccount { customer, index })
    }

    fn account_mut(&mut self, customer: AgentId, index: usize) -> Result<&mut Account, BankError> {
        self.accounts
            .get_mut(&customer)
            .and_then(|list| list.get_mut(index))
            .ok_or(BankError::NoSuchAccount { customer, index })
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new(BankConfig::default())
    }
}

fn require_positive(amount: Decimal) -> Result<(), BankError> {
    if amount <= Decimal::ZERO {
        return Err(BankError::NonPositiveAmount { amount });
    }
    Ok(())
}
