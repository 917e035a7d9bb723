//! Agent-side banking: deposits, loan repayment, emergency loans.
//!
//! On every banking check an adult with spare cash walks to its bank. At
//! the counter the surplus over the cash reserve first pays down a loan,
//! otherwise it opens a checking account or tops up the first one. A broke
//! adult with no loan borrows a small amount without walking anywhere.

use hamlet_types::{AccountKind, Activity, AgentHandle, AgentId, BuildingId, Position, Thought, TownId};
use hamlet_world::{Building, Town};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::debug;

use crate::behavior::{TickContext, town_mut, town_ref};
use crate::error::AgentError;

/// Run the banking check for `handle`, or finish its bank visit.
pub fn update_banking<R: Rng>(ctx: &mut TickContext<'_, R>, handle: AgentHandle) -> Result<(), AgentError> {
    let config = ctx.config;
    let banking = &config.banking;

    let agent = ctx.pool.try_get_mut(handle)?;
    if agent.activity == Activity::Banking {
        return visit_bank(ctx, handle);
    }
    if agent.timers.banking_ms > 0.0 || !agent.is_adult(&config.lifecycle) {
        return Ok(());
    }
    agent.timers.banking_ms = banking.check_interval_ms;
    if !matches!(agent.activity, Activity::Idle | Activity::Wandering | Activity::Working) {
        return Ok(());
    }

    let (id, money, pos, town_id, preferred) =
        (agent.id, agent.money, agent.position, agent.town, agent.preferred_bank);
    let Some(town) = town_mut(ctx.towns, town_id) else {
        return Ok(());
    };

    if money > banking.deposit_threshold {
        let bank = preferred
            .and_then(|b| town.building(b))
            .filter(|b| b.is_bank())
            .or_else(|| town.find_nearest_building(pos, Building::is_bank))
            .map(|b| (b.id, b.position));
        if let Some((bank_id, bank_pos)) = bank {
            let agent = ctx.pool.try_get_mut(handle)?;
            agent.preferred_bank = Some(bank_id);
            agent.target = Some(bank_pos);
            agent.activity = Activity::Banking;
            agent.thought = Some(Thought::GoingToBank);
        }
        return Ok(());
    }

    if money < config.needs.meal_price {
        emergency_loan(ctx, handle, id, pos, town_id)?;
    }
    Ok(())
}

/// Borrow the emergency amount from the nearest bank in town.
fn emergency_loan<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    handle: AgentHandle,
    id: AgentId,
    pos: Position,
    town_id: Option<TownId>,
) -> Result<(), AgentError> {
    let amount = ctx.config.banking.emergency_loan;
    let Some(town) = town_mut(ctx.towns, town_id) else {
        return Ok(());
    };
    let Some(bank_id) = town.find_nearest_building(pos, Building::is_bank).map(|b| b.id) else {
        return Ok(());
    };
    let Some(bank) = town.building_mut(bank_id).and_then(Building::bank_mut) else {
        return Ok(());
    };
    if bank.loan(id).is_some() {
        return Ok(());
    }
    match bank.issue_loan(id, amount) {
        Ok(()) => {
            let agent = ctx.pool.try_get_mut(handle)?;
            agent.earn(amount)?;
            agent.thought = Some(Thought::TookLoan);
        }
        Err(e) => debug!(customer = %id, error = %e, "emergency loan refused"),
    }
    Ok(())
}

fn bank_position(towns: &[Town], town: Option<TownId>, bank: Option<BuildingId>) -> Option<Position> {
    let bank = bank?;
    town_ref(towns, town)?
        .building(bank)
        .filter(|b| b.is_bank())
        .map(|b| b.position)
}

/// Walk to the preferred bank and do business once within reach.
fn visit_bank<R: Rng>(ctx: &mut TickContext<'_, R>, handle: AgentHandle) -> Result<(), AgentError> {
    let config = ctx.config;
    let agent = ctx.pool.try_get(handle)?;
    let (id, money, pos, town_id, bank_id) =
        (agent.id, agent.money, agent.position, agent.town, agent.preferred_bank);

    let Some(bank_pos) = bank_position(ctx.towns, town_id, bank_id) else {
        let agent = ctx.pool.try_get_mut(handle)?;
        agent.preferred_bank = None;
        agent.activity = Activity::Idle;
        agent.target = None;
        return Ok(());
    };
    if pos.distance(bank_pos) > config.needs.reach {
        ctx.pool.try_get_mut(handle)?.target = Some(bank_pos);
        return Ok(());
    }

    let excess = money
        .checked_sub(config.banking.cash_reserve)
        .filter(|e| *e > Decimal::ZERO);
    let bank = bank_id
        .zip(town_mut(ctx.towns, town_id))
        .and_then(|(b, town)| town.building_mut(b))
        .and_then(Building::bank_mut);
    let outcome = match (excess, bank) {
        (Some(excess), Some(bank)) => {
            let result = if bank.loan(id).is_some() {
                bank.repay_loan(id, excess).map(|paid| (paid, Thought::RepaidLoan))
            } else if bank.accounts(id).is_empty() {
                bank.create_account(id, AccountKind::Checking, excess)
                    .map(|_| (excess, Thought::OpenedBankAccount))
            } else {
                bank.deposit_to_account(id, 0, excess)
                    .map(|_| (excess, Thought::DepositedSavings))
            };
            result
                .map_err(|e| debug!(customer = %id, error = %e, "bank visit refused"))
                .ok()
        }
        _ => None,
    };

    let agent = ctx.pool.try_get_mut(handle)?;
    if let Some((amount, thought)) = outcome {
        agent.spend(amount)?;
        agent.thought = Some(thought);
        debug!(agent = %agent.name, amount = %amount, "banked");
    }
    agent.activity = Activity::Idle;
    agent.target = None;
    Ok(())
}
