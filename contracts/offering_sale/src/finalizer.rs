//! # Finalizer
//!
//! Operator sweep once the harvest window has fully elapsed. The amounts are
//! derived from [`GlobalTotals`] alone, so the cost does not grow with the
//! number of participants. A participant's share is settled exactly on their
//! first harvest; the rest are bounded as one pooled deposit:
//!
//! ```text
//! stake    = settled_retained    + pooled_retained_stake(unsettled)   (lower bound)
//! offering = offering_amount − settled_deliverable − deliverable(pooled_offering_amount(unsettled))
//! ```
//!
//! Both maximums are exact once every participant has harvested. Otherwise
//! at most one unit of stake per unsettled participant stays in custody, and
//! the sweep never takes stake or offering still owed to anyone.

use soroban_sdk::{Address, Env};

use crate::types::{GlobalTotals, SaleConfig, Settlement, SweepAmounts};
use crate::{custody, events, ledger, phase, schedule, storage, Error};

/// Ledger-computed sweep maximums.
pub fn sweepable(config: &SaleConfig, totals: &GlobalTotals) -> Result<SweepAmounts, Error> {
    let pool = ledger::pool(config, totals);
    let unsettled_deposits = totals
        .total_deposited
        .checked_sub(totals.settled_deposits)
        .ok_or(Error::ArithmeticOverflow)?;
    let unsettled = totals
        .participant_count
        .checked_sub(totals.settled_count)
        .ok_or(Error::InvariantViolation)?;
    if unsettled_deposits < 0 {
        return Err(Error::InvariantViolation);
    }

    let stake = totals
        .settled_retained
        .checked_add(pool.pooled_retained_stake(unsettled_deposits, unsettled)?)
        .ok_or(Error::ArithmeticOverflow)?;
    let owed = schedule::deliverable(
        &config.schedule,
        pool.pooled_offering_amount(unsettled_deposits)?,
    );
    let offering = config
        .offering_amount
        .checked_sub(totals.settled_deliverable)
        .and_then(|left| left.checked_sub(owed))
        .ok_or(Error::ArithmeticOverflow)?;

    if offering < 0
        || offering > config.offering_amount - totals.offering_harvested
        || stake > totals.total_deposited - totals.stake_refunded
        || totals.total_debt < 0
    {
        return Err(Error::InvariantViolation);
    }
    Ok(SweepAmounts { stake, offering })
}

fn resolve_hint(hint: Option<i128>, max: i128) -> Result<i128, Error> {
    match hint {
        None => Ok(max),
        Some(amount) if amount < 0 || amount > max => Err(Error::InvalidAmount),
        Some(amount) => Ok(amount),
    }
}

/// Sweep raised stake and unsold offering to the operator. Hints may ask for
/// less than the ledger maximum, never more.
pub fn finalize(
    env: &Env,
    operator: &Address,
    stake_hint: Option<i128>,
    offering_hint: Option<i128>,
) -> Result<SweepAmounts, Error> {
    let config = storage::load_config(env)?;
    operator.require_auth();
    if *operator != config.operator {
        return Err(Error::Unauthorized);
    }
    let now = env.ledger().timestamp();
    phase::require_concluded(&config, ledger::current_phase(env, &config), now)?;

    let max = sweepable(&config, &storage::load_totals(env))?;

    let swept = SweepAmounts {
        stake: resolve_hint(stake_hint, max.stake)?,
        offering: resolve_hint(offering_hint, max.offering)?,
    };
    storage::save_settlement(
        env,
        &Settlement {
            stake_swept: swept.stake,
            offering_swept: swept.offering,
            finalized_at: now,
        },
    );

    custody::pay(env, &config.stake_asset, operator, swept.stake);
    custody::pay(env, &config.offering_asset, operator, swept.offering);
    events::finalized(env, operator, swept.stake, swept.offering);
    Ok(swept)
}
