//! # Ledger
//!
//! Deposit and harvest over the contract's storage. Each operation reads the
//! state it needs, validates phase and claim preconditions, writes the new
//! state and only then moves assets. The host reverts the whole invocation if
//! any step fails, so a claim is never recorded without its transfer.

use soroban_sdk::{Address, Env};

use crate::allocation::Pool;
use crate::schedule::{self, Claim};
use crate::types::{GlobalTotals, HarvestSchedule, ParticipantRecord, Phase, SaleConfig};
use crate::{custody, events, phase, storage, Error};

/// Phase of the sale right now.
pub fn current_phase(env: &Env, config: &SaleConfig) -> Phase {
    let finalized = storage::load_settlement(env).is_some();
    phase::current(config, env.ledger().timestamp(), finalized)
}

pub fn pool(config: &SaleConfig, totals: &GlobalTotals) -> Pool {
    Pool {
        total_deposited: totals.total_deposited,
        raising_amount: config.raising_amount,
        offering_amount: config.offering_amount,
    }
}

/// Deposit of `participant`, zero if they never deposited.
pub fn deposit_of(env: &Env, participant: &Address) -> i128 {
    storage::load_participant(env, participant)
        .map(|record| record.deposit)
        .unwrap_or(0)
}

/// Record `amount` of stake from `participant` and pull it into the sale.
/// Returns the participant's cumulative deposit.
pub fn deposit(env: &Env, participant: &Address, amount: i128) -> Result<i128, Error> {
    let config = storage::load_config(env)?;
    phase::require_active(current_phase(env, &config))?;
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let mut totals = storage::load_totals(env);
    let mut record = match storage::load_participant(env, participant) {
        Some(record) => record,
        None => {
            storage::save_participant_at(env, totals.participant_count, participant);
            totals.participant_count += 1;
            ParticipantRecord {
                deposit: 0,
                refunded: false,
                claims: schedule::fresh_claims(&config.schedule),
            }
        }
    };

    record.deposit = record
        .deposit
        .checked_add(amount)
        .ok_or(Error::ArithmeticOverflow)?;
    totals.total_deposited = totals
        .total_deposited
        .checked_add(amount)
        .ok_or(Error::ArithmeticOverflow)?;

    storage::save_participant(env, participant, &record);
    storage::save_totals(env, &totals);

    custody::collect(env, &config.stake_asset, participant, amount);
    events::deposited(env, participant, amount, totals.total_deposited);
    Ok(record.deposit)
}

/// Load a record that carries a deposit.
fn load_depositor(env: &Env, participant: &Address) -> Result<ParticipantRecord, Error> {
    storage::load_participant(env, participant)
        .filter(|record| record.deposit > 0)
        .ok_or(Error::NotAParticipant)
}

/// Claim checkpoint `period` of a periodic sale.
pub fn harvest_period(env: &Env, participant: &Address, period: u32) -> Result<Claim, Error> {
    let config = storage::load_config(env)?;
    let checkpoints = match &config.schedule {
        HarvestSchedule::Periodic(checkpoints) => checkpoints.clone(),
        HarvestSchedule::Linear(_) => return Err(Error::ScheduleMismatch),
    };
    checkpoints.get(period).ok_or(Error::PeriodOutOfRange)?;
    phase::require_harvestable(current_phase(env, &config))?;

    let mut record = load_depositor(env, participant)?;
    let mut totals = storage::load_totals(env);
    let pool = pool(&config, &totals);
    let entitlement = pool.offering_amount(record.deposit)?;
    let refund = pool.refunding_amount(record.deposit)?;

    let claim = schedule::harvest_period(
        &checkpoints,
        &mut record,
        entitlement,
        refund,
        period,
        env.ledger().timestamp(),
    )?;
    if claim.settles {
        settle_share(&config, &mut totals, &pool, record.deposit)?;
    }
    settle(env, &config, totals, participant, &record, claim, period)?;
    Ok(claim)
}

/// Release everything vested so far on a linear sale.
pub fn harvest_linear(env: &Env, participant: &Address) -> Result<Claim, Error> {
    let config = storage::load_config(env)?;
    let vesting = match &config.schedule {
        HarvestSchedule::Linear(vesting) => vesting.clone(),
        HarvestSchedule::Periodic(_) => return Err(Error::ScheduleMismatch),
    };
    phase::require_harvestable(current_phase(env, &config))?;

    let mut record = load_depositor(env, participant)?;
    let mut totals = storage::load_totals(env);
    let pool = pool(&config, &totals);
    let entitlement = pool.offering_amount(record.deposit)?;
    let refund = pool.refunding_amount(record.deposit)?;

    let claim = schedule::harvest_linear(
        &vesting,
        config.end_time,
        &mut record,
        entitlement,
        refund,
        env.ledger().timestamp(),
    )?;
    if claim.settles {
        settle_share(&config, &mut totals, &pool, record.deposit)?;
    }
    settle(
        env,
        &config,
        totals,
        participant,
        &record,
        claim,
        events::LINEAR_PERIOD,
    )?;
    Ok(claim)
}

/// Add a participant's final share to the settled aggregates. Deposits are
/// closed once harvesting opens, so the share can no longer move.
fn settle_share(
    config: &SaleConfig,
    totals: &mut GlobalTotals,
    pool: &Pool,
    deposit: i128,
) -> Result<(), Error> {
    let retained = pool.retained_stake(deposit)?;
    let deliverable = schedule::deliverable(&config.schedule, pool.offering_amount(deposit)?);

    totals.settled_count = totals
        .settled_count
        .checked_add(1)
        .ok_or(Error::ArithmeticOverflow)?;
    totals.settled_deposits = totals
        .settled_deposits
        .checked_add(deposit)
        .ok_or(Error::ArithmeticOverflow)?;
    totals.settled_retained = totals
        .settled_retained
        .checked_add(retained)
        .ok_or(Error::ArithmeticOverflow)?;
    totals.settled_deliverable = totals
        .settled_deliverable
        .checked_add(deliverable)
        .ok_or(Error::ArithmeticOverflow)?;

    if totals.settled_count > totals.participant_count
        || totals.settled_deposits > totals.total_deposited
    {
        return Err(Error::InvariantViolation);
    }
    Ok(())
}

/// Fold a claim into the totals, persist, then pay out.
fn settle(
    env: &Env,
    config: &SaleConfig,
    mut totals: GlobalTotals,
    participant: &Address,
    record: &ParticipantRecord,
    claim: Claim,
    period: u32,
) -> Result<(), Error> {
    totals.offering_harvested = totals
        .offering_harvested
        .checked_add(claim.offering)
        .ok_or(Error::ArithmeticOverflow)?;
    totals.stake_refunded = totals
        .stake_refunded
        .checked_add(claim.refund)
        .ok_or(Error::ArithmeticOverflow)?;
    totals.total_debt = totals
        .total_debt
        .checked_add(claim.debt_added)
        .and_then(|debt| debt.checked_sub(claim.debt_released))
        .ok_or(Error::ArithmeticOverflow)?;

    if totals.total_debt < 0
        || totals.offering_harvested > config.offering_amount
        || totals.stake_refunded > totals.total_deposited
    {
        return Err(Error::InvariantViolation);
    }

    storage::save_participant(env, participant, record);
    storage::save_totals(env, &totals);

    if claim.refund > 0 {
        custody::pay(env, &config.stake_asset, participant, claim.refund);
        events::refunded(env, participant, claim.refund);
    }
    custody::pay(env, &config.offering_asset, participant, claim.offering);
    events::harvested(env, participant, period, claim.offering);
    Ok(())
}
