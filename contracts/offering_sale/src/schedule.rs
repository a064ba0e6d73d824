//! # Schedule
//!
//! Decides how much of a participant's entitlement is claimable at a given
//! time and records the claim. Both disciplines share the same entry shape:
//! the caller passes the participant's current entitlement and refund (from
//! [`crate::allocation`]) together with the record, and gets back a [`Claim`]
//! describing what to transfer. The record is mutated in place; persisting it
//! and moving assets is the ledger's job.
//!
//! | Discipline | Release shape                                         |
//! |------------|-------------------------------------------------------|
//! | Periodic   | `entitlement / N` at each of `N` checkpoints          |
//! | Linear     | initial unlock at `end_time`, rest linear to `vesting_end` |
//!
//! Refunds ride along with the first successful harvest and are paid once.

use soroban_sdk::{Env, Vec};

use crate::allocation::mul_div;
use crate::types::{
    ClaimState, HarvestSchedule, LinearVesting, OfferingAllocations, ParticipantRecord,
    TokenStatus, VestingState,
};
use crate::Error;

/// Upper bound on periodic checkpoints (one bit each in the claim mask).
pub const MAX_PERIODS: u32 = 64;

/// Denominator for [`LinearVesting::initial_unlock_bps`].
pub const BPS_DENOMINATOR: i128 = 10_000;

/// Outcome of a successful harvest.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Claim {
    /// Offering units to send to the participant.
    pub offering: i128,
    /// Stake units to refund to the participant.
    pub refund: i128,
    /// Vesting remainder newly promised by this call (linear, first call only).
    pub debt_added: i128,
    /// Part of `offering` that came out of the vesting remainder.
    pub debt_released: i128,
    /// `true` on the participant's first harvest, which fixes their share.
    pub settles: bool,
}

/// Checkpoints `first, first + interval, ...`, `count` entries long.
pub fn evenly_spaced(env: &Env, first: u64, interval: u64, count: u32) -> Vec<u64> {
    let mut checkpoints = Vec::new(env);
    let mut at = first;
    for _ in 0..count {
        checkpoints.push_back(at);
        at = at.saturating_add(interval);
    }
    checkpoints
}

/// Validate a schedule against the sale's `end_time`.
pub fn validate(schedule: &HarvestSchedule, end_time: u64) -> Result<(), Error> {
    match schedule {
        HarvestSchedule::Periodic(checkpoints) => {
            let len = checkpoints.len();
            if len == 0 || len > MAX_PERIODS {
                return Err(Error::InvalidConfig);
            }
            let mut previous: Option<u64> = None;
            for at in checkpoints.iter() {
                let in_order = match previous {
                    None => at >= end_time,
                    Some(prev) => at > prev,
                };
                if !in_order {
                    return Err(Error::InvalidConfig);
                }
                previous = Some(at);
            }
            Ok(())
        }
        HarvestSchedule::Linear(vesting) => {
            if vesting.vesting_end <= end_time
                || i128::from(vesting.initial_unlock_bps) > BPS_DENOMINATOR
            {
                return Err(Error::InvalidConfig);
            }
            Ok(())
        }
    }
}

/// Empty claim state for a new participant.
pub fn fresh_claims(schedule: &HarvestSchedule) -> ClaimState {
    match schedule {
        HarvestSchedule::Periodic(_) => ClaimState::Periodic(0),
        HarvestSchedule::Linear(_) => ClaimState::Linear(VestingState::default()),
    }
}

/// Pay the refund once, on whichever harvest comes first.
fn take_refund(record: &mut ParticipantRecord, refund: i128) -> i128 {
    if record.refunded || refund <= 0 {
        return 0;
    }
    record.refunded = true;
    refund
}

// ── Periodic ─────────────────────────────────────────────────────────

/// Offering released by one checkpoint.
pub fn per_period(entitlement: i128, periods: u32) -> i128 {
    if periods == 0 {
        return 0;
    }
    entitlement / i128::from(periods)
}

/// Claim checkpoint `period` for `record`.
pub fn harvest_period(
    checkpoints: &Vec<u64>,
    record: &mut ParticipantRecord,
    entitlement: i128,
    refund: i128,
    period: u32,
    now: u64,
) -> Result<Claim, Error> {
    let unlock_at = checkpoints.get(period).ok_or(Error::PeriodOutOfRange)?;
    if now < unlock_at {
        return Err(Error::HarvestNotOpen);
    }
    let mask = match record.claims {
        ClaimState::Periodic(mask) => mask,
        ClaimState::Linear(_) => return Err(Error::ScheduleMismatch),
    };
    let bit = 1u64 << period;
    if mask & bit != 0 {
        return Err(Error::AlreadyClaimed);
    }

    let claim = Claim {
        offering: per_period(entitlement, checkpoints.len()),
        refund: take_refund(record, refund),
        settles: mask == 0,
        ..Claim::default()
    };
    record.claims = ClaimState::Periodic(mask | bit);
    Ok(claim)
}

/// `true` once `period` has been claimed.
pub fn is_period_claimed(record: &ParticipantRecord, period: u32) -> bool {
    match record.claims {
        ClaimState::Periodic(mask) if period < MAX_PERIODS => mask & (1u64 << period) != 0,
        _ => false,
    }
}

// ── Linear ───────────────────────────────────────────────────────────

/// Split an entitlement into the initial unlock and the vesting remainder.
pub fn split(vesting: &LinearVesting, entitlement: i128) -> Result<OfferingAllocations, Error> {
    let initial = mul_div(
        entitlement,
        i128::from(vesting.initial_unlock_bps),
        BPS_DENOMINATOR,
    )?;
    Ok(OfferingAllocations {
        initial,
        vested: entitlement - initial,
    })
}

/// Cumulative amount released to `state` by time `now`. Non-decreasing in
/// `now`, equal to `initial + vested` from `vesting_end` on.
pub fn entitled_at(
    vesting: &LinearVesting,
    end_time: u64,
    state: &VestingState,
    now: u64,
) -> Result<i128, Error> {
    let duration = vesting.vesting_end.saturating_sub(end_time);
    let elapsed = now.saturating_sub(end_time).min(duration);
    let released = if elapsed >= duration {
        state.vested_amount
    } else {
        mul_div(
            state.vested_amount,
            i128::from(elapsed),
            i128::from(duration),
        )?
    };
    state
        .initial_amount
        .checked_add(released)
        .ok_or(Error::ArithmeticOverflow)
}

/// Release everything vested so far to `record`.
pub fn harvest_linear(
    vesting: &LinearVesting,
    end_time: u64,
    record: &mut ParticipantRecord,
    entitlement: i128,
    refund: i128,
    now: u64,
) -> Result<Claim, Error> {
    if now < end_time {
        return Err(Error::HarvestNotOpen);
    }
    let mut state = match &record.claims {
        ClaimState::Linear(state) => state.clone(),
        ClaimState::Periodic(_) => return Err(Error::ScheduleMismatch),
    };

    let mut claim = Claim::default();
    let first = !state.has_harvested_initial;
    if first {
        let parts = split(vesting, entitlement)?;
        state.initial_amount = parts.initial;
        state.vested_amount = parts.vested;
        state.has_harvested_initial = true;
        claim.debt_added = parts.vested;
        claim.refund = take_refund(record, refund);
        claim.settles = true;
    }

    let entitled = entitled_at(vesting, end_time, &state, now)?;
    let payout = entitled - state.amount_harvested;
    if payout <= 0 && !first {
        return Err(Error::NothingToHarvest);
    }
    if payout < 0 || entitled > state.initial_amount + state.vested_amount {
        return Err(Error::InvariantViolation);
    }

    claim.offering = payout;
    claim.debt_released = if first {
        payout - state.initial_amount
    } else {
        payout
    };
    state.amount_harvested = entitled;
    record.claims = ClaimState::Linear(state);
    Ok(claim)
}

// ── Views ────────────────────────────────────────────────────────────

/// Initial vs later release of `entitlement` under `schedule`.
pub fn allocations(
    schedule: &HarvestSchedule,
    entitlement: i128,
) -> Result<OfferingAllocations, Error> {
    match schedule {
        HarvestSchedule::Periodic(checkpoints) => {
            let initial = per_period(entitlement, checkpoints.len());
            Ok(OfferingAllocations {
                initial,
                vested: initial * (i128::from(checkpoints.len()) - 1),
            })
        }
        HarvestSchedule::Linear(vesting) => split(vesting, entitlement),
    }
}

/// What `record` could harvest at `now`, and what remains locked.
pub fn token_status(
    schedule: &HarvestSchedule,
    end_time: u64,
    record: &ParticipantRecord,
    entitlement: i128,
    refund: i128,
    now: u64,
) -> Result<TokenStatus, Error> {
    let stake_refund = if record.refunded { 0 } else { refund.max(0) };
    match (schedule, &record.claims) {
        (HarvestSchedule::Periodic(checkpoints), ClaimState::Periodic(_)) => {
            let share = per_period(entitlement, checkpoints.len());
            let mut claimable = 0i128;
            let mut locked = 0i128;
            for (period, unlock_at) in (0u32..).zip(checkpoints.iter()) {
                if now < unlock_at {
                    locked += share;
                } else if !is_period_claimed(record, period) {
                    claimable += share;
                }
            }
            Ok(TokenStatus {
                stake_refund,
                offering_claimable: claimable,
                offering_locked: locked,
            })
        }
        (HarvestSchedule::Linear(vesting), ClaimState::Linear(state)) => {
            let mut state = state.clone();
            if !state.has_harvested_initial {
                let parts = split(vesting, entitlement)?;
                state.initial_amount = parts.initial;
                state.vested_amount = parts.vested;
            }
            let total = state.initial_amount + state.vested_amount;
            if now < end_time {
                return Ok(TokenStatus {
                    stake_refund,
                    offering_claimable: 0,
                    offering_locked: total,
                });
            }
            let entitled = entitled_at(vesting, end_time, &state, now)?;
            Ok(TokenStatus {
                stake_refund,
                offering_claimable: entitled - state.amount_harvested,
                offering_locked: total - entitled,
            })
        }
        _ => Err(Error::ScheduleMismatch),
    }
}

/// Offering this participant can ever receive under `schedule`.
pub fn deliverable(schedule: &HarvestSchedule, entitlement: i128) -> i128 {
    match schedule {
        HarvestSchedule::Periodic(checkpoints) => {
            per_period(entitlement, checkpoints.len()) * i128::from(checkpoints.len())
        }
        HarvestSchedule::Linear(_) => entitlement,
    }
}

/// Vesting remainder promised to `record` and not yet released.
pub fn outstanding_debt(record: &ParticipantRecord) -> i128 {
    match &record.claims {
        ClaimState::Linear(state) if state.has_harvested_initial => {
            let released = state.amount_harvested - state.initial_amount;
            state.vested_amount - released
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::vec;

    fn periodic_record(deposit: i128) -> ParticipantRecord {
        ParticipantRecord {
            deposit,
            refunded: false,
            claims: ClaimState::Periodic(0),
        }
    }

    fn linear_record(deposit: i128) -> ParticipantRecord {
        ParticipantRecord {
            deposit,
            refunded: false,
            claims: ClaimState::Linear(VestingState::default()),
        }
    }

    fn quarter_unlock() -> LinearVesting {
        LinearVesting {
            vesting_end: 1_200,
            initial_unlock_bps: 2_500,
        }
    }

    #[test]
    fn evenly_spaced_builds_offsets() {
        let env = Env::default();
        assert_eq!(evenly_spaced(&env, 30, 10, 4), vec![&env, 30, 40, 50, 60]);
    }

    #[test]
    fn validate_rejects_bad_schedules() {
        let env = Env::default();
        assert_eq!(
            validate(&HarvestSchedule::Periodic(Vec::new(&env)), 100),
            Err(Error::InvalidConfig)
        );
        assert_eq!(
            validate(&HarvestSchedule::Periodic(vec![&env, 90, 110]), 100),
            Err(Error::InvalidConfig)
        );
        assert_eq!(
            validate(&HarvestSchedule::Periodic(vec![&env, 100, 100]), 100),
            Err(Error::InvalidConfig)
        );
        assert_eq!(
            validate(&HarvestSchedule::Periodic(evenly_spaced(&env, 100, 1, 65)), 100),
            Err(Error::InvalidConfig)
        );
        assert_eq!(
            validate(&HarvestSchedule::Periodic(vec![&env, 100, 150]), 100),
            Ok(())
        );
        let too_generous = LinearVesting {
            vesting_end: 200,
            initial_unlock_bps: 10_001,
        };
        assert_eq!(
            validate(&HarvestSchedule::Linear(too_generous), 100),
            Err(Error::InvalidConfig)
        );
        let ends_early = LinearVesting {
            vesting_end: 100,
            initial_unlock_bps: 0,
        };
        assert_eq!(
            validate(&HarvestSchedule::Linear(ends_early), 100),
            Err(Error::InvalidConfig)
        );
    }

    #[test]
    fn periodic_claims_each_checkpoint_once() {
        let env = Env::default();
        let checkpoints = vec![&env, 100, 200, 300, 400];
        let mut record = periodic_record(10);

        assert_eq!(
            harvest_period(&checkpoints, &mut record, 1_000, 40, 1, 150),
            Err(Error::HarvestNotOpen)
        );
        assert_eq!(
            harvest_period(&checkpoints, &mut record, 1_000, 40, 4, 1_000),
            Err(Error::PeriodOutOfRange)
        );

        let first = harvest_period(&checkpoints, &mut record, 1_000, 40, 0, 100).unwrap();
        assert_eq!(first.offering, 250);
        assert_eq!(first.refund, 40);
        assert!(first.settles);
        assert!(record.refunded);
        assert!(is_period_claimed(&record, 0));
        assert!(!is_period_claimed(&record, 1));

        assert_eq!(
            harvest_period(&checkpoints, &mut record, 1_000, 40, 0, 500),
            Err(Error::AlreadyClaimed)
        );

        let later = harvest_period(&checkpoints, &mut record, 1_000, 40, 3, 400).unwrap();
        assert_eq!(later.offering, 250);
        assert_eq!(later.refund, 0);
        assert!(!later.settles);
    }

    #[test]
    fn linear_releases_initial_then_vests() {
        let vesting = quarter_unlock();
        let mut record = linear_record(10);

        assert_eq!(
            harvest_linear(&vesting, 200, &mut record, 1_000, 0, 199),
            Err(Error::HarvestNotOpen)
        );

        let at_end = harvest_linear(&vesting, 200, &mut record, 1_000, 7, 200).unwrap();
        assert_eq!(at_end.offering, 250);
        assert_eq!(at_end.refund, 7);
        assert_eq!(at_end.debt_added, 750);
        assert_eq!(at_end.debt_released, 0);
        assert!(at_end.settles);

        assert_eq!(
            harvest_linear(&vesting, 200, &mut record, 1_000, 7, 200),
            Err(Error::NothingToHarvest)
        );

        let half = harvest_linear(&vesting, 200, &mut record, 1_000, 7, 700).unwrap();
        assert_eq!(half.offering, 375);
        assert_eq!(half.refund, 0);
        assert_eq!(half.debt_released, 375);
        assert!(!half.settles);

        let rest = harvest_linear(&vesting, 200, &mut record, 1_000, 7, 5_000).unwrap();
        assert_eq!(rest.offering, 375);
        assert_eq!(outstanding_debt(&record), 0);
        assert_eq!(
            harvest_linear(&vesting, 200, &mut record, 1_000, 7, 9_000),
            Err(Error::NothingToHarvest)
        );
    }

    #[test]
    fn late_first_harvest_releases_everything_vested() {
        let vesting = quarter_unlock();
        let mut record = linear_record(10);
        let claim = harvest_linear(&vesting, 200, &mut record, 1_000, 0, 2_000).unwrap();
        assert_eq!(claim.offering, 1_000);
        assert_eq!(claim.debt_added, 750);
        assert_eq!(claim.debt_released, 750);
        assert_eq!(outstanding_debt(&record), 0);
    }

    #[test]
    fn wrong_discipline_is_rejected() {
        let env = Env::default();
        let mut linear = linear_record(1);
        assert_eq!(
            harvest_period(&vec![&env, 100], &mut linear, 10, 0, 0, 100),
            Err(Error::ScheduleMismatch)
        );
        let mut periodic = periodic_record(1);
        assert_eq!(
            harvest_linear(&quarter_unlock(), 200, &mut periodic, 10, 0, 300),
            Err(Error::ScheduleMismatch)
        );
    }

    #[test]
    fn token_status_tracks_unlocks() {
        let env = Env::default();
        let schedule = HarvestSchedule::Periodic(vec![&env, 100, 200, 300, 400]);
        let mut record = periodic_record(10);
        let status = token_status(&schedule, 100, &record, 1_000, 5, 250).unwrap();
        assert_eq!(status.offering_claimable, 500);
        assert_eq!(status.offering_locked, 500);
        assert_eq!(status.stake_refund, 5);

        if let HarvestSchedule::Periodic(checkpoints) = &schedule {
            harvest_period(checkpoints, &mut record, 1_000, 5, 0, 250).unwrap();
        }
        let status = token_status(&schedule, 100, &record, 1_000, 5, 250).unwrap();
        assert_eq!(status.offering_claimable, 250);
        assert_eq!(status.stake_refund, 0);

        let linear = HarvestSchedule::Linear(quarter_unlock());
        let status = token_status(&linear, 200, &linear_record(10), 1_000, 0, 700).unwrap();
        assert_eq!(status.offering_claimable, 625);
        assert_eq!(status.offering_locked, 375);
    }

    #[test]
    fn periodic_dust_is_not_deliverable() {
        let env = Env::default();
        let schedule = HarvestSchedule::Periodic(vec![&env, 1, 2, 3]);
        assert_eq!(deliverable(&schedule, 10), 9);
        assert_eq!(deliverable(&HarvestSchedule::Linear(quarter_unlock()), 10), 10);
        assert_eq!(
            allocations(&schedule, 10),
            Ok(OfferingAllocations {
                initial: 3,
                vested: 6
            })
        );
    }
}
