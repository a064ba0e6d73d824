//! # Offering Sale Contract
//!
//! A fixed-supply token sale. During a bounded window participants commit a
//! stake asset for a pro-rata claim on a fixed offering supply. Stake above
//! the fundraising target is refunded. After the window closes participants
//! harvest their allocation, either at discrete checkpoints or along a linear
//! vesting curve, and the operator sweeps what is left.
//!
//! One deployed instance is one sale.
//!
//! | Phase     | Entry Point(s)                                   |
//! |-----------|--------------------------------------------------|
//! | Bootstrap | [`OfferingSale::initialize`]                     |
//! | Active    | [`OfferingSale::deposit`]                        |
//! | Ended     | [`OfferingSale::harvest_period`], [`OfferingSale::harvest`] |
//! | Concluded | [`OfferingSale::finalize`]                       |
//! | Queries   | `phase`, `offering_amount`, `refunding_amount`, `token_status`, ... |
//!
//! ## Architecture
//!
//! Arithmetic lives in [`allocation`] and [`schedule`] and is pure.
//! Storage access is delegated to [`storage`], asset movement to [`custody`].
//! This file contains only entry points and validation of initial parameters.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env};

pub mod allocation;
mod custody;
mod events;
mod finalizer;
mod ledger;
pub mod phase;
pub mod schedule;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use events::{Deposited, Finalized, Harvested, Refunded, SaleInitialized, LINEAR_PERIOD};
pub use types::{
    ClaimState, GlobalTotals, HarvestSchedule, LinearVesting, OfferingAllocations,
    ParticipantRecord, Phase, SaleConfig, Settlement, SweepAmounts, TokenStatus, VestingState,
    VestingStatus,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Phase violations
    SaleNotActive         = 1,
    HarvestNotOpen        = 2,
    SaleNotConcluded      = 3,
    AlreadyFinalized      = 4,
    // Claim state
    AlreadyClaimed        = 5,
    NothingToHarvest      = 6,
    NotAParticipant       = 7,
    PeriodOutOfRange      = 8,
    Unauthorized          = 9,
    // Input and setup
    InvalidAmount         = 10,
    InvalidConfig         = 11,
    ScheduleMismatch      = 12,
    AlreadyInitialized    = 13,
    NotInitialized        = 14,
    // Internal
    InvariantViolation    = 15,
    ArithmeticOverflow    = 16,
}

#[contract]
pub struct OfferingSale;

#[contractimpl]
impl OfferingSale {
    // ─────────────────────────────────────────────────────────
    // Administration
    // ─────────────────────────────────────────────────────────

    /// Create the sale. Must be called exactly once, signed by `operator`.
    ///
    /// The offering supply is expected to be transferred to the contract
    /// address by the operator before harvests begin.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        env: Env,
        operator: Address,
        stake_asset: Address,
        offering_asset: Address,
        start_time: u64,
        end_time: u64,
        offering_amount: i128,
        raising_amount: i128,
        schedule: HarvestSchedule,
    ) -> Result<SaleConfig, Error> {
        operator.require_auth();
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        if start_time >= end_time
            || offering_amount <= 0
            || raising_amount <= 0
            || stake_asset == offering_asset
        {
            return Err(Error::InvalidConfig);
        }
        schedule::validate(&schedule, end_time)?;

        let config = SaleConfig {
            operator,
            stake_asset,
            offering_asset,
            start_time,
            end_time,
            offering_amount,
            raising_amount,
            schedule,
        };
        storage::save_config(&env, &config);
        storage::save_totals(&env, &GlobalTotals::default());
        events::sale_initialized(&env, &config);
        Ok(config)
    }

    /// Sweep raised stake and unsold offering to the operator.
    ///
    /// Only the configured operator, only once, and only after the last
    /// checkpoint or the end of vesting. `None` hints sweep the ledger maximum.
    pub fn finalize(
        env: Env,
        operator: Address,
        stake_amount_hint: Option<i128>,
        offering_amount_hint: Option<i128>,
    ) -> Result<SweepAmounts, Error> {
        finalizer::finalize(&env, &operator, stake_amount_hint, offering_amount_hint)
    }

    // ─────────────────────────────────────────────────────────
    // Participation
    // ─────────────────────────────────────────────────────────

    /// Commit `amount` of stake. Returns the participant's cumulative deposit.
    pub fn deposit(env: Env, participant: Address, amount: i128) -> Result<i128, Error> {
        participant.require_auth();
        ledger::deposit(&env, &participant, amount)
    }

    /// Claim checkpoint `period` of a periodic sale. Returns the offering paid.
    /// The first successful claim also pays any refund.
    pub fn harvest_period(env: Env, participant: Address, period: u32) -> Result<i128, Error> {
        participant.require_auth();
        ledger::harvest_period(&env, &participant, period).map(|claim| claim.offering)
    }

    /// Release everything vested so far on a linear sale. Returns the
    /// offering paid. The first call also pays any refund.
    pub fn harvest(env: Env, participant: Address) -> Result<i128, Error> {
        participant.require_auth();
        ledger::harvest_linear(&env, &participant).map(|claim| claim.offering)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn config(env: Env) -> Result<SaleConfig, Error> {
        storage::load_config(&env)
    }

    pub fn phase(env: Env) -> Result<Phase, Error> {
        let config = storage::load_config(&env)?;
        Ok(ledger::current_phase(&env, &config))
    }

    pub fn totals(env: Env) -> GlobalTotals {
        storage::load_totals(&env)
    }

    pub fn total_deposited(env: Env) -> i128 {
        storage::load_totals(&env).total_deposited
    }

    /// Vesting remainder promised and not yet released (linear sales).
    pub fn total_debt(env: Env) -> i128 {
        storage::load_totals(&env).total_debt
    }

    pub fn participant_count(env: Env) -> u32 {
        storage::load_totals(&env).participant_count
    }

    /// Participant by insertion order.
    pub fn participant_at(env: Env, index: u32) -> Option<Address> {
        storage::load_participant_at(&env, index)
    }

    pub fn participant(env: Env, participant: Address) -> Option<ParticipantRecord> {
        storage::load_participant(&env, &participant)
    }

    pub fn deposit_of(env: Env, participant: Address) -> i128 {
        ledger::deposit_of(&env, &participant)
    }

    /// Share of the pool, scaled by [`allocation::ALLOCATION_SCALE`].
    pub fn user_allocation(env: Env, participant: Address) -> Result<i128, Error> {
        let (config, totals) = (storage::load_config(&env)?, storage::load_totals(&env));
        ledger::pool(&config, &totals).user_allocation(ledger::deposit_of(&env, &participant))
    }

    pub fn offering_amount(env: Env, participant: Address) -> Result<i128, Error> {
        let (config, totals) = (storage::load_config(&env)?, storage::load_totals(&env));
        ledger::pool(&config, &totals).offering_amount(ledger::deposit_of(&env, &participant))
    }

    pub fn refunding_amount(env: Env, participant: Address) -> Result<i128, Error> {
        let (config, totals) = (storage::load_config(&env)?, storage::load_totals(&env));
        ledger::pool(&config, &totals).refunding_amount(ledger::deposit_of(&env, &participant))
    }

    /// Entitlement split into its first release and the remainder.
    pub fn offering_allocations(
        env: Env,
        participant: Address,
    ) -> Result<OfferingAllocations, Error> {
        let (config, totals) = (storage::load_config(&env)?, storage::load_totals(&env));
        let entitlement =
            ledger::pool(&config, &totals).offering_amount(ledger::deposit_of(&env, &participant))?;
        schedule::allocations(&config.schedule, entitlement)
    }

    pub fn has_harvested(env: Env, participant: Address, period: u32) -> bool {
        storage::load_participant(&env, &participant)
            .map(|record| schedule::is_period_claimed(&record, period))
            .unwrap_or(false)
    }

    /// Vesting progress of a linear-sale participant and whether their
    /// refund has been paid.
    pub fn vesting_status(env: Env, participant: Address) -> Option<VestingStatus> {
        let record = storage::load_participant(&env, &participant)?;
        match record.claims {
            ClaimState::Linear(state) => Some(VestingStatus {
                has_harvested_initial: state.has_harvested_initial,
                initial_amount: state.initial_amount,
                vested_amount: state.vested_amount,
                amount_harvested: state.amount_harvested,
                refunded: record.refunded,
            }),
            ClaimState::Periodic(_) => None,
        }
    }

    /// Pending refund, offering claimable now and offering still locked.
    pub fn token_status(env: Env, participant: Address) -> Result<TokenStatus, Error> {
        let config = storage::load_config(&env)?;
        let record = storage::load_participant(&env, &participant)
            .filter(|record| record.deposit > 0)
            .ok_or(Error::NotAParticipant)?;
        let pool = ledger::pool(&config, &storage::load_totals(&env));
        schedule::token_status(
            &config.schedule,
            config.end_time,
            &record,
            pool.offering_amount(record.deposit)?,
            pool.refunding_amount(record.deposit)?,
            env.ledger().timestamp(),
        )
    }

    /// What [`OfferingSale::finalize`] would sweep with no hints.
    pub fn sweep_preview(env: Env) -> Result<SweepAmounts, Error> {
        let config = storage::load_config(&env)?;
        let totals = storage::load_totals(&env);
        finalizer::sweepable(&config, &totals)
    }

    pub fn settlement(env: Env) -> Option<Settlement> {
        storage::load_settlement(&env)
    }
}
