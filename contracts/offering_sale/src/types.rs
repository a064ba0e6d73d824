//! # Types
//!
//! Shared data structures used across all modules of the offering sale.
//!
//! ## Design decisions
//!
//! ### Config / Totals / Participant split
//!
//! A sale is stored as three kinds of ledger entries:
//!
//! - [`SaleConfig`]: written once at initialisation; never mutated.
//! - [`GlobalTotals`]: written on every deposit, harvest and on finalization.
//! - [`ParticipantRecord`]: one per depositor, created lazily on first deposit
//!   and never deleted.
//!
//! ### Harvest disciplines as a tagged variant
//!
//! [`HarvestSchedule`] is chosen at configuration time and decides the shape
//! of every participant's [`ClaimState`]:
//!
//! ```text
//! HarvestSchedule::Periodic(checkpoints) ──► ClaimState::Periodic(bitmask)
//! HarvestSchedule::Linear(vesting)       ──► ClaimState::Linear(VestingState)
//! ```
//!
//! ### Phase as a derived Finite-State Machine
//!
//! [`Phase`] is never stored. It is derived from the ledger clock and the
//! presence of a [`Settlement`]:
//!
//! ```text
//! Pending ──► Active ──► Ended ──► Finalized
//! ```

use soroban_sdk::{contracttype, Address, Vec};

/// Lifecycle phase of the sale.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// `now < start_time`.
    Pending,
    /// `start_time <= now < end_time`; deposits accepted.
    Active,
    /// `end_time <= now`; harvests accepted.
    Ended,
    /// Operator sweep executed. Harvests of unclaimed entitlements remain valid.
    Finalized,
}

/// Parameters of the continuous vesting discipline.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinearVesting {
    /// Ledger timestamp at which the full entitlement is unlocked.
    pub vesting_end: u64,
    /// Share of the entitlement unlocked at `end_time`, in basis points.
    pub initial_unlock_bps: u32,
}

/// How a participant's offering entitlement is released after the sale.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HarvestSchedule {
    /// Fixed checkpoints; each releases an equal share of the entitlement.
    Periodic(Vec<u64>),
    /// Initial unlock at `end_time`, remainder vests linearly until `vesting_end`.
    Linear(LinearVesting),
}

/// Immutable sale configuration, written once at initialisation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleConfig {
    pub operator: Address,
    /// Asset committed by participants.
    pub stake_asset: Address,
    /// Fixed-supply asset distributed to participants.
    pub offering_asset: Address,
    pub start_time: u64,
    pub end_time: u64,
    /// Total offering supply for sale.
    pub offering_amount: i128,
    /// Fundraising target in stake units.
    pub raising_amount: i128,
    pub schedule: HarvestSchedule,
}

/// Aggregate accounting, updated on deposits, harvests and finalization.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GlobalTotals {
    /// Sum of all deposits. Frozen once the sale has ended.
    pub total_deposited: i128,
    /// Linear discipline only: offering units split into vesting but not yet released.
    pub total_debt: i128,
    /// Stake returned to participants as refunds.
    pub stake_refunded: i128,
    /// Offering released to participants.
    pub offering_harvested: i128,
    pub participant_count: u32,
    /// Participants whose share is settled, i.e. who have harvested at least once.
    pub settled_count: u32,
    /// Deposits of settled participants.
    pub settled_deposits: i128,
    /// Stake kept from settled participants after their refunds.
    pub settled_retained: i128,
    /// Offering settled participants can ever receive.
    pub settled_deliverable: i128,
}

/// Per-participant release progress for the continuous discipline.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VestingState {
    pub has_harvested_initial: bool,
    /// Portion unlocked at `end_time`.
    pub initial_amount: i128,
    /// Portion released linearly between `end_time` and `vesting_end`.
    pub vested_amount: i128,
    /// Running total released so far (initial + vested).
    pub amount_harvested: i128,
}

/// Claim progress, shaped by the sale's [`HarvestSchedule`].
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClaimState {
    /// Bit `i` set once checkpoint `i` has been claimed.
    Periodic(u64),
    Linear(VestingState),
}

/// Permanent receipt of participation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParticipantRecord {
    /// Cumulative deposit. Append-only until `end_time`, immutable afterwards.
    pub deposit: i128,
    /// Set at most once, on the first successful harvest of an over-subscribed sale.
    pub refunded: bool,
    pub claims: ClaimState,
}

/// Written once by the finalizer; its presence marks the sale `Finalized`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settlement {
    pub stake_swept: i128,
    pub offering_swept: i128,
    pub finalized_at: u64,
}

// ── Views ────────────────────────────────────────────────────────────

/// A participant's entitlement split into its release components.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OfferingAllocations {
    /// Released at `end_time` (linear) or by the first checkpoint (periodic).
    pub initial: i128,
    /// Released afterwards.
    pub vested: i128,
}

/// Snapshot of what a participant could receive right now.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenStatus {
    /// Stake refund not yet paid.
    pub stake_refund: i128,
    /// Offering unlocked and not yet harvested.
    pub offering_claimable: i128,
    /// Offering not yet unlocked.
    pub offering_locked: i128,
}

/// Vesting progress of a linear-sale participant, with their refund state.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VestingStatus {
    pub has_harvested_initial: bool,
    pub initial_amount: i128,
    pub vested_amount: i128,
    pub amount_harvested: i128,
    /// `true` once the over-subscription refund has been paid.
    pub refunded: bool,
}

/// Maximum amounts the finalizer may sweep to the operator.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SweepAmounts {
    pub stake: i128,
    pub offering: i128,
}
