//! # Phase
//!
//! Derives the sale [`Phase`] from the clock and the finalization flag, and
//! guards each operation against the phase it requires. Holds no state.

use crate::types::{HarvestSchedule, Phase, SaleConfig};
use crate::Error;

/// Phase of `config` at ledger time `now`.
pub fn current(config: &SaleConfig, now: u64, finalized: bool) -> Phase {
    if finalized {
        Phase::Finalized
    } else if now < config.start_time {
        Phase::Pending
    } else if now < config.end_time {
        Phase::Active
    } else {
        Phase::Ended
    }
}

/// Deposits are accepted only while `Active`.
pub fn require_active(phase: Phase) -> Result<(), Error> {
    match phase {
        Phase::Active => Ok(()),
        _ => Err(Error::SaleNotActive),
    }
}

/// Harvests are accepted from `Ended` onward.
pub fn require_harvestable(phase: Phase) -> Result<(), Error> {
    match phase {
        Phase::Ended | Phase::Finalized => Ok(()),
        Phase::Pending | Phase::Active => Err(Error::HarvestNotOpen),
    }
}

/// Timestamp after which every checkpoint has passed or vesting is complete.
pub fn harvest_window_end(config: &SaleConfig) -> u64 {
    match &config.schedule {
        HarvestSchedule::Periodic(checkpoints) => checkpoints.last().unwrap_or(config.end_time),
        HarvestSchedule::Linear(vesting) => vesting.vesting_end,
    }
}

/// Finalization needs an `Ended` sale whose harvest window has fully elapsed.
pub fn require_concluded(config: &SaleConfig, phase: Phase, now: u64) -> Result<(), Error> {
    match phase {
        Phase::Finalized => Err(Error::AlreadyFinalized),
        Phase::Pending | Phase::Active => Err(Error::SaleNotConcluded),
        Phase::Ended if now < harvest_window_end(config) => Err(Error::SaleNotConcluded),
        Phase::Ended => Ok(()),
    }
}
