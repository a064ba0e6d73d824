//! # Events
//!
//! Every state change publishes one event. The off-chain indexer keys on the
//! leading topic symbol and reads the participant from the second topic.
//!
//! | Topic                      | Data              |
//! |----------------------------|-------------------|
//! | `("init",)`                | [`SaleInitialized`] |
//! | `("deposit", participant)` | [`Deposited`]     |
//! | `("refund", participant)`  | [`Refunded`]      |
//! | `("harvest", participant)` | [`Harvested`]     |
//! | `("final",)`               | [`Finalized`]     |

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use crate::types::SaleConfig;

/// `period` value carried by linear-vesting harvests.
pub const LINEAR_PERIOD: u32 = u32::MAX;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleInitialized {
    pub operator: Address,
    pub stake_asset: Address,
    pub offering_asset: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub offering_amount: i128,
    pub raising_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deposited {
    pub participant: Address,
    pub amount: i128,
    pub total_deposited: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Refunded {
    pub participant: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Harvested {
    pub participant: Address,
    /// Checkpoint index, or [`LINEAR_PERIOD`].
    pub period: u32,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Finalized {
    pub operator: Address,
    pub stake_amount: i128,
    pub offering_amount: i128,
}

pub fn sale_initialized(env: &Env, config: &SaleConfig) {
    env.events().publish(
        (symbol_short!("init"),),
        SaleInitialized {
            operator: config.operator.clone(),
            stake_asset: config.stake_asset.clone(),
            offering_asset: config.offering_asset.clone(),
            start_time: config.start_time,
            end_time: config.end_time,
            offering_amount: config.offering_amount,
            raising_amount: config.raising_amount,
        },
    );
}

pub fn deposited(env: &Env, participant: &Address, amount: i128, total_deposited: i128) {
    env.events().publish(
        (symbol_short!("deposit"), participant.clone()),
        Deposited {
            participant: participant.clone(),
            amount,
            total_deposited,
        },
    );
}

pub fn refunded(env: &Env, participant: &Address, amount: i128) {
    env.events().publish(
        (symbol_short!("refund"), participant.clone()),
        Refunded {
            participant: participant.clone(),
            amount,
        },
    );
}

pub fn harvested(env: &Env, participant: &Address, period: u32, amount: i128) {
    env.events().publish(
        (symbol_short!("harvest"), participant.clone()),
        Harvested {
            participant: participant.clone(),
            period,
            amount,
        },
    );
}

pub fn finalized(env: &Env, operator: &Address, stake_amount: i128, offering_amount: i128) {
    env.events().publish(
        (symbol_short!("final"),),
        Finalized {
            operator: operator.clone(),
            stake_amount,
            offering_amount,
        },
    );
}
