//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the sale:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key          | Type           | Description                          |
//! |--------------|----------------|--------------------------------------|
//! | `Config`     | `SaleConfig`   | Immutable sale parameters            |
//! | `Totals`     | `GlobalTotals` | Aggregate accounting                 |
//! | `Settlement` | `Settlement`   | Present once the sale is finalized   |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                  | Type                | Description                    |
//! |----------------------|---------------------|--------------------------------|
//! | `Participant(addr)`  | `ParticipantRecord` | Deposit and claim progress     |
//! | `ParticipantAt(i)`   | `Address`           | Insertion-ordered participant index |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//! Participant records are receipts and are never removed.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::{GlobalTotals, ParticipantRecord, SaleConfig, Settlement};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Immutable sale configuration (Instance).
    Config,
    /// Aggregate accounting (Instance).
    Totals,
    /// Finalization record (Instance).
    Settlement,
    /// Participant record keyed by address (Persistent).
    Participant(Address),
    /// Participant address keyed by insertion index (Persistent).
    ParticipantAt(u32),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn save_config(env: &Env, config: &SaleConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn load_config(env: &Env) -> Result<SaleConfig, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

/// Aggregate totals; all zero before the first deposit.
pub fn load_totals(env: &Env) -> GlobalTotals {
    env.storage()
        .instance()
        .get(&DataKey::Totals)
        .unwrap_or_default()
}

pub fn save_totals(env: &Env, totals: &GlobalTotals) {
    env.storage().instance().set(&DataKey::Totals, totals);
    bump_instance(env);
}

pub fn load_settlement(env: &Env) -> Option<Settlement> {
    env.storage().instance().get(&DataKey::Settlement)
}

pub fn save_settlement(env: &Env, settlement: &Settlement) {
    env.storage().instance().set(&DataKey::Settlement, settlement);
    bump_instance(env);
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

pub fn load_participant(env: &Env, participant: &Address) -> Option<ParticipantRecord> {
    let key = DataKey::Participant(participant.clone());
    let record = env.storage().persistent().get(&key);
    if record.is_some() {
        bump_persistent(env, &key);
    }
    record
}

pub fn save_participant(env: &Env, participant: &Address, record: &ParticipantRecord) {
    let key = DataKey::Participant(participant.clone());
    env.storage().persistent().set(&key, record);
    bump_persistent(env, &key);
}

pub fn load_participant_at(env: &Env, index: u32) -> Option<Address> {
    let key = DataKey::ParticipantAt(index);
    let participant = env.storage().persistent().get(&key);
    if participant.is_some() {
        bump_persistent(env, &key);
    }
    participant
}

pub fn save_participant_at(env: &Env, index: u32, participant: &Address) {
    let key = DataKey::ParticipantAt(index);
    env.storage().persistent().set(&key, participant);
    bump_persistent(env, &key);
}
