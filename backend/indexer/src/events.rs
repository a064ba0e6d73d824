//! Canonical event types emitted by the offering sale contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/offering_sale/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the sale contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The sale was configured (`init` topic).
    SaleInitialized,
    /// A participant committed stake (`deposit` topic).
    Deposited,
    /// Excess stake was returned on a first harvest (`refund` topic).
    Refunded,
    /// Offering was released to a participant (`harvest` topic).
    Harvested,
    /// The operator swept the sale (`final` topic).
    Finalized,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "init" => Self::SaleInitialized,
            "deposit" => Self::Deposited,
            "refund" => Self::Refunded,
            "harvest" => Self::Harvested,
            "final" => Self::Finalized,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaleInitialized => "sale_initialized",
            Self::Deposited => "deposited",
            Self::Refunded => "refunded",
            Self::Harvested => "harvested",
            Self::Finalized => "finalized",
            Self::Unknown => "unknown",
        }
    }

    /// `true` for events whose second topic is the participant address.
    pub fn is_participant_scoped(&self) -> bool {
        matches!(self, Self::Deposited | Self::Refunded | Self::Harvested)
    }
}

/// A fully decoded sale event, ready to be stored in the database.
///
/// Token amounts are `i128` on chain and are carried as decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleEvent {
    /// RPC event id, unique per contract event.
    pub event_id: String,
    pub event_type: String,
    pub participant: Option<String>,
    /// Checkpoint index for periodic harvests; `u32::MAX` for linear ones.
    pub period: Option<i64>,
    pub stake_amount: Option<String>,
    pub offering_amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub participant: Option<String>,
    pub period: Option<i64>,
    pub stake_amount: Option<String>,
    pub offering_amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Aggregate view of everything the indexer has seen for the sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaleSummary {
    pub participants: i64,
    pub deposited: String,
    pub refunded: String,
    pub harvested: String,
    pub stake_swept: String,
    pub offering_swept: String,
    pub finalized: bool,
}
