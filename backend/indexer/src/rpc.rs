//! Soroban RPC client: polls `getEvents` and decodes offering sale events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use stellar_xdr::curr::{Int128Parts, Limits, ReadXdr, ScVal};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, SaleEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// Base64 XDR `ScVal` topics.
    pub topic: Vec<String>,
    /// Base64 XDR `ScVal` event data.
    pub value: String,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`      : optional opaque pagination cursor from a previous response.
/// * `limit`       : maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        match response {
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                continue;
            }
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    warn!("Rate-limited by RPC (will retry in {backoff}s)");
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let body: RpcResponse = resp.json().await?;

                if let Some(err) = body.error {
                    // Code -32600 / -32601 are hard failures; everything else we retry
                    if err.code == -32600 || err.code == -32601 {
                        return Err(IndexerError::Rpc {
                            code: err.code,
                            message: err.message,
                        });
                    }
                    warn!(
                        "RPC soft error (will retry in {backoff}s): {} {}",
                        err.code, err.message
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let result = body.result.ok_or_else(|| {
                    IndexerError::EventParse("Empty result from getEvents".to_string())
                })?;

                debug!(
                    "Fetched {} events (latest_ledger={:?})",
                    result.events.len(),
                    result.latest_ledger
                );

                return Ok((result.events, result.cursor, result.latest_ledger));
            }
        }
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "base64"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`SaleEvent`] structs.
///
/// Events from failed contract calls and events without an id are dropped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<SaleEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<SaleEvent> {
    let event_id = raw.id.clone().or_else(|| raw.paging_token.clone());
    let Some(event_id) = event_id else {
        debug!("Skipping event without id in tx {:?}", raw.tx_hash);
        return None;
    };

    // The leading topic symbol determines the event type.
    let topics: Vec<Option<ScVal>> = raw.topic.iter().map(|t| decode_scval(t)).collect();
    let symbol = topics
        .first()?
        .as_ref()
        .and_then(symbol_of)
        .unwrap_or_default();
    let kind = EventKind::from_topic(&symbol);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let participant = if kind.is_participant_scoped() {
        topics.get(1).and_then(Option::as_ref).and_then(address_of)
    } else {
        None
    };

    let data = match decode_scval(&raw.value) {
        Some(value) => decode_data(&value, kind),
        None => EventData::default(),
    };

    Some(SaleEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        participant,
        period: data.period,
        stake_amount: data.stake_amount,
        offering_amount: data.offering_amount,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

#[derive(Debug, Default, PartialEq, Eq)]
struct EventData {
    period: Option<i64>,
    stake_amount: Option<String>,
    offering_amount: Option<String>,
}

/// Decode one base64 XDR `ScVal`.
fn decode_scval(raw: &str) -> Option<ScVal> {
    let bytes = match STANDARD.decode(raw) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Event field is not base64: {e}");
            return None;
        }
    };
    match ScVal::from_xdr(bytes, Limits::none()) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Event field is not an ScVal: {e}");
            None
        }
    }
}

/// Pull the fields of a sale event payload. Event structs are published as
/// an `ScVal::Map` keyed by field name.
fn decode_data(value: &ScVal, kind: EventKind) -> EventData {
    match kind {
        EventKind::SaleInitialized => EventData {
            stake_amount: extract_amount(value, "raising_amount"),
            offering_amount: extract_amount(value, "offering_amount"),
            ..EventData::default()
        },
        EventKind::Deposited | EventKind::Refunded => EventData {
            stake_amount: extract_amount(value, "amount"),
            ..EventData::default()
        },
        EventKind::Harvested => EventData {
            period: extract_field(value, "period").and_then(period_of),
            offering_amount: extract_amount(value, "amount"),
            ..EventData::default()
        },
        EventKind::Finalized => EventData {
            stake_amount: extract_amount(value, "stake_amount"),
            offering_amount: extract_amount(value, "offering_amount"),
            ..EventData::default()
        },
        EventKind::Unknown => EventData::default(),
    }
}

fn extract_field<'a>(value: &'a ScVal, key: &str) -> Option<&'a ScVal> {
    let ScVal::Map(Some(map)) = value else {
        return None;
    };
    map.0
        .iter()
        .find(|entry| symbol_of(&entry.key).as_deref() == Some(key))
        .map(|entry| &entry.val)
}

/// An integer amount field, normalised to a decimal string.
fn extract_amount(value: &ScVal, key: &str) -> Option<String> {
    let field = extract_field(value, key)?;
    let amount = match field {
        ScVal::I128(Int128Parts { hi, lo }) => (i128::from(*hi) << 64) | i128::from(*lo),
        ScVal::I64(n) => i128::from(*n),
        ScVal::U64(n) => i128::from(*n),
        ScVal::U32(n) => i128::from(*n),
        ScVal::I32(n) => i128::from(*n),
        other => {
            warn!("Ignoring non-numeric {key} in event data: {other:?}");
            return None;
        }
    };
    Some(amount.to_string())
}

fn period_of(value: &ScVal) -> Option<i64> {
    match value {
        ScVal::U32(n) => Some(i64::from(*n)),
        ScVal::U64(n) => i64::try_from(*n).ok(),
        _ => None,
    }
}

fn symbol_of(value: &ScVal) -> Option<String> {
    match value {
        ScVal::Symbol(symbol) => symbol.0.to_utf8_string().ok(),
        ScVal::String(string) => string.0.to_utf8_string().ok(),
        _ => None,
    }
}

/// Strkey (`G...` or `C...`) of an address topic.
fn address_of(value: &ScVal) -> Option<String> {
    match value {
        ScVal::Address(address) => Some(address.to_string()),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
