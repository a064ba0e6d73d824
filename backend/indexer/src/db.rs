//! Database layer: migrations, event queries and the poll cursor.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::{info, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, EventRecord, SaleEvent, SaleSummary};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Every connection to `:memory:` opens its own empty database.
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Persist the last-seen ledger (and optionally a pagination cursor string).
pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read back the raw cursor string (used to resume pagination mid-ledger).
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events in one transaction. Events whose RPC
/// `event_id` is already stored are silently ignored, so re-polling the same
/// ledger range is harmless.
pub async fn insert_events(pool: &SqlitePool, events: &[SaleEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_id, event_type, participant, period, stake_amount, offering_amount,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ev.event_id)
        .bind(&ev.event_type)
        .bind(&ev.participant)
        .bind(ev.period)
        .bind(&ev.stake_amount)
        .bind(&ev.offering_amount)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        count += rows_affected as usize;
    }
    tx.commit().await?;
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

const EVENT_COLUMNS: &str = "id, event_id, event_type, participant, period, stake_amount, \
     offering_amount, ledger, timestamp, contract_id, tx_hash, created_at";

/// Fetch all events for one participant, ordered by ledger ascending.
pub async fn get_events_for_participant(
    pool: &SqlitePool,
    participant: &str,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE participant = ?1 ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(participant)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC");
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Totals across every indexed event.
///
/// Amounts are stored as decimal text and summed here as `i128`; SQLite's
/// `SUM` would overflow or lose precision.
pub async fn sale_summary(pool: &SqlitePool) -> Result<SaleSummary> {
    let (participants,): (i64,) = sqlx::query_as(
        "SELECT COUNT(DISTINCT participant) FROM events WHERE event_type = ?1",
    )
    .bind(EventKind::Deposited.as_str())
    .fetch_one(pool)
    .await?;

    let rows: Vec<(String, Option<String>, Option<String>)> =
        sqlx::query_as("SELECT event_type, stake_amount, offering_amount FROM events")
            .fetch_all(pool)
            .await?;

    let mut deposited = 0i128;
    let mut refunded = 0i128;
    let mut harvested = 0i128;
    let mut stake_swept = 0i128;
    let mut offering_swept = 0i128;
    let mut finalized = false;

    for (event_type, stake, offering) in &rows {
        let stake = parse_amount(stake.as_deref())?;
        let offering = parse_amount(offering.as_deref())?;
        match event_type.as_str() {
            t if t == EventKind::Deposited.as_str() => deposited = checked(deposited, stake)?,
            t if t == EventKind::Refunded.as_str() => refunded = checked(refunded, stake)?,
            t if t == EventKind::Harvested.as_str() => harvested = checked(harvested, offering)?,
            t if t == EventKind::Finalized.as_str() => {
                stake_swept = checked(stake_swept, stake)?;
                offering_swept = checked(offering_swept, offering)?;
                finalized = true;
            }
            _ => {}
        }
    }

    Ok(SaleSummary {
        participants,
        deposited: deposited.to_string(),
        refunded: refunded.to_string(),
        harvested: harvested.to_string(),
        stake_swept: stake_swept.to_string(),
        offering_swept: offering_swept.to_string(),
        finalized,
    })
}

fn parse_amount(raw: Option<&str>) -> Result<i128> {
    match raw {
        None => Ok(0),
        Some(s) => s.parse::<i128>().map_err(|_| {
            warn!("Stored amount is not an integer: {s}");
            IndexerError::EventParse(format!("invalid stored amount: {s}"))
        }),
    }
}

fn checked(total: i128, amount: i128) -> Result<i128> {
    total
        .checked_add(amount)
        .ok_or_else(|| IndexerError::EventParse("amount total overflows i128".to_string()))
}
