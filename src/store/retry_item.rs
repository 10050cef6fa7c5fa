use chrono::DateTime;
use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A deferred retry of pipeline ingestion for one inbound message (§4.8).
/// Distinct from `pending_messages` retries: this is ingest-side (LLM call
/// failed, upstream ticket lookup failed, etc.), not dispatch-side.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RetryItem {
    pub id: Uuid,
    pub source_message_id: String,
    pub attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub payload: JsonValue,
}

const COLUMNS: &str = "id, source_message_id, attempts, next_attempt_at, last_error, payload";

/// Enqueue (or, if one already exists for this message, leave untouched —
/// the caller is expected to check first) a retry.
pub async fn enqueue<'e, E>(
    executor: E,
    source_message_id: &str,
    next_attempt_at: DateTime<Utc>,
    last_error: Option<&str>,
    payload: JsonValue,
) -> Result<RetryItem, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO retry_items (source_message_id, next_attempt_at, last_error, payload)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (source_message_id) DO UPDATE
            SET next_attempt_at = EXCLUDED.next_attempt_at,
                last_error = EXCLUDED.last_error
         RETURNING {COLUMNS}"
    );
    sqlx::query_as(&query)
        .bind(source_message_id)
        .bind(next_attempt_at)
        .bind(last_error)
        .bind(payload)
        .fetch_one(executor)
        .await
}

/// Lock and fetch due retries for the sweep loop, `FOR UPDATE SKIP LOCKED`
/// in the same style as `supplier_message::fetch_due_for_sweep`.
pub async fn fetch_due_for_sweep(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<RetryItem>, sqlx::Error> {
    let query = format!(
        "SELECT {COLUMNS} FROM retry_items
         WHERE next_attempt_at <= $1
         ORDER BY next_attempt_at ASC
         LIMIT $2
         FOR UPDATE SKIP LOCKED"
    );
    sqlx::query_as(&query).bind(now).bind(limit).fetch_all(&mut **tx).await
}

pub async fn record_attempt<'e, E>(
    executor: E,
    id: Uuid,
    next_attempt_at: DateTime<Utc>,
    last_error: &str,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE retry_items
         SET attempts = attempts + 1, next_attempt_at = $2, last_error = $3
         WHERE id = $1",
    )
    .bind(id)
    .bind(next_attempt_at)
    .bind(last_error)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("DELETE FROM retry_items WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
