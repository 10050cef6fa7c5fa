use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

/// Tracks one outstanding (or resolved) outbound message to a supplier, for
/// the reminder scheduler (§4.9). I6: at most one active row per
/// (supplier, ticket) — enforced by a partial unique index.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SupplierMessage {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub ticket_id: Uuid,
    pub sent_at: DateTime<Utc>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub response_received: bool,
    pub next_check_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, supplier_id, ticket_id, sent_at, reminder_sent_at, response_received, \
                        next_check_at";

/// Record that a message was just sent to a supplier (§4.9 `record_sent`).
/// `next_check_at` is `sent_at + supplier_reminder_hours`.
pub async fn record_sent<'e, E>(
    executor: E,
    supplier_id: Uuid,
    ticket_id: Uuid,
    sent_at: DateTime<Utc>,
    reminder_after: Duration,
) -> Result<SupplierMessage, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO supplier_messages (supplier_id, ticket_id, sent_at, next_check_at)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as(&query)
        .bind(supplier_id)
        .bind(ticket_id)
        .bind(sent_at)
        .bind(sent_at + reminder_after)
        .fetch_one(executor)
        .await
}

/// Lock and fetch due, unanswered, not-yet-reminded supplier messages for
/// the sweep loop (§4.9), following the teacher's `delivery.rs` `FOR UPDATE
/// SKIP LOCKED` pattern so concurrent sweepers never double-remind the same
/// row. `reminder_sent_at IS NULL` is what makes this "at most one reminder
/// ever" (P6) rather than one every `reminder_after` window forever.
pub async fn fetch_due_for_sweep(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<SupplierMessage>, sqlx::Error> {
    let query = format!(
        "SELECT {COLUMNS} FROM supplier_messages
         WHERE response_received = FALSE AND reminder_sent_at IS NULL AND next_check_at <= $1
         ORDER BY next_check_at ASC
         LIMIT $2
         FOR UPDATE SKIP LOCKED"
    );
    sqlx::query_as(&query)
        .bind(now)
        .bind(limit)
        .fetch_all(&mut **tx)
        .await
}

/// Mark a reminder sent and push `next_check_at` out by another window, so
/// the same row doesn't fire again immediately.
pub async fn mark_reminder_sent<'e, E>(
    executor: E,
    id: Uuid,
    at: DateTime<Utc>,
    reminder_after: Duration,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE supplier_messages SET reminder_sent_at = $1, next_check_at = $2 WHERE id = $3",
    )
    .bind(at)
    .bind(at + reminder_after)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn mark_response_received<'e, E>(
    executor: E,
    supplier_id: Uuid,
    ticket_id: Uuid,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE supplier_messages
         SET response_received = TRUE
         WHERE supplier_id = $1 AND ticket_id = $2 AND response_received = FALSE",
    )
    .bind(supplier_id)
    .bind(ticket_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_active_for_ticket<'e, E>(
    executor: E,
    supplier_id: Uuid,
    ticket_id: Uuid,
) -> Result<Option<SupplierMessage>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!(
        "SELECT {COLUMNS} FROM supplier_messages
         WHERE supplier_id = $1 AND ticket_id = $2 AND response_received = FALSE"
    );
    sqlx::query_as(&query)
        .bind(supplier_id)
        .bind(ticket_id)
        .fetch_optional(executor)
        .await
}
