use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

/// One record per inbound message successfully admitted to the pipeline
/// (§3). I1: at most one row per `source_message_id`; enforced by a unique
/// constraint, never by application-level locking alone.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProcessedEmail {
    pub id: Uuid,
    pub source_message_id: String,
    pub thread_id: Option<String>,
    pub subject: Option<String>,
    pub from_address: String,
    pub received_at: DateTime<Utc>,
    pub ticket_id: Option<Uuid>,
    pub success: bool,
    pub error_message: Option<String>,
    pub processed_at: DateTime<Utc>,
}

pub async fn get_by_source_message_id<'e, E>(
    executor: E,
    source_message_id: &str,
) -> Result<Option<ProcessedEmail>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, source_message_id, thread_id, subject, from_address, received_at,
                ticket_id, success, error_message, processed_at
         FROM processed_emails
         WHERE source_message_id = $1",
    )
    .bind(source_message_id)
    .fetch_optional(executor)
    .await
}

/// Step 1 of the Pipeline: claim a `source_message_id` before doing any
/// other work. `INSERT ... ON CONFLICT DO NOTHING` makes this safe under
/// concurrent ingest (P1/P2/scenario 5): exactly one caller gets back a
/// row with `rows_affected() == 1`, everyone else observes the idempotency
/// gate and should treat the message as `already_processed`.
pub async fn claim<'e, E>(
    executor: E,
    source_message_id: &str,
    thread_id: Option<&str>,
    subject: Option<&str>,
    from_address: &str,
    received_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO processed_emails
            (source_message_id, thread_id, subject, from_address, received_at, success)
         VALUES ($1, $2, $3, $4, $5, FALSE)
         ON CONFLICT (source_message_id) DO NOTHING",
    )
    .bind(source_message_id)
    .bind(thread_id)
    .bind(subject)
    .bind(from_address)
    .bind(received_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Record the terminal outcome of processing (Pipeline step 9). Only ever
/// called once per `source_message_id`, after the claiming transaction in
/// `claim` has already committed.
pub async fn finish<'e, E>(
    executor: E,
    source_message_id: &str,
    ticket_id: Option<Uuid>,
    success: bool,
    error_message: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE processed_emails
         SET ticket_id = $2, success = $3, error_message = $4, processed_at = now()
         WHERE source_message_id = $1",
    )
    .bind(source_message_id)
    .bind(ticket_id)
    .bind(success)
    .bind(error_message)
    .execute(executor)
    .await?;
    Ok(())
}
