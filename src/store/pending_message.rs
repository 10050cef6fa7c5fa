use chrono::DateTime;
use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::MessageKind;
use crate::domain::PendingStatus;

/// A draft message awaiting operator review before it may be sent (§3/§4.7).
/// State machine: pending -> approved -> sent, pending -> rejected,
/// approved -> failed -> approved, failed -> rejected.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub kind: String,
    pub to_address: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: JsonValue,
    pub confidence: Option<f64>,
    pub ai_decision_id: Option<Uuid>,
    pub status: String,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl PendingMessage {
    pub fn status(&self) -> PendingStatus {
        self.status
            .parse()
            .expect("status column always holds a valid PendingStatus")
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
            .parse()
            .expect("kind column always holds a valid MessageKind")
    }
}

pub struct NewPendingMessage {
    pub ticket_id: Uuid,
    pub kind: MessageKind,
    pub to_address: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: JsonValue,
    pub confidence: Option<f64>,
    pub ai_decision_id: Option<Uuid>,
    pub status: PendingStatus,
}

const COLUMNS: &str = "id, ticket_id, kind, to_address, cc, bcc, subject, body, attachments, \
                        confidence, ai_decision_id, status, retry_count, last_error, created_at, \
                        reviewed_at, reviewed_by, sent_at, rejection_reason";

pub async fn insert<'e, E>(
    executor: E,
    new: NewPendingMessage,
) -> Result<PendingMessage, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO pending_messages
            (ticket_id, kind, to_address, cc, bcc, subject, body, attachments, confidence,
             ai_decision_id, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as(&query)
        .bind(new.ticket_id)
        .bind(new.kind.as_str())
        .bind(new.to_address)
        .bind(new.cc)
        .bind(new.bcc)
        .bind(new.subject)
        .bind(new.body)
        .bind(new.attachments)
        .bind(new.confidence)
        .bind(new.ai_decision_id)
        .bind(new.status.as_str())
        .fetch_one(executor)
        .await
}

pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<PendingMessage>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM pending_messages WHERE id = $1");
    sqlx::query_as(&query).bind(id).fetch_optional(executor).await
}

pub async fn list_by_status<'e, E>(
    executor: E,
    status: PendingStatus,
) -> Result<Vec<PendingMessage>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM pending_messages WHERE status = $1 ORDER BY created_at ASC");
    sqlx::query_as(&query).bind(status.as_str()).fetch_all(executor).await
}

/// §6 `GET /messages/pending?status=&kind=`. Either filter left `None`
/// matches every value for that column.
pub async fn list<'e, E>(
    executor: E,
    status: Option<PendingStatus>,
    kind: Option<MessageKind>,
) -> Result<Vec<PendingMessage>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!(
        "SELECT {COLUMNS} FROM pending_messages \
         WHERE ($1::text IS NULL OR status = $1) AND ($2::text IS NULL OR kind = $2) \
         ORDER BY created_at ASC"
    );
    sqlx::query_as(&query)
        .bind(status.map(|s| s.as_str()))
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(executor)
        .await
}

pub async fn list_for_ticket<'e, E>(
    executor: E,
    ticket_id: Uuid,
) -> Result<Vec<PendingMessage>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM pending_messages WHERE ticket_id = $1 ORDER BY created_at ASC");
    sqlx::query_as(&query).bind(ticket_id).fetch_all(executor).await
}

pub async fn approve<'e, E>(
    executor: E,
    id: Uuid,
    reviewed_by: &str,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE pending_messages
         SET status = $1, reviewed_at = now(), reviewed_by = $2
         WHERE id = $3",
    )
    .bind(PendingStatus::Approved.as_str())
    .bind(reviewed_by)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn reject<'e, E>(
    executor: E,
    id: Uuid,
    reviewed_by: &str,
    reason: &str,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE pending_messages
         SET status = $1, reviewed_at = now(), reviewed_by = $2, rejection_reason = $3
         WHERE id = $4",
    )
    .bind(PendingStatus::Rejected.as_str())
    .bind(reviewed_by)
    .bind(reason)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn mark_sent<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("UPDATE pending_messages SET status = $1, sent_at = now() WHERE id = $2")
        .bind(PendingStatus::Sent.as_str())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Record a failed send attempt (§4.7 retry path). Leaves the message in
/// `failed` so an operator may retry (-> approved) or reject it.
pub async fn mark_failed<'e, E>(
    executor: E,
    id: Uuid,
    error: &str,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE pending_messages
         SET status = $1, retry_count = retry_count + 1, last_error = $2
         WHERE id = $3",
    )
    .bind(PendingStatus::Failed.as_str())
    .bind(error)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Move a `failed` message back to `approved` so the dispatcher retries it.
pub async fn requeue<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("UPDATE pending_messages SET status = $1 WHERE id = $2")
        .bind(PendingStatus::Approved.as_str())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
