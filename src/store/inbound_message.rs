use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

/// Local copy of one inbound message's content (see migration comment for
/// why this exists beyond the spec's literal data model).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InboundMessage {
    pub id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub source_message_id: String,
    pub thread_id: Option<String>,
    pub from_address: String,
    pub subject: Option<String>,
    pub body_plain: String,
    pub body_html: Option<String>,
    pub received_at: DateTime<Utc>,
    pub role: String,
}

pub async fn insert<'e, E>(
    executor: E,
    ticket_id: Option<Uuid>,
    source_message_id: &str,
    thread_id: Option<&str>,
    from_address: &str,
    subject: Option<&str>,
    body_plain: &str,
    body_html: Option<&str>,
    received_at: DateTime<Utc>,
    role: &str,
) -> Result<InboundMessage, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        "INSERT INTO inbound_messages
            (ticket_id, source_message_id, thread_id, from_address, subject, body_plain,
             body_html, received_at, role)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id, ticket_id, source_message_id, thread_id, from_address, subject,
                   body_plain, body_html, received_at, role",
    )
    .bind(ticket_id)
    .bind(source_message_id)
    .bind(thread_id)
    .bind(from_address)
    .bind(subject)
    .bind(body_plain)
    .bind(body_html)
    .bind(received_at)
    .bind(role)
    .fetch_one(executor)
    .await
}

/// Attach previously-orphaned inbound messages (correlated=false at the
/// time) to a ticket once correlation succeeds on a later message.
pub async fn attach_to_ticket<'e, E>(
    executor: E,
    source_message_id: &str,
    ticket_id: Uuid,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("UPDATE inbound_messages SET ticket_id = $2 WHERE source_message_id = $1")
        .bind(source_message_id)
        .bind(ticket_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn list_for_ticket<'e, E>(
    executor: E,
    ticket_id: Uuid,
) -> Result<Vec<InboundMessage>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, ticket_id, source_message_id, thread_id, from_address, subject, body_plain,
                body_html, received_at, role
         FROM inbound_messages
         WHERE ticket_id = $1
         ORDER BY received_at ASC",
    )
    .bind(ticket_id)
    .fetch_all(executor)
    .await
}
