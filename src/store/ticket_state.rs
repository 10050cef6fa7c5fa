use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::TicketStatus;

/// Local shadow of an upstream ticket (§3). Created on first correlation or
/// import; never deleted by the core.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketState {
    pub id: Uuid,
    pub ticket_number: String,
    pub ticket_id: String,
    pub status: String,
    pub custom_status_id: Option<String>,
    pub customer_email: Option<String>,
    pub language: Option<String>,
    pub order_number: Option<String>,
    pub purchase_order_number: Option<String>,
    pub supplier_email: Option<String>,
    pub supplier_ticket_references: Vec<String>,
    pub escalated: bool,
    pub escalation_reason: Option<String>,
    pub escalation_at: Option<DateTime<Utc>>,
    pub last_seen_at: DateTime<Utc>,
    pub gmail_thread_id: Option<String>,
}

impl TicketState {
    pub fn status(&self) -> TicketStatus {
        self.status
            .parse()
            .expect("status column always holds a valid TicketStatus")
    }
}

/// Fields supplied when a ticket is first seen, either via correlation
/// against an upstream lookup or via a freshly-created upsert.
pub struct NewTicketState {
    pub ticket_number: String,
    pub ticket_id: String,
    pub status: TicketStatus,
    pub custom_status_id: Option<String>,
    pub customer_email: Option<String>,
    pub language: Option<String>,
    pub order_number: Option<String>,
    pub purchase_order_number: Option<String>,
    pub supplier_email: Option<String>,
    pub gmail_thread_id: Option<String>,
}

const COLUMNS: &str = "id, ticket_number, ticket_id, status, custom_status_id, customer_email, \
                        language, order_number, purchase_order_number, supplier_email, \
                        supplier_ticket_references, escalated, escalation_reason, escalation_at, \
                        last_seen_at, gmail_thread_id";

pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<TicketState>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM ticket_state WHERE id = $1");
    sqlx::query_as(&query).bind(id).fetch_optional(executor).await
}

pub async fn get_by_ticket_number<'e, E>(
    executor: E,
    ticket_number: &str,
) -> Result<Option<TicketState>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM ticket_state WHERE ticket_number = $1");
    sqlx::query_as(&query)
        .bind(ticket_number)
        .fetch_optional(executor)
        .await
}

pub async fn get_by_order_number<'e, E>(
    executor: E,
    order_number: &str,
) -> Result<Option<TicketState>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM ticket_state WHERE order_number = $1");
    sqlx::query_as(&query)
        .bind(order_number)
        .fetch_optional(executor)
        .await
}

pub async fn get_by_purchase_order_number<'e, E>(
    executor: E,
    purchase_order_number: &str,
) -> Result<Option<TicketState>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM ticket_state WHERE purchase_order_number = $1");
    sqlx::query_as(&query)
        .bind(purchase_order_number)
        .fetch_optional(executor)
        .await
}

/// Create a new `TicketState` row. Callers are expected to have already
/// checked for an existing row via `get_by_*` — this is the "upsert" half of
/// Pipeline step 3, not a general update.
pub async fn insert<'e, E>(
    executor: E,
    new: NewTicketState,
) -> Result<TicketState, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO ticket_state
            (ticket_number, ticket_id, status, custom_status_id, customer_email, language,
             order_number, purchase_order_number, supplier_email)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as(&query)
        .bind(new.ticket_number)
        .bind(new.ticket_id)
        .bind(new.status.as_str())
        .bind(new.custom_status_id)
        .bind(new.customer_email)
        .bind(new.language)
        .bind(new.order_number)
        .bind(new.purchase_order_number)
        .bind(new.supplier_email)
        .fetch_one(executor)
        .await
}

pub async fn touch_last_seen<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("UPDATE ticket_state SET last_seen_at = now() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_status<'e, E>(
    executor: E,
    id: Uuid,
    status: TicketStatus,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("UPDATE ticket_state SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_language<'e, E>(
    executor: E,
    id: Uuid,
    language: &str,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("UPDATE ticket_state SET language = $1 WHERE id = $2")
        .bind(language)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Mark a ticket escalated. Idempotent: re-escalating with a new reason just
/// overwrites the reason/timestamp, it does not append a second audit trail
/// entry here — callers (`Dispatcher`) are responsible for the audit log.
pub async fn escalate<'e, E>(
    executor: E,
    id: Uuid,
    reason: &str,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE ticket_state
         SET escalated = TRUE, escalation_reason = $1, escalation_at = now()
         WHERE id = $2",
    )
    .bind(reason)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn add_supplier_ticket_reference<'e, E>(
    executor: E,
    id: Uuid,
    reference: &str,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "UPDATE ticket_state
         SET supplier_ticket_references = array_append(supplier_ticket_references, $1)
         WHERE id = $2 AND NOT ($1 = ANY(supplier_ticket_references))",
    )
    .bind(reference)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}
