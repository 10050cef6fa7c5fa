use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

/// One human-readable record of a state change, for operator-facing history
/// (§4.10). Never read back by the core itself beyond listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub actor: String,
    pub ticket_id: Option<Uuid>,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub description: String,
}

const COLUMNS: &str = "id, at, actor, ticket_id, field, old_value, new_value, description";

pub async fn record<'e, E>(
    executor: E,
    actor: &str,
    ticket_id: Option<Uuid>,
    field: &str,
    old_value: Option<&str>,
    new_value: Option<&str>,
    description: &str,
) -> Result<AuditLogEntry, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO audit_log (actor, ticket_id, field, old_value, new_value, description)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as(&query)
        .bind(actor)
        .bind(ticket_id)
        .bind(field)
        .bind(old_value)
        .bind(new_value)
        .bind(description)
        .fetch_one(executor)
        .await
}

pub async fn list_for_ticket<'e, E>(
    executor: E,
    ticket_id: Uuid,
) -> Result<Vec<AuditLogEntry>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM audit_log WHERE ticket_id = $1 ORDER BY at ASC");
    sqlx::query_as(&query).bind(ticket_id).fetch_all(executor).await
}
