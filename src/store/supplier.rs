use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A known drop-ship supplier (§3). `contacts` is a provider-defined JSON
/// blob (e.g. per-category escalation addresses); the core never interprets
/// it beyond passing it to the `MessageFormatter`/`ContextBuilder`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub default_email: String,
    pub contacts: JsonValue,
    pub language: Option<String>,
}

const COLUMNS: &str = "id, name, default_email, contacts, language";

pub async fn get_by_name<'e, E>(executor: E, name: &str) -> Result<Option<Supplier>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM suppliers WHERE name = $1");
    sqlx::query_as(&query).bind(name).fetch_optional(executor).await
}

pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Supplier>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM suppliers WHERE id = $1");
    sqlx::query_as(&query).bind(id).fetch_optional(executor).await
}

pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Supplier>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM suppliers ORDER BY name ASC");
    sqlx::query_as(&query).fetch_all(executor).await
}

pub async fn insert<'e, E>(
    executor: E,
    name: &str,
    default_email: &str,
    contacts: JsonValue,
    language: Option<&str>,
) -> Result<Supplier, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO suppliers (name, default_email, contacts, language)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as(&query)
        .bind(name)
        .bind(default_email)
        .bind(contacts)
        .bind(language)
        .fetch_one(executor)
        .await
}
