use std::collections::HashMap;

use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use sqlx::Executor;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::Row;
use sqlx::Transaction;

use super::IdempotencyKey;

/// Operator authentication is out of scope (§1 Non-goals), so there is no
/// `user_id` to scope the guard by. `route` stands in for that missing
/// identity dimension, keeping the teacher's two-part composite key shape.
/// Headers are stored as a JSONB object rather than the teacher's
/// `header_pair` composite type, since that composite type's row mapping
/// can only be verified by the `sqlx::query!` macros this crate avoids.
pub enum NextAction {
    StartProcessing(Transaction<'static, Postgres>),
    ReturnSavedResponse(HttpResponse),
}

/// Begin a transaction and insert a partially-filled record. Only one
/// concurrent caller for a given `(route, idempotency_key)` ever proceeds;
/// everyone else is handed back the eventually-saved response.
pub async fn try_save_response(
    route: &str,
    idempotency_key: &IdempotencyKey,
    pool: &PgPool,
) -> Result<NextAction, anyhow::Error> {
    let mut transaction = pool.begin().await?;

    let query = sqlx::query(
        "INSERT INTO idempotency (route, idempotency_key, created_at)
         VALUES ($1, $2, now())
         ON CONFLICT DO NOTHING",
    )
    .bind(route)
    .bind(idempotency_key.as_ref());

    let inserted = transaction.execute(query).await?.rows_affected() > 0;

    let next = if inserted {
        NextAction::StartProcessing(transaction)
    } else {
        let resp = get_saved_response(route, idempotency_key, pool)
            .await?
            .ok_or_else(|| anyhow::anyhow!("could not retrieve saved response"))?;
        NextAction::ReturnSavedResponse(resp)
    };
    Ok(next)
}

/// Update a partially-filled record with the response that was actually
/// produced, then commit — the last action taken on `transaction`.
pub async fn save_response(
    route: &str,
    idempotency_key: &IdempotencyKey,
    http_response: HttpResponse,
    mut transaction: Transaction<'static, Postgres>,
) -> Result<HttpResponse, anyhow::Error> {
    let status_code = http_response.status().as_u16() as i16;

    let headers: HashMap<String, String> = http_response
        .headers()
        .iter()
        .map(|(name, value)| {
            (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).to_string())
        })
        .collect();
    let headers_json = serde_json::to_value(&headers)?;

    let (head, body) = http_response.into_parts();
    let raw_body = to_bytes(body).await.map_err(|e| anyhow::anyhow!("{e}"))?;

    let query = sqlx::query(
        "UPDATE idempotency
         SET response_status_code = $3, response_headers = $4, response_body = $5
         WHERE route = $1 AND idempotency_key = $2",
    )
    .bind(route)
    .bind(idempotency_key.as_ref())
    .bind(status_code)
    .bind(headers_json)
    .bind(raw_body.as_ref());

    transaction.execute(query).await?;
    transaction.commit().await?;

    let http_response = head.set_body(raw_body).map_into_boxed_body();
    Ok(http_response)
}

/// Retrieve a complete record (no nulls) written by a prior `save_response`.
pub async fn get_saved_response(
    route: &str,
    idempotency_key: &IdempotencyKey,
    pool: &PgPool,
) -> Result<Option<HttpResponse>, anyhow::Error> {
    let row = sqlx::query(
        "SELECT response_status_code, response_headers, response_body
         FROM idempotency
         WHERE route = $1 AND idempotency_key = $2
           AND response_status_code IS NOT NULL",
    )
    .bind(route)
    .bind(idempotency_key.as_ref())
    .fetch_optional(pool)
    .await?;

    let row = match row {
        None => return Ok(None),
        Some(row) => row,
    };

    let status_code: i16 = row.try_get("response_status_code")?;
    let headers_json: serde_json::Value = row.try_get("response_headers")?;
    let body: Vec<u8> = row.try_get("response_body")?;

    let mut response = HttpResponse::build(StatusCode::from_u16(status_code as u16)?);
    if let serde_json::Value::Object(map) = headers_json {
        for (name, value) in map {
            if let serde_json::Value::String(value) = value {
                response.append_header((name, value));
            }
        }
    }
    Ok(Some(response.body(body)))
}
