use chrono::Duration;
use chrono::Utc;
use serde_json::Value as JsonValue;

use crate::store;
use crate::store::Tx;

/// Backoff schedule for ingest retries (§4.10): 1m, 5m, 30m, 2h, then the
/// item is abandoned and `ProcessedEmail.success=false` becomes permanent.
const INGEST_BACKOFF_MINUTES: [i64; 4] = [1, 5, 30, 120];

/// Enqueues and sweeps `RetryItem`s for ingest-side transient failures
/// (§4.10). `PendingMessage` send retries are handled by `ApprovalQueue`
/// directly, since they carry their own `retry_count`/`max_retries` state
/// on the row rather than a separate queue table.
pub struct RetryScheduler;

impl RetryScheduler {
    fn backoff_for_attempt(attempt: i32) -> Duration {
        let minutes = INGEST_BACKOFF_MINUTES
            .get(attempt as usize)
            .copied()
            .unwrap_or(*INGEST_BACKOFF_MINUTES.last().unwrap());
        Duration::minutes(minutes)
    }

    pub async fn enqueue<'e, E>(
        executor: E,
        source_message_id: &str,
        attempt: i32,
        last_error: &str,
        payload: JsonValue,
    ) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let next_attempt_at = Utc::now() + Self::backoff_for_attempt(attempt);
        store::retry_item::enqueue(executor, source_message_id, next_attempt_at, Some(last_error), payload)
            .await?;
        Ok(())
    }

    /// Returns due retry items so the caller can re-run ingestion for each;
    /// the caller is responsible for calling `record_attempt`/`give_up`
    /// based on the outcome (kept here rather than folded into `sweep` so
    /// re-ingestion can reuse the same `Pipeline::process_one` path as a
    /// fresh `MailSource` poll would).
    pub async fn fetch_due(
        tx: &mut Tx<'_>,
        batch_size: i64,
    ) -> Result<Vec<store::retry_item::RetryItem>, sqlx::Error> {
        store::retry_item::fetch_due_for_sweep(tx, Utc::now(), batch_size).await
    }

    pub async fn record_attempt<'e, E>(
        executor: E,
        item: &store::retry_item::RetryItem,
        error: &str,
        max_ingest_retries: u32,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let next_attempt = item.attempts + 1;
        if next_attempt as u32 >= max_ingest_retries {
            store::retry_item::delete(executor, item.id).await?;
            return Ok(false);
        }
        let next_attempt_at = Utc::now() + Self::backoff_for_attempt(next_attempt);
        store::retry_item::record_attempt(executor, item.id, next_attempt_at, error).await?;
        Ok(true)
    }

    pub async fn succeed<'e, E>(executor: E, item_id: uuid::Uuid) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        store::retry_item::delete(executor, item_id).await
    }
}

