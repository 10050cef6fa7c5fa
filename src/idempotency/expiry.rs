// Periodically drops idempotency guard rows older than 24h, on the same
// loop-and-sleep shape as the retry/supplier sweeps.

use std::time::Duration;

use sqlx::PgPool;

use crate::configuration::Settings;
use crate::startup::get_connection_pool;

async fn expire_old_keys(pool: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::query("DELETE FROM idempotency WHERE now() - created_at > interval '24 hours'")
        .execute(pool)
        .await?;
    Ok(())
}

async fn expire_keys_loop(pool: &PgPool) -> Result<(), anyhow::Error> {
    loop {
        match expire_old_keys(pool).await {
            Err(e) => {
                tracing::warn!(error.cause_chain = ?e, "idempotency expiry sweep failed");
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(_) => tokio::time::sleep(Duration::from_secs(600)).await,
        }
    }
}

/// To be run as a separate worker, outside the main API.
pub async fn init_expiry_worker(cfg: Settings) -> Result<(), anyhow::Error> {
    let pool = get_connection_pool(&cfg.database);
    expire_keys_loop(&pool).await
}
