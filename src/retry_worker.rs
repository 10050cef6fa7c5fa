// Sweeps due RetryItems and resumes each via Pipeline::retry_resume (§4.10).

use std::time::Duration;

use crate::configuration::Settings;
use crate::retry_scheduler::RetryScheduler;
use crate::startup::get_connection_pool;
use crate::startup::AppState;

const SWEEP_BATCH_SIZE: i64 = 20;

async fn sweep_once(app: &AppState) -> Result<usize, anyhow::Error> {
    let mut tx = app.store.begin().await?;
    let due = RetryScheduler::fetch_due(&mut tx, SWEEP_BATCH_SIZE).await?;
    tx.commit().await?;

    let pipeline = app.pipeline();
    for item in &due {
        if let Err(e) = pipeline.retry_resume(item).await {
            tracing::warn!(error.cause_chain = ?e, retry_item_id = %item.id, "retry resume failed");
        }
    }
    Ok(due.len())
}

async fn sweep_loop(app: AppState, poll_interval_seconds: u64) -> Result<(), anyhow::Error> {
    loop {
        match sweep_once(&app).await {
            Ok(n) if n > 0 => tracing::info!(count = n, "retry sweep resumed items"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error.cause_chain = ?e, "retry sweep failed"),
        }
        tokio::time::sleep(Duration::from_secs(poll_interval_seconds)).await;
    }
}

/// To be run as a separate worker, outside the main API.
pub async fn init_retry_worker(cfg: Settings) -> Result<(), anyhow::Error> {
    let pool = get_connection_pool(&cfg.database);
    let app = AppState::from_settings(&cfg, pool);
    let poll_interval_seconds = app.poll_interval_seconds;
    sweep_loop(app, poll_interval_seconds).await
}
