// Sweeps due, unanswered SupplierMessages and sends reminders (§4.9).

use std::time::Duration;

use chrono::Duration as ChronoDuration;

use crate::configuration::Settings;
use crate::startup::get_connection_pool;
use crate::startup::AppState;
use crate::supplier_tracker::SupplierTracker;

const SWEEP_BATCH_SIZE: i64 = 20;

async fn sweep_once(app: &AppState) -> Result<usize, anyhow::Error> {
    let mut tx = app.store.begin().await?;
    let reminded = SupplierTracker::sweep(
        &mut tx,
        app.ticket_client.as_ref(),
        ChronoDuration::hours(app.supplier_reminder_hours),
        SWEEP_BATCH_SIZE,
    )
    .await?;
    tx.commit().await?;
    Ok(reminded)
}

async fn sweep_loop(app: AppState, poll_interval_seconds: u64) -> Result<(), anyhow::Error> {
    loop {
        match sweep_once(&app).await {
            Ok(n) if n > 0 => tracing::info!(count = n, "supplier reminder sweep sent reminders"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error.cause_chain = ?e, "supplier reminder sweep failed"),
        }
        tokio::time::sleep(Duration::from_secs(poll_interval_seconds)).await;
    }
}

/// To be run as a separate worker, outside the main API.
pub async fn init_supplier_worker(cfg: Settings) -> Result<(), anyhow::Error> {
    let pool = get_connection_pool(&cfg.database);
    let app = AppState::from_settings(&cfg, pool);
    let poll_interval_seconds = app.poll_interval_seconds;
    sweep_loop(app, poll_interval_seconds).await
}
