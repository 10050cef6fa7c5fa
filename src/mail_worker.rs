// Polls MailSource on `poll_interval_seconds` and feeds every new message
// through the Pipeline, on the same loop-and-sleep shape as
// `idempotency::expiry`.

use std::time::Duration;

use crate::configuration::Settings;
use crate::mail_source::MailSource;
use crate::startup::get_connection_pool;
use crate::startup::AppState;

async fn poll_once(app: &AppState) -> Result<usize, anyhow::Error> {
    let messages = app.mail_source.list_new().await?;
    let pipeline = app.pipeline();
    let count = messages.len();

    for message in messages {
        let source_message_id = message.source_message_id.clone();
        if let Err(e) = pipeline.process_one(message).await {
            tracing::error!(
                error.cause_chain = ?e,
                source_message_id,
                "pipeline failed to process inbound message"
            );
        }
        // `ProcessedEmail` is this system's idempotency gate; once a
        // message has been claimed there, re-delivery is handled by the
        // RetryScheduler, not by seeing it again from MailSource.
        if let Err(e) = app.mail_source.mark_consumed(&source_message_id).await {
            tracing::warn!(
                error.cause_chain = ?e,
                source_message_id,
                "failed to mark inbound message consumed"
            );
        }
    }
    Ok(count)
}

async fn poll_loop(app: AppState, poll_interval_seconds: u64) -> Result<(), anyhow::Error> {
    loop {
        match poll_once(&app).await {
            Ok(n) if n > 0 => tracing::info!(count = n, "mail source poll ingested messages"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error.cause_chain = ?e, "mail source poll failed"),
        }
        tokio::time::sleep(Duration::from_secs(poll_interval_seconds)).await;
    }
}

/// To be run as a separate worker, outside the main API.
pub async fn init_mail_worker(cfg: Settings) -> Result<(), anyhow::Error> {
    let pool = get_connection_pool(&cfg.database);
    let app = AppState::from_settings(&cfg, pool);
    let poll_interval_seconds = app.poll_interval_seconds;
    poll_loop(app, poll_interval_seconds).await
}
