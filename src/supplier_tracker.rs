use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::store;
use crate::store::Tx;
use crate::ticket_client::TicketClient;

/// Tracks outbound supplier communications and raises reminders when a
/// supplier fails to respond within the configured window (§4.9).
pub struct SupplierTracker;

impl SupplierTracker {
    pub async fn resolve_supplier_id_by_email<'e, E>(
        executor: E,
        supplier_email: Option<&str>,
    ) -> Result<Option<Uuid>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let Some(email) = supplier_email else { return Ok(None) };
        let suppliers = store::supplier::list_all(executor).await?;
        Ok(suppliers.into_iter().find(|s| s.default_email == email).map(|s| s.id))
    }

    pub async fn record_sent<'e, E>(
        executor: E,
        supplier_id: Uuid,
        ticket_id: Uuid,
        sent_at: DateTime<Utc>,
        reminder_after: Duration,
    ) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        store::supplier_message::record_sent(executor, supplier_id, ticket_id, sent_at, reminder_after)
            .await?;
        Ok(())
    }

    pub async fn mark_response_received<'e, E>(
        executor: E,
        supplier_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        store::supplier_message::mark_response_received(executor, supplier_id, ticket_id).await
    }

    /// One sweep: lock due, unanswered `SupplierMessage` rows, send exactly
    /// one reminder per row, post an internal alert, and push the window
    /// out so the row does not fire again immediately (§8 scenario 3).
    pub async fn sweep(
        tx: &mut Tx<'_>,
        ticket_client: &dyn TicketClient,
        reminder_after: Duration,
        batch_size: i64,
    ) -> Result<usize, anyhow::Error> {
        let now = Utc::now();
        let due = store::supplier_message::fetch_due_for_sweep(tx, now, batch_size).await?;
        let mut reminded = 0;

        for message in due {
            let ticket = store::ticket_state::get_by_id(&mut **tx, message.ticket_id).await?;
            let Some(ticket) = ticket else { continue };
            let supplier = store::supplier::get_by_id(&mut **tx, message.supplier_id).await?;
            let Some(supplier) = supplier else { continue };

            let reminder_body = format!(
                "Reminder: awaiting your response on ticket {} since {}.",
                ticket.ticket_number,
                message.sent_at.to_rfc3339()
            );
            let send_result = ticket_client
                .send_supplier(&ticket.ticket_id, &supplier.default_email, "Reminder", &reminder_body, &[], &[], &[])
                .await;

            if send_result.is_ok() {
                let _ = ticket_client
                    .send_internal(
                        &ticket.ticket_id,
                        &format!("Reminder sent to supplier {} for unanswered message.", supplier.name),
                    )
                    .await;
                store::supplier_message::mark_reminder_sent(&mut **tx, message.id, now, reminder_after)
                    .await?;
                reminded += 1;
            }
        }

        Ok(reminded)
    }
}
