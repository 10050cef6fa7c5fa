mod ai_decisions;
mod health_check;
mod pending_messages;
mod tickets;

use actix_web::HttpRequest;

use crate::idempotency::IdempotencyKey;

pub use ai_decisions::submit_feedback;
pub use health_check::health_check;
pub use pending_messages::approve_pending_message;
pub use pending_messages::get_pending_message;
pub use pending_messages::list_pending_messages;
pub use pending_messages::reject_pending_message;
pub use pending_messages::retry_pending_message;
pub use tickets::analyze_ticket;

/// Every mutating endpoint requires an `Idempotency-Key` header (§6). The
/// teacher's admin forms carried this as a hidden field; there is no HTML
/// form here, so it travels as a header instead.
pub(super) fn extract_idempotency_key(req: &HttpRequest) -> Result<IdempotencyKey, actix_web::Error> {
    let raw = req
        .headers()
        .get("Idempotency-Key")
        .ok_or_else(|| actix_web::error::ErrorBadRequest("missing Idempotency-Key header"))?
        .to_str()
        .map_err(actix_web::error::ErrorBadRequest)?
        .to_string();
    IdempotencyKey::try_from(raw).map_err(actix_web::error::ErrorBadRequest)
}

/// No operator identity is in scope (§1 Non-goals), so every handler
/// attributes its actions to this fixed actor for the audit log.
pub(super) const OPERATOR: &str = "operator";

/// Same history-shaping logic `Pipeline::analyze_and_dispatch` uses,
/// shared by the routes that need to rebuild a `ContextBuilder` preview.
pub(super) async fn fetch_history(
    ticket_client: &dyn crate::ticket_client::TicketClient,
    ticket_number: &str,
) -> Vec<crate::context_builder::HistoryMessage> {
    let view = ticket_client.get_by_ticket(ticket_number).await.ok().flatten();
    view.map(|v| {
        v.history
            .into_iter()
            .map(|h| crate::context_builder::HistoryMessage {
                message_id: h.sent_at.to_rfc3339(),
                from_address: h.from_address,
                role_hint: match h.role.as_str() {
                    "internal" => Some(crate::context_builder::Role::Internal),
                    "customer" => Some(crate::context_builder::Role::Customer),
                    "supplier" => Some(crate::context_builder::Role::Supplier),
                    _ => None,
                },
                body: h.body,
                sent_at: h.sent_at,
            })
            .collect()
    })
    .unwrap_or_default()
}
