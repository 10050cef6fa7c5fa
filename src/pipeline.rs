use std::collections::HashMap;
use std::collections::HashSet;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use uuid::Uuid;

use crate::context_builder::ContextBuilder;
use crate::context_builder::HistoryMessage;
use crate::context_builder::Role as ContextRole;
use crate::dispatcher::DispatchAction;
use crate::dispatcher::Dispatcher;
use crate::domain::Locale;
use crate::domain::Phase;
use crate::lang_detect;
use crate::llm_client::Draft;
use crate::llm_client::LLMClient;
use crate::mail_source::InboundMessage;
use crate::message_formatter::MessageFormatter;
use crate::retry_scheduler::RetryScheduler;
use crate::store;
use crate::store::ai_decision::NewAiDecision;
use crate::store::ticket_state::NewTicketState;
use crate::store::ticket_state::TicketState;
use crate::store::Store;
use crate::supplier_tracker::SupplierTracker;
use crate::ticket_client::TicketClient;
use crate::ticket_client::TicketClientError;
use crate::ticket_client::TicketHeader;

/// Order-number patterns tried in order, per §4.6 step 2: an Amazon-style
/// triplet first, then a generic drop-ship house format.
static ORDER_NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b\d{3}-\d{7}-\d{7}\b").unwrap(),
        Regex::new(r"(?i)\bORD-[A-Z0-9]{6,12}\b").unwrap(),
    ]
});

static TICKET_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:TICKET|TKT)[-#]?\s*([A-Z0-9]{4,10})\b").unwrap());

static PURCHASE_ORDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPO[-#\s]?(\d{4,10})\b").unwrap());

fn extract_order_number(text: &str) -> Option<String> {
    ORDER_NUMBER_PATTERNS.iter().find_map(|re| re.find(text)).map(|m| m.as_str().to_string())
}

fn extract_ticket_number(text: &str) -> Option<String> {
    TICKET_NUMBER_PATTERN.captures(text).map(|c| c[1].to_string())
}

fn extract_purchase_order_number(text: &str) -> Option<String> {
    PURCHASE_ORDER_PATTERN.captures(text).map(|c| c[1].to_string())
}

/// What happened to one inbound message, for the caller's logging/tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    AlreadyProcessed,
    /// Recorded into history, but no ticket could be correlated or opened.
    NoTicketResolved,
    /// Correlated, analyzed, and dispatched.
    Processed { ticket_id: Uuid, actions: Vec<DispatchAction>, escalated: bool },
    /// A retryable failure occurred after the message was claimed; a
    /// `RetryItem` was enqueued and the caller should not treat this as a
    /// terminal failure.
    RetryScheduled,
}

/// Per-email workflow (§4.6). Holds the collaborators but no mutable state
/// of its own; `Store`'s pool/transactions carry all persistent state.
pub struct Pipeline<'a> {
    pub store: &'a Store,
    pub ticket_client: &'a dyn TicketClient,
    pub llm_client: &'a dyn LLMClient,
    pub formatter: &'a MessageFormatter,
    pub internal_agents: &'a [String],
    pub language_overrides: &'a HashMap<String, Locale>,
    pub phase: Phase,
    pub confidence_threshold: f64,
    pub supplier_reminder_hours: i64,
    pub max_ingest_retries: u32,
}

impl<'a> Pipeline<'a> {
    fn context_builder(&self) -> ContextBuilder<'a> {
        ContextBuilder::new(self.internal_agents, self.language_overrides)
    }

    fn dispatcher(&self) -> Dispatcher<'a> {
        Dispatcher {
            phase: self.phase,
            confidence_threshold: self.confidence_threshold,
            supplier_reminder_hours: self.supplier_reminder_hours,
            formatter: self.formatter,
            ticket_client: self.ticket_client,
        }
    }

    /// Entry point for a freshly-polled inbound message. Claims the
    /// idempotency slot, then hands off to `process_claimed` for
    /// correlation, history recording, and analysis/dispatch.
    pub async fn process_one(&self, message: InboundMessage) -> Result<PipelineOutcome, anyhow::Error> {
        let mut tx = self.store.begin().await?;

        let claimed = store::processed_email::claim(
            &mut *tx,
            &message.source_message_id,
            message.thread_id.as_deref(),
            message.subject.as_deref(),
            &message.from,
            message.received_at,
        )
        .await?;
        if !claimed {
            tx.rollback().await?;
            return Ok(PipelineOutcome::AlreadyProcessed);
        }

        self.process_claimed(tx, message, None).await
    }

    /// Correlates/upserts a ticket, records history, then hands off to
    /// `analyze_and_dispatch`. Shared by `process_one` (fresh claim) and
    /// `retry_resume_correlate` (the claim was already made on a prior
    /// attempt); `retry_item` is `Some` only in the latter case, so a
    /// correlate-stage failure is recorded against the existing item
    /// instead of enqueuing a new one. On a retryable failure in the
    /// post-correlation half, enqueues a `RetryItem` carrying enough to
    /// resume via `retry_resume` without re-claiming `ProcessedEmail`.
    async fn process_claimed(
        &self,
        mut tx: store::Tx<'static>,
        message: InboundMessage,
        retry_item: Option<&store::retry_item::RetryItem>,
    ) -> Result<PipelineOutcome, anyhow::Error> {
        let full_text = format!(
            "{}\n{}",
            message.subject.clone().unwrap_or_default(),
            message.body_plain
        );
        let order_number = extract_order_number(&full_text);
        let ticket_number = extract_ticket_number(&full_text);
        let purchase_order_number = extract_purchase_order_number(&full_text);

        let lock_key = ticket_number
            .clone()
            .or_else(|| order_number.clone())
            .or_else(|| purchase_order_number.clone())
            .unwrap_or_else(|| message.source_message_id.clone());
        Store::lock_ticket(&mut tx, &lock_key).await?;

        let ticket = match self
            .correlate(
                &mut tx,
                ticket_number.as_deref(),
                order_number.as_deref(),
                purchase_order_number.as_deref(),
                &message,
            )
            .await
        {
            Ok(ticket) => ticket,
            Err(CorrelateError::Retryable(reason)) => {
                if let Some(item) = retry_item {
                    let still_retrying =
                        RetryScheduler::record_attempt(&mut *tx, item, &reason, self.max_ingest_retries).await?;
                    if !still_retrying {
                        store::processed_email::finish(
                            &mut *tx,
                            &message.source_message_id,
                            None,
                            false,
                            Some(&reason),
                        )
                        .await?;
                    }
                } else {
                    RetryScheduler::enqueue(
                        &mut *tx,
                        &message.source_message_id,
                        0,
                        &reason,
                        correlate_retry_payload(&message),
                    )
                    .await?;
                }
                tx.commit().await?;
                return Ok(PipelineOutcome::RetryScheduled);
            }
            Err(CorrelateError::Other(e)) => return Err(e),
        };

        let is_from_supplier = ticket
            .as_ref()
            .and_then(|t| t.supplier_email.as_deref())
            .map(|supplier_email| supplier_email.eq_ignore_ascii_case(&message.from))
            .unwrap_or(false);

        store::inbound_message::insert(
            &mut *tx,
            ticket.as_ref().map(|t| t.id),
            &message.source_message_id,
            message.thread_id.as_deref(),
            &message.from,
            message.subject.as_deref(),
            &message.body_plain,
            message.body_html.as_deref(),
            message.received_at,
            if is_from_supplier { "supplier" } else { "customer" },
        )
        .await?;

        let Some(mut ticket) = ticket else {
            store::processed_email::finish(&mut *tx, &message.source_message_id, None, true, None).await?;
            if let Some(item) = retry_item {
                RetryScheduler::succeed(&mut *tx, item.id).await?;
            }
            tx.commit().await?;
            return Ok(PipelineOutcome::NoTicketResolved);
        };

        if is_from_supplier {
            if let Some(supplier_id) =
                SupplierTracker::resolve_supplier_id_by_email(&mut *tx, ticket.supplier_email.as_deref()).await?
            {
                SupplierTracker::mark_response_received(&mut *tx, supplier_id, ticket.id).await?;
            }
        }

        if ticket.language.is_none() {
            let detected = lang_detect::detect_locale(&full_text, &Locale::default());
            store::ticket_state::set_language(&mut *tx, ticket.id, detected.to_string().as_str()).await?;
            ticket.language = Some(detected.to_string());
        }

        if let Some(item) = retry_item {
            RetryScheduler::succeed(&mut *tx, item.id).await?;
        }
        tx.commit().await?;

        match self.analyze_and_dispatch(&ticket).await {
            Ok((actions, escalated)) => {
                let mut tx = self.store.begin().await?;
                store::processed_email::finish(
                    &mut *tx,
                    &message.source_message_id,
                    Some(ticket.id),
                    true,
                    None,
                )
                .await?;
                tx.commit().await?;
                Ok(PipelineOutcome::Processed { ticket_id: ticket.id, actions, escalated })
            }
            Err(AnalysisError::Retryable(reason)) => {
                let mut tx = self.store.begin().await?;
                RetryScheduler::enqueue(
                    &mut *tx,
                    &message.source_message_id,
                    0,
                    &reason,
                    json!({ "ticket_id": ticket.id, "source_message_id": message.source_message_id }),
                )
                .await?;
                tx.commit().await?;
                Ok(PipelineOutcome::RetryScheduled)
            }
            Err(AnalysisError::Permanent(reason)) => {
                let mut tx = self.store.begin().await?;
                store::processed_email::finish(
                    &mut *tx,
                    &message.source_message_id,
                    Some(ticket.id),
                    false,
                    Some(&reason),
                )
                .await?;
                tx.commit().await?;
                Err(anyhow::anyhow!(reason))
            }
        }
    }

    /// Resume a message whose correlate-stage lookup previously failed with
    /// a transient/auth `TicketClientError` (§4.6/§4.10). The original
    /// message content travels in the `RetryItem` payload since no
    /// `InboundMessage` row existed yet to re-read it from.
    async fn retry_resume_correlate(
        &self,
        item: &store::retry_item::RetryItem,
    ) -> Result<PipelineOutcome, anyhow::Error> {
        let message = inbound_message_from_retry_payload(&item.payload)?;
        let tx = self.store.begin().await?;
        self.process_claimed(tx, message, Some(item)).await
    }

    /// Resume a message whose post-correlation half previously failed
    /// transiently (§4.6 ordering note / §4.10). Does not touch
    /// `ProcessedEmail.claim` — that slot is already held.
    pub async fn retry_resume(
        &self,
        item: &store::retry_item::RetryItem,
    ) -> Result<PipelineOutcome, anyhow::Error> {
        if item.payload.get("stage").and_then(|v| v.as_str()) == Some("correlate") {
            return self.retry_resume_correlate(item).await;
        }

        let ticket_id: Uuid = serde_json::from_value(item.payload["ticket_id"].clone())?;
        let mut tx = self.store.begin().await?;
        let ticket = store::ticket_state::get_by_id(&mut *tx, ticket_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("ticket {ticket_id} referenced by retry item no longer exists"))?;
        tx.rollback().await?;

        match self.analyze_and_dispatch(&ticket).await {
            Ok((actions, escalated)) => {
                let mut tx = self.store.begin().await?;
                store::processed_email::finish(
                    &mut *tx,
                    &item.source_message_id,
                    Some(ticket.id),
                    true,
                    None,
                )
                .await?;
                RetryScheduler::succeed(&mut *tx, item.id).await?;
                tx.commit().await?;
                Ok(PipelineOutcome::Processed { ticket_id: ticket.id, actions, escalated })
            }
            Err(AnalysisError::Retryable(reason)) => {
                let mut tx = self.store.begin().await?;
                let still_retrying =
                    RetryScheduler::record_attempt(&mut *tx, item, &reason, self.max_ingest_retries).await?;
                if !still_retrying {
                    store::processed_email::finish(
                        &mut *tx,
                        &item.source_message_id,
                        Some(ticket.id),
                        false,
                        Some(&reason),
                    )
                    .await?;
                }
                tx.commit().await?;
                Ok(PipelineOutcome::RetryScheduled)
            }
            Err(AnalysisError::Permanent(reason)) => {
                let mut tx = self.store.begin().await?;
                store::processed_email::finish(
                    &mut *tx,
                    &item.source_message_id,
                    Some(ticket.id),
                    false,
                    Some(&reason),
                )
                .await?;
                RetryScheduler::succeed(&mut *tx, item.id).await?;
                tx.commit().await?;
                Err(anyhow::anyhow!(reason))
            }
        }
    }

    /// Steps 5-8: build context, call the LLM, persist the decision, and
    /// dispatch — all inside a single transaction so a dispatch failure
    /// still leaves the decision visible.
    async fn analyze_and_dispatch(
        &self,
        ticket: &TicketState,
    ) -> Result<(Vec<DispatchAction>, bool), AnalysisError> {
        let view = self
            .ticket_client
            .get_by_ticket(&ticket.ticket_number)
            .await
            .map_err(classify_ticket_client_error)?;

        let history: Vec<HistoryMessage> = view
            .map(|v| {
                v.history
                    .into_iter()
                    .map(|h| HistoryMessage {
                        message_id: h.sent_at.to_rfc3339(),
                        from_address: h.from_address,
                        role_hint: match h.role.as_str() {
                            "internal" => Some(ContextRole::Internal),
                            "customer" => Some(ContextRole::Customer),
                            "supplier" => Some(ContextRole::Supplier),
                            _ => None,
                        },
                        body: h.body,
                        sent_at: h.sent_at,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let built = self
            .context_builder()
            .build(ticket, &history, &HashSet::new())
            .map_err(|e| AnalysisError::Permanent(e.to_string()))?;

        let mut analysis = self
            .llm_client
            .analyze(&built.system_prompt, &built.user_prompt)
            .await
            .map_err(classify_llm_error)?;

        if built.requests_human_escalation {
            analysis.requires_escalation = true;
            analysis.customer_draft =
                Draft::NoDraft { reason: "Customer requested human contact".to_string() };
        }

        let mut tx = self.store.begin().await.map_err(|e| AnalysisError::Retryable(e.to_string()))?;
        Store::lock_ticket(&mut tx, &ticket.ticket_number)
            .await
            .map_err(|e| AnalysisError::Retryable(e.to_string()))?;

        let decision = store::ai_decision::insert(
            &mut *tx,
            NewAiDecision {
                ticket_id: ticket.id,
                at: Utc::now(),
                detected_language: Some(built.locale.to_string()),
                detected_intent: analysis.intent.clone(),
                confidence: analysis.confidence,
                recommended_action: analysis.summary.clone(),
                generated_customer_draft: analysis.customer_draft.body().map(str::to_string),
                generated_supplier_draft: analysis.supplier_draft.body().map(str::to_string),
                requires_escalation: analysis.requires_escalation,
                phase_at_decision: self.phase,
            },
        )
        .await
        .map_err(|e| AnalysisError::Retryable(e.to_string()))?;

        let (actions, escalated) = self
            .dispatcher()
            .dispatch(
                &mut tx,
                ticket.id,
                &ticket.ticket_number,
                &ticket.ticket_id,
                ticket.customer_email.as_deref(),
                ticket.supplier_email.as_deref(),
                &built.locale,
                decision.id,
                &analysis,
            )
            .await
            .map_err(|e| AnalysisError::Retryable(e.to_string()))?;

        tx.commit().await.map_err(|e| AnalysisError::Retryable(e.to_string()))?;
        Ok((actions, escalated))
    }

    /// §4.6 step 3. Tries local correlation first, then the upstream
    /// ticketing backend in `ticket_number -> order_number ->
    /// purchase_order_number` order, mirroring any upstream match into the
    /// local shadow. If nothing resolves and the inbound message carries
    /// enough to open a case, opens one via `upsert` and re-resolves by
    /// `order_number` (never by the id `upsert` returned) to dodge upstream
    /// indexing delay.
    async fn correlate(
        &self,
        tx: &mut store::Tx<'_>,
        ticket_number: Option<&str>,
        order_number: Option<&str>,
        purchase_order_number: Option<&str>,
        message: &InboundMessage,
    ) -> Result<Option<TicketState>, CorrelateError> {
        if let Some(tn) = ticket_number {
            if let Some(found) = store::ticket_state::get_by_ticket_number(&mut **tx, tn).await? {
                store::ticket_state::touch_last_seen(&mut **tx, found.id).await?;
                return Ok(Some(found));
            }
        }
        if let Some(on) = order_number {
            if let Some(found) = store::ticket_state::get_by_order_number(&mut **tx, on).await? {
                store::ticket_state::touch_last_seen(&mut **tx, found.id).await?;
                return Ok(Some(found));
            }
        }
        if let Some(pon) = purchase_order_number {
            if let Some(found) = store::ticket_state::get_by_purchase_order_number(&mut **tx, pon).await? {
                store::ticket_state::touch_last_seen(&mut **tx, found.id).await?;
                return Ok(Some(found));
            }
        }

        let upstream_view = if let Some(tn) = ticket_number {
            self.ticket_client.get_by_ticket(tn).await.map_err(classify_correlate_ticket_error)?
        } else if let Some(on) = order_number {
            self.ticket_client.get_by_order(on).await.map_err(classify_correlate_ticket_error)?
        } else if let Some(pon) = purchase_order_number {
            self.ticket_client.get_by_purchase_order(pon).await.map_err(classify_correlate_ticket_error)?
        } else {
            None
        };

        if let Some(view) = upstream_view {
            return Ok(Some(self.mirror_into_local(tx, view).await?));
        }

        let have_enough_to_open_a_case =
            order_number.is_some() || purchase_order_number.is_some() || ticket_number.is_some();
        if !have_enough_to_open_a_case {
            return Ok(None);
        }

        let header = TicketHeader {
            ticket_number: ticket_number.map(str::to_string),
            order_number: order_number.map(str::to_string),
            purchase_order_number: purchase_order_number.map(str::to_string),
            customer_email: Some(message.from.clone()),
            subject: message.subject.clone(),
        };
        let upstream_ticket_id =
            self.ticket_client.upsert(header).await.map_err(classify_correlate_ticket_error)?;

        let reresolved = if let Some(on) = order_number {
            self.ticket_client.get_by_order(on).await.map_err(classify_correlate_ticket_error)?
        } else if let Some(pon) = purchase_order_number {
            self.ticket_client.get_by_purchase_order(pon).await.map_err(classify_correlate_ticket_error)?
        } else if let Some(tn) = ticket_number {
            self.ticket_client.get_by_ticket(tn).await.map_err(classify_correlate_ticket_error)?
        } else {
            None
        };

        if let Some(view) = reresolved {
            return Ok(Some(self.mirror_into_local(tx, view).await?));
        }

        // Upstream has not indexed the new ticket yet. Create a local shadow
        // keyed by whatever correlation key we have, so history is not lost
        // while we wait for the next inbound message (or a sweep) to
        // re-resolve it properly.
        let synthetic_ticket_number = order_number
            .or(purchase_order_number)
            .or(ticket_number)
            .map(str::to_string)
            .unwrap_or_else(|| format!("pending-{upstream_ticket_id}"));

        let created = store::ticket_state::insert(
            &mut **tx,
            NewTicketState {
                ticket_number: synthetic_ticket_number,
                ticket_id: upstream_ticket_id,
                status: crate::domain::TicketStatus::New,
                custom_status_id: None,
                customer_email: Some(message.from.clone()),
                language: None,
                order_number: order_number.map(str::to_string),
                purchase_order_number: purchase_order_number.map(str::to_string),
                supplier_email: None,
                gmail_thread_id: message.thread_id.clone(),
            },
        )
        .await?;
        Ok(Some(created))
    }

    async fn mirror_into_local(
        &self,
        tx: &mut store::Tx<'_>,
        view: crate::ticket_client::TicketView,
    ) -> Result<TicketState, anyhow::Error> {
        if let Some(existing) = store::ticket_state::get_by_ticket_number(&mut **tx, &view.ticket_number).await? {
            store::ticket_state::touch_last_seen(&mut **tx, existing.id).await?;
            return Ok(existing);
        }
        let created = store::ticket_state::insert(
            &mut **tx,
            NewTicketState {
                ticket_number: view.ticket_number,
                ticket_id: view.ticket_id,
                status: view.status.parse().unwrap_or(crate::domain::TicketStatus::New),
                custom_status_id: view.custom_status_id,
                customer_email: view.customer_email,
                language: None,
                order_number: view.order_number,
                purchase_order_number: view.purchase_order_number,
                supplier_email: None,
                gmail_thread_id: None,
            },
        )
        .await?;
        Ok(created)
    }
}

enum AnalysisError {
    Retryable(String),
    Permanent(String),
}

fn classify_ticket_client_error(e: TicketClientError) -> AnalysisError {
    match e {
        TicketClientError::Transient(msg) => AnalysisError::Retryable(msg),
        TicketClientError::AuthFailed(msg) => AnalysisError::Retryable(msg),
        TicketClientError::Permanent(msg) => AnalysisError::Permanent(msg),
    }
}

/// Outcome of a failed `correlate` call. `Transient`/`AuthFailed` ticketing
/// backend errors are `Retryable` — a spurious local ticket must not be
/// created in their place — everything else is an unrecoverable `Other`.
enum CorrelateError {
    Retryable(String),
    Other(anyhow::Error),
}

impl From<sqlx::Error> for CorrelateError {
    fn from(e: sqlx::Error) -> Self {
        CorrelateError::Other(e.into())
    }
}

impl From<anyhow::Error> for CorrelateError {
    fn from(e: anyhow::Error) -> Self {
        CorrelateError::Other(e)
    }
}

fn classify_correlate_ticket_error(e: TicketClientError) -> CorrelateError {
    match e {
        TicketClientError::Transient(msg) => CorrelateError::Retryable(msg),
        TicketClientError::AuthFailed(msg) => CorrelateError::Retryable(msg),
        TicketClientError::Permanent(msg) => CorrelateError::Other(anyhow::anyhow!(msg)),
    }
}

/// Payload for a `RetryItem` raised by a correlate-stage failure: no
/// `TicketState` exists yet, so the message content itself travels in the
/// payload rather than a `ticket_id` reference.
fn correlate_retry_payload(message: &InboundMessage) -> serde_json::Value {
    json!({
        "stage": "correlate",
        "source_message_id": message.source_message_id,
        "thread_id": message.thread_id,
        "from": message.from,
        "subject": message.subject,
        "received_at": message.received_at,
        "body_plain": message.body_plain,
        "body_html": message.body_html,
    })
}

fn inbound_message_from_retry_payload(payload: &serde_json::Value) -> Result<InboundMessage, anyhow::Error> {
    Ok(InboundMessage {
        source_message_id: payload["source_message_id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("retry payload missing source_message_id"))?
            .to_string(),
        thread_id: payload["thread_id"].as_str().map(str::to_string),
        from: payload["from"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("retry payload missing from"))?
            .to_string(),
        to: Vec::new(),
        cc: Vec::new(),
        subject: payload["subject"].as_str().map(str::to_string),
        received_at: serde_json::from_value(payload["received_at"].clone())?,
        body_plain: payload["body_plain"].as_str().unwrap_or_default().to_string(),
        body_html: payload["body_html"].as_str().map(str::to_string),
        attachments: Vec::new(),
    })
}

fn classify_llm_error(e: crate::llm_client::LLMError) -> AnalysisError {
    match e {
        crate::llm_client::LLMError::Unavailable(msg) => AnalysisError::Retryable(msg),
        crate::llm_client::LLMError::SchemaViolation(msg) => AnalysisError::Permanent(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_amazon_style_order_number() {
        let text = "Where is my order 123-4567890-1234567 please?";
        assert_eq!(extract_order_number(text).as_deref(), Some("123-4567890-1234567"));
    }

    #[test]
    fn extracts_ticket_number() {
        let text = "Re: TICKET-AB12CD your case";
        assert_eq!(extract_ticket_number(text).as_deref(), Some("AB12CD"));
    }

    #[test]
    fn extracts_purchase_order_number() {
        let text = "Regarding PO-908234 shipment";
        assert_eq!(extract_purchase_order_number(text).as_deref(), Some("908234"));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(extract_order_number("hello there"), None);
    }
}
