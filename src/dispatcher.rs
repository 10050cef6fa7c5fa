use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::domain::MessageKind;
use crate::domain::Phase;
use crate::domain::PendingStatus;
use crate::domain::TicketStatus;
use crate::llm_client::AnalysisResult;
use crate::llm_client::Draft;
use crate::message_formatter::MessageFormatter;
use crate::store;
use crate::store::pending_message::NewPendingMessage;
use crate::store::Tx;
use crate::supplier_tracker::SupplierTracker;
use crate::ticket_client::TicketClient;

/// What `Dispatcher::dispatch` actually did with one draft, for the
/// Pipeline's logging/tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    NoDraft,
    Queued { pending_message_id: Uuid },
    SentImmediately { pending_message_id: Uuid },
    SendFailed { pending_message_id: Uuid },
}

/// Phase-gated execution of the drafts an `AnalysisResult` produced (§4.7).
/// Holds no state of its own; every call takes the collaborators it needs.
pub struct Dispatcher<'a> {
    pub phase: Phase,
    pub confidence_threshold: f64,
    pub supplier_reminder_hours: i64,
    pub formatter: &'a MessageFormatter,
    pub ticket_client: &'a dyn TicketClient,
}

impl<'a> Dispatcher<'a> {
    /// Runs inside the Pipeline's post-analysis transaction (§4.6): the
    /// decision has already been persisted by the caller, so any failure
    /// here still leaves that decision visible.
    pub async fn dispatch(
        &self,
        tx: &mut Tx<'_>,
        ticket_id: Uuid,
        ticket_number: &str,
        upstream_ticket_id: &str,
        customer_email: Option<&str>,
        supplier_email: Option<&str>,
        locale: &crate::domain::Locale,
        ai_decision_id: Uuid,
        analysis: &AnalysisResult,
    ) -> Result<(Vec<DispatchAction>, bool), anyhow::Error> {
        let mut actions = Vec::new();
        let mut escalated = false;

        let below_threshold = analysis.confidence < self.confidence_threshold;
        let requires_escalation = analysis.requires_escalation || below_threshold;

        match self.phase {
            Phase::Shadow => {
                if let Draft::Drafted { body } = &analysis.customer_draft {
                    let action = self
                        .queue_customer_draft(tx, ticket_id, customer_email, locale, body, analysis, ai_decision_id)
                        .await?;
                    actions.push(action);
                }
                if let Draft::Drafted { body } = &analysis.supplier_draft {
                    let action = self
                        .queue_supplier_draft(tx, ticket_id, supplier_email, body, analysis, ai_decision_id)
                        .await?;
                    actions.push(action);
                }
                let note = format!(
                    "AI recommendation: {} (confidence {:.2}). SHADOW mode — no external send.",
                    analysis.intent, analysis.confidence
                );
                let _ = self.ticket_client.send_internal(upstream_ticket_id, &note).await;
            }
            Phase::Assisted => {
                if let Draft::Drafted { body } = &analysis.customer_draft {
                    let action = self
                        .queue_customer_draft(tx, ticket_id, customer_email, locale, body, analysis, ai_decision_id)
                        .await?;
                    actions.push(action);
                }
                if let Draft::Drafted { body } = &analysis.supplier_draft {
                    let action = self
                        .queue_supplier_draft(tx, ticket_id, supplier_email, body, analysis, ai_decision_id)
                        .await?;
                    actions.push(action);
                }
                if requires_escalation {
                    escalated = true;
                    let reason = if below_threshold {
                        format!("confidence {:.2} below threshold", analysis.confidence)
                    } else {
                        "LLM flagged requires_escalation".to_string()
                    };
                    store::ticket_state::escalate(&mut **tx, ticket_id, &reason).await?;
                    let _ = self
                        .ticket_client
                        .send_internal(upstream_ticket_id, &format!("Escalated: {reason}"))
                        .await;
                }
            }
            Phase::Autonomous => {
                if requires_escalation {
                    // Falls back to ASSISTED behaviour for this message (§7).
                    if let Draft::Drafted { body } = &analysis.customer_draft {
                        let action = self
                            .queue_customer_draft(tx, ticket_id, customer_email, locale, body, analysis, ai_decision_id)
                            .await?;
                        actions.push(action);
                    }
                    if let Draft::Drafted { body } = &analysis.supplier_draft {
                        let action = self
                            .queue_supplier_draft(tx, ticket_id, supplier_email, body, analysis, ai_decision_id)
                            .await?;
                        actions.push(action);
                    }
                    escalated = true;
                    let reason = if below_threshold {
                        format!("confidence {:.2} below threshold", analysis.confidence)
                    } else {
                        "LLM flagged requires_escalation".to_string()
                    };
                    store::ticket_state::escalate(&mut **tx, ticket_id, &reason).await?;
                    let _ = self
                        .ticket_client
                        .send_internal(upstream_ticket_id, &format!("Escalated: {reason}"))
                        .await;
                } else {
                    if let Draft::Drafted { body } = &analysis.customer_draft {
                        let action = self
                            .send_or_queue_customer(
                                tx, ticket_id, upstream_ticket_id, customer_email, locale, body, analysis,
                                ai_decision_id,
                            )
                            .await?;
                        actions.push(action);
                    }
                    if let Draft::Drafted { body } = &analysis.supplier_draft {
                        let action = self
                            .send_or_queue_supplier(
                                tx, ticket_id, upstream_ticket_id, supplier_email, body, analysis, ai_decision_id,
                            )
                            .await?;
                        actions.push(action);
                    }
                }
            }
        }

        if actions.is_empty() {
            actions.push(DispatchAction::NoDraft);
        }

        if !escalated {
            let has_customer_draft = matches!(analysis.customer_draft, Draft::Drafted { .. });
            let has_supplier_draft = matches!(analysis.supplier_draft, Draft::Drafted { .. });
            let new_status = if has_supplier_draft {
                Some(TicketStatus::AwaitingSupplier)
            } else if has_customer_draft {
                Some(TicketStatus::AwaitingCustomer)
            } else {
                None
            };
            if let Some(status) = new_status {
                store::ticket_state::set_status(&mut **tx, ticket_id, status).await?;
            }
        }

        Ok((actions, escalated))
    }

    async fn queue_customer_draft(
        &self,
        tx: &mut Tx<'_>,
        ticket_id: Uuid,
        customer_email: Option<&str>,
        locale: &crate::domain::Locale,
        body: &str,
        analysis: &AnalysisResult,
        ai_decision_id: Uuid,
    ) -> Result<DispatchAction, anyhow::Error> {
        let to = customer_email.unwrap_or_default().to_string();
        let composed = self.formatter.compose_customer_body(locale, "Customer", body);
        let pending = store::pending_message::insert(
            &mut **tx,
            NewPendingMessage {
                ticket_id,
                kind: MessageKind::Customer,
                to_address: to,
                cc: vec![],
                bcc: vec![],
                subject: "Re: your support request".to_string(),
                body: composed,
                attachments: json!([]),
                confidence: Some(analysis.confidence),
                ai_decision_id: Some(ai_decision_id),
                status: PendingStatus::Pending,
            },
        )
        .await?;
        Ok(DispatchAction::Queued { pending_message_id: pending.id })
    }

    async fn queue_supplier_draft(
        &self,
        tx: &mut Tx<'_>,
        ticket_id: Uuid,
        supplier_email: Option<&str>,
        body: &str,
        analysis: &AnalysisResult,
        ai_decision_id: Uuid,
    ) -> Result<DispatchAction, anyhow::Error> {
        let to = supplier_email.unwrap_or_default().to_string();
        let pending = store::pending_message::insert(
            &mut **tx,
            NewPendingMessage {
                ticket_id,
                kind: MessageKind::Supplier,
                to_address: to,
                cc: vec![],
                bcc: vec![],
                subject: "Supplier follow-up".to_string(),
                body: body.to_string(),
                attachments: json!([]),
                confidence: Some(analysis.confidence),
                ai_decision_id: Some(ai_decision_id),
                status: PendingStatus::Pending,
            },
        )
        .await?;
        Ok(DispatchAction::Queued { pending_message_id: pending.id })
    }

    async fn send_or_queue_customer(
        &self,
        tx: &mut Tx<'_>,
        ticket_id: Uuid,
        upstream_ticket_id: &str,
        customer_email: Option<&str>,
        locale: &crate::domain::Locale,
        body: &str,
        analysis: &AnalysisResult,
        ai_decision_id: Uuid,
    ) -> Result<DispatchAction, anyhow::Error> {
        let to = customer_email.unwrap_or_default().to_string();
        let composed = self.formatter.compose_customer_body(locale, "Customer", body);
        let subject = "Re: your support request".to_string();

        match self
            .ticket_client
            .send_customer(upstream_ticket_id, &subject, &composed, &[], &[], &[])
            .await
        {
            Ok(_message_id) => {
                let pending = store::pending_message::insert(
                    &mut **tx,
                    NewPendingMessage {
                        ticket_id,
                        kind: MessageKind::Customer,
                        to_address: to,
                        cc: vec![],
                        bcc: vec![],
                        subject,
                        body: composed,
                        attachments: json!([]),
                        confidence: Some(analysis.confidence),
                        ai_decision_id: Some(ai_decision_id),
                        status: PendingStatus::Sent,
                    },
                )
                .await?;
                store::pending_message::mark_sent(&mut **tx, pending.id).await?;
                Ok(DispatchAction::SentImmediately { pending_message_id: pending.id })
            }
            Err(e) => {
                let pending = store::pending_message::insert(
                    &mut **tx,
                    NewPendingMessage {
                        ticket_id,
                        kind: MessageKind::Customer,
                        to_address: to,
                        cc: vec![],
                        bcc: vec![],
                        subject,
                        body: composed,
                        attachments: json!([]),
                        confidence: Some(analysis.confidence),
                        ai_decision_id: Some(ai_decision_id),
                        status: PendingStatus::Pending,
                    },
                )
                .await?;
                store::pending_message::mark_failed(&mut **tx, pending.id, &e.to_string()).await?;
                Ok(DispatchAction::SendFailed { pending_message_id: pending.id })
            }
        }
    }

    async fn send_or_queue_supplier(
        &self,
        tx: &mut Tx<'_>,
        ticket_id: Uuid,
        upstream_ticket_id: &str,
        supplier_email: Option<&str>,
        body: &str,
        analysis: &AnalysisResult,
        ai_decision_id: Uuid,
    ) -> Result<DispatchAction, anyhow::Error> {
        let to = supplier_email.unwrap_or_default().to_string();
        let subject = "Supplier follow-up".to_string();

        match self
            .ticket_client
            .send_supplier(upstream_ticket_id, &to, &subject, body, &[], &[], &[])
            .await
        {
            Ok(_message_id) => {
                let pending = store::pending_message::insert(
                    &mut **tx,
                    NewPendingMessage {
                        ticket_id,
                        kind: MessageKind::Supplier,
                        to_address: to,
                        cc: vec![],
                        bcc: vec![],
                        subject,
                        body: body.to_string(),
                        attachments: json!([]),
                        confidence: Some(analysis.confidence),
                        ai_decision_id: Some(ai_decision_id),
                        status: PendingStatus::Sent,
                    },
                )
                .await?;
                store::pending_message::mark_sent(&mut **tx, pending.id).await?;
                if let Some(supplier_id) =
                    SupplierTracker::resolve_supplier_id_by_email(&mut **tx, supplier_email).await?
                {
                    SupplierTracker::record_sent(
                        &mut **tx,
                        supplier_id,
                        ticket_id,
                        Utc::now(),
                        chrono::Duration::hours(self.supplier_reminder_hours),
                    )
                    .await?;
                }
                Ok(DispatchAction::SentImmediately { pending_message_id: pending.id })
            }
            Err(e) => {
                let pending = store::pending_message::insert(
                    &mut **tx,
                    NewPendingMessage {
                        ticket_id,
                        kind: MessageKind::Supplier,
                        to_address: to,
                        cc: vec![],
                        bcc: vec![],
                        subject,
                        body: body.to_string(),
                        attachments: json!([]),
                        confidence: Some(analysis.confidence),
                        ai_decision_id: Some(ai_decision_id),
                        status: PendingStatus::Pending,
                    },
                )
                .await?;
                store::pending_message::mark_failed(&mut **tx, pending.id, &e.to_string()).await?;
                Ok(DispatchAction::SendFailed { pending_message_id: pending.id })
            }
        }
    }
}
