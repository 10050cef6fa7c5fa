use thiserror::Error;
use uuid::Uuid;

use crate::domain::PendingStatus;
use crate::store;
use crate::store::Tx;
use crate::ticket_client::TicketClient;

/// Optional edits an operator may apply while approving a draft (§6
/// `POST /messages/pending/{id}/approve`).
#[derive(Debug, Default)]
pub struct Edits {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub to: Option<String>,
    pub cc: Option<Vec<String>>,
    pub bcc: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("pending message {0} not found")]
    NotFound(Uuid),
    #[error("pending message {0} is not in the expected state for this transition")]
    NotPending(Uuid),
    #[error("message body cannot be empty")]
    EmptyBody,
    #[error("pending message {0} has exhausted its retry budget")]
    RetriesExhausted(Uuid),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// The `PendingMessage` state machine (§4.8): `pending -> approved -> sent`,
/// `pending -> rejected`, `approved -> failed -> approved`, `failed ->
/// rejected`. Reachable both as library calls and via the operator HTTP
/// surface.
pub struct ApprovalQueue<'a> {
    pub ticket_client: &'a dyn TicketClient,
    pub max_send_retries: u32,
}

impl<'a> ApprovalQueue<'a> {
    /// Validate, apply edits, mark `approved`, then attempt to send. On
    /// success the row moves to `sent`; on failure to `failed` with
    /// `last_error` and an incremented `retry_count`.
    pub async fn approve(
        &self,
        tx: &mut Tx<'_>,
        id: Uuid,
        reviewed_by: &str,
        edits: Edits,
    ) -> Result<PendingStatus, ApprovalError> {
        let message =
            store::pending_message::get_by_id(&mut **tx, id).await?.ok_or(ApprovalError::NotFound(id))?;
        if message.status() != PendingStatus::Pending {
            return Err(ApprovalError::NotPending(id));
        }

        let body = edits.body.unwrap_or_else(|| message.body.clone());
        if body.trim().is_empty() {
            return Err(ApprovalError::EmptyBody);
        }
        let subject = edits.subject.unwrap_or_else(|| message.subject.clone());
        let to = edits.to.unwrap_or_else(|| message.to_address.clone());
        let cc = edits.cc.unwrap_or_else(|| message.cc.clone());
        let bcc = edits.bcc.unwrap_or_else(|| message.bcc.clone());

        store::pending_message::approve(&mut **tx, id, reviewed_by).await?;
        store::audit_log::record(
            &mut **tx,
            reviewed_by,
            Some(message.ticket_id),
            "pending_message.status",
            Some(PendingStatus::Pending.as_str()),
            Some(PendingStatus::Approved.as_str()),
            "operator approved pending message",
        )
        .await?;

        self.send_and_finalize(tx, id, message.ticket_id, message.kind(), &to, &subject, &body, &cc, &bcc)
            .await
    }

    /// Attempt the actual send against the upstream ticketing backend and
    /// transition `approved -> sent` or `approved -> failed`. Shared by
    /// `approve` and `retry`, since both move a message out of `approved`
    /// the same way.
    async fn send_and_finalize(
        &self,
        tx: &mut Tx<'_>,
        id: Uuid,
        ticket_id: Uuid,
        kind: crate::domain::MessageKind,
        to: &str,
        subject: &str,
        body: &str,
        cc: &[String],
        bcc: &[String],
    ) -> Result<PendingStatus, ApprovalError> {
        let ticket =
            store::ticket_state::get_by_id(&mut **tx, ticket_id).await?.ok_or(ApprovalError::NotFound(id))?;

        let send_result = match kind {
            crate::domain::MessageKind::Customer => {
                self.ticket_client.send_customer(&ticket.ticket_id, subject, body, &[], cc, bcc).await
            }
            crate::domain::MessageKind::Supplier => {
                self.ticket_client.send_supplier(&ticket.ticket_id, to, subject, body, &[], cc, bcc).await
            }
            crate::domain::MessageKind::Internal => {
                self.ticket_client.send_internal(&ticket.ticket_id, body).await
            }
        };

        match send_result {
            Ok(_) => {
                store::pending_message::mark_sent(&mut **tx, id).await?;
                Ok(PendingStatus::Sent)
            }
            Err(e) => {
                store::pending_message::mark_failed(&mut **tx, id, &e.to_string()).await?;
                Ok(PendingStatus::Failed)
            }
        }
    }

    pub async fn reject(
        &self,
        tx: &mut Tx<'_>,
        id: Uuid,
        reviewed_by: &str,
        reason: &str,
    ) -> Result<(), ApprovalError> {
        let message =
            store::pending_message::get_by_id(&mut **tx, id).await?.ok_or(ApprovalError::NotFound(id))?;
        if message.status().is_terminal() {
            return Err(ApprovalError::NotPending(id));
        }
        store::pending_message::reject(&mut **tx, id, reviewed_by, reason).await?;
        store::audit_log::record(
            &mut **tx,
            reviewed_by,
            Some(message.ticket_id),
            "pending_message.status",
            Some(message.status.as_str()),
            Some(PendingStatus::Rejected.as_str()),
            &format!("operator rejected pending message: {reason}"),
        )
        .await?;
        Ok(())
    }

    /// Valid only from `failed`, bounded by `max_send_retries`. Requeues to
    /// `approved` and immediately retries the send, same as `approve` does.
    pub async fn retry(
        &self,
        tx: &mut Tx<'_>,
        id: Uuid,
        actor: &str,
    ) -> Result<PendingStatus, ApprovalError> {
        let message =
            store::pending_message::get_by_id(&mut **tx, id).await?.ok_or(ApprovalError::NotFound(id))?;
        if message.status() != PendingStatus::Failed {
            return Err(ApprovalError::NotPending(id));
        }
        if message.retry_count as u32 >= self.max_send_retries {
            return Err(ApprovalError::RetriesExhausted(id));
        }
        store::pending_message::requeue(&mut **tx, id).await?;
        store::audit_log::record(
            &mut **tx,
            actor,
            Some(message.ticket_id),
            "pending_message.status",
            Some(PendingStatus::Failed.as_str()),
            Some(PendingStatus::Approved.as_str()),
            "operator requeued a failed pending message",
        )
        .await?;

        self.send_and_finalize(
            tx,
            id,
            message.ticket_id,
            message.kind(),
            &message.to_address,
            &message.subject,
            &message.body,
            &message.cc,
            &message.bcc,
        )
        .await
    }
}
