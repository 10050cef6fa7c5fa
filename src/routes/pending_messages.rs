use std::collections::HashSet;

use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::approval_queue::ApprovalError;
use crate::approval_queue::ApprovalQueue;
use crate::approval_queue::Edits;
use crate::context_builder::ContextBuilder;
use crate::domain::MessageKind;
use crate::domain::PendingStatus;
use crate::idempotency::save_response;
use crate::idempotency::try_save_response;
use crate::idempotency::NextAction;
use crate::routes::extract_idempotency_key;
use crate::routes::fetch_history;
use crate::routes::OPERATOR;
use crate::startup::AppState;
use crate::store;
use crate::store::pending_message::PendingMessage;
use crate::utils::error_400;
use crate::utils::error_404;
use crate::utils::error_409;
use crate::utils::error_500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PendingMessageView {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub kind: String,
    pub to_address: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub confidence: Option<f64>,
    pub status: String,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl From<PendingMessage> for PendingMessageView {
    fn from(m: PendingMessage) -> Self {
        Self {
            id: m.id,
            ticket_id: m.ticket_id,
            kind: m.kind,
            to_address: m.to_address,
            cc: m.cc,
            bcc: m.bcc,
            subject: m.subject,
            body: m.body,
            confidence: m.confidence,
            status: m.status,
            retry_count: m.retry_count,
            last_error: m.last_error,
            created_at: m.created_at,
            reviewed_at: m.reviewed_at,
            reviewed_by: m.reviewed_by,
            sent_at: m.sent_at,
            rejection_reason: m.rejection_reason,
        }
    }
}

/// `GET /messages/pending?status=&kind=` (§6).
pub async fn list_pending_messages(
    app: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let status = query.status.as_deref().map(str::parse::<PendingStatus>).transpose().map_err(error_400)?;
    let kind = query.kind.as_deref().map(str::parse::<MessageKind>).transpose().map_err(error_400)?;

    let messages = store::pending_message::list(app.store.pool(), status, kind).await.map_err(error_500)?;
    let views: Vec<PendingMessageView> = messages.into_iter().map(PendingMessageView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

/// `GET /messages/pending/{id}` — detail plus the redacted context an
/// operator would use to judge the draft (§6).
pub async fn get_pending_message(
    app: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, actix_web::Error> {
    let id = path.into_inner();
    let message = store::pending_message::get_by_id(app.store.pool(), id)
        .await
        .map_err(error_500)?
        .ok_or_else(|| error_404(format!("pending message {id} not found")))?;

    let ticket = store::ticket_state::get_by_id(app.store.pool(), message.ticket_id)
        .await
        .map_err(error_500)?
        .ok_or_else(|| error_500(format!("ticket {} referenced by pending message is missing", message.ticket_id)))?;

    let history = fetch_history(app.ticket_client.as_ref(), &ticket.ticket_number).await;
    let builder = ContextBuilder::new(&app.internal_agents, &app.language_overrides);
    let built = builder.build(&ticket, &history, &HashSet::new()).map_err(error_400)?;

    let participants: Vec<serde_json::Value> = built
        .redacted_state
        .participants
        .iter()
        .map(|(addr, role)| json!({ "address": addr, "role": format!("{role:?}") }))
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "message": PendingMessageView::from(message),
        "ticket_number": ticket.ticket_number,
        "redacted_context": {
            "locale": built.locale.to_string(),
            "participants": participants,
            "risks_or_gaps": built.redacted_state.risks_or_gaps,
            "last_message_summaries": built.redacted_state.last_message_summaries,
            "preview": built.operator_preview,
        },
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct EditsBody {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub to: Option<String>,
    pub cc: Option<Vec<String>>,
    pub bcc: Option<Vec<String>>,
}

impl From<EditsBody> for Edits {
    fn from(e: EditsBody) -> Self {
        Self { subject: e.subject, body: e.body, to: e.to, cc: e.cc, bcc: e.bcc }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    pub edits: Option<EditsBody>,
}

fn approval_error_to_actix(e: ApprovalError) -> actix_web::Error {
    match e {
        ApprovalError::NotFound(id) => error_404(format!("pending message {id} not found")),
        ApprovalError::NotPending(id) => error_409(format!("pending message {id} is not in the expected state")),
        ApprovalError::EmptyBody => error_400("message body cannot be empty"),
        ApprovalError::RetriesExhausted(id) => {
            error_409(format!("pending message {id} has exhausted its retry budget"))
        }
        ApprovalError::Store(e) => error_500(e),
    }
}

/// `POST /messages/pending/{id}/approve` (§6, §4.8).
pub async fn approve_pending_message(
    app: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ApproveRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, actix_web::Error> {
    let id = path.into_inner();
    let idempotency_key = extract_idempotency_key(&req)?;
    let route = format!("POST /messages/pending/{id}/approve");

    let mut tx = match try_save_response(&route, &idempotency_key, app.store.pool()).await.map_err(error_500)? {
        NextAction::ReturnSavedResponse(resp) => return Ok(resp),
        NextAction::StartProcessing(tx) => tx,
    };

    let edits = body.into_inner().edits.unwrap_or_default().into();
    let queue = ApprovalQueue { ticket_client: app.ticket_client.as_ref(), max_send_retries: app.max_send_retries };

    match queue.approve(&mut tx, id, OPERATOR, edits).await {
        Ok(status) => {
            let http_response = HttpResponse::Ok().json(json!({ "id": id, "status": status.as_str() }));
            save_response(&route, &idempotency_key, http_response, tx).await.map_err(error_500)
        }
        Err(e) => {
            tx.rollback().await.map_err(error_500)?;
            Err(approval_error_to_actix(e))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// `POST /messages/pending/{id}/reject` (§6, §4.8).
pub async fn reject_pending_message(
    app: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<RejectRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, actix_web::Error> {
    let id = path.into_inner();
    let idempotency_key = extract_idempotency_key(&req)?;
    let route = format!("POST /messages/pending/{id}/reject");

    let mut tx = match try_save_response(&route, &idempotency_key, app.store.pool()).await.map_err(error_500)? {
        NextAction::ReturnSavedResponse(resp) => return Ok(resp),
        NextAction::StartProcessing(tx) => tx,
    };

    let queue = ApprovalQueue { ticket_client: app.ticket_client.as_ref(), max_send_retries: app.max_send_retries };

    match queue.reject(&mut tx, id, OPERATOR, &body.reason).await {
        Ok(()) => {
            let http_response = HttpResponse::Ok().json(json!({ "id": id, "status": "rejected" }));
            save_response(&route, &idempotency_key, http_response, tx).await.map_err(error_500)
        }
        Err(e) => {
            tx.rollback().await.map_err(error_500)?;
            Err(approval_error_to_actix(e))
        }
    }
}

/// `POST /messages/pending/{id}/retry` — valid only from `failed` (§6, §4.8).
pub async fn retry_pending_message(
    app: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, actix_web::Error> {
    let id = path.into_inner();
    let idempotency_key = extract_idempotency_key(&req)?;
    let route = format!("POST /messages/pending/{id}/retry");

    let mut tx = match try_save_response(&route, &idempotency_key, app.store.pool()).await.map_err(error_500)? {
        NextAction::ReturnSavedResponse(resp) => return Ok(resp),
        NextAction::StartProcessing(tx) => tx,
    };

    let queue = ApprovalQueue { ticket_client: app.ticket_client.as_ref(), max_send_retries: app.max_send_retries };

    match queue.retry(&mut tx, id, OPERATOR).await {
        Ok(status) => {
            let http_response = HttpResponse::Ok().json(json!({ "id": id, "status": status.as_str() }));
            save_response(&route, &idempotency_key, http_response, tx).await.map_err(error_500)
        }
        Err(e) => {
            tx.rollback().await.map_err(error_500)?;
            Err(approval_error_to_actix(e))
        }
    }
}
