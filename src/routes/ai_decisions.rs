use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::OperatorFeedback;
use crate::idempotency::save_response;
use crate::idempotency::try_save_response;
use crate::idempotency::NextAction;
use crate::routes::extract_idempotency_key;
use crate::startup::AppState;
use crate::store;
use crate::utils::error_400;
use crate::utils::error_404;
use crate::utils::error_500;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: String,
    pub notes: Option<String>,
}

/// `POST /ai-decisions/{id}/feedback` (§6). The only mutation ever applied
/// to an `ai_decisions` row (§I5).
pub async fn submit_feedback(
    app: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<FeedbackRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, actix_web::Error> {
    let id = path.into_inner();
    let feedback: OperatorFeedback = body.feedback.parse().map_err(error_400)?;

    let idempotency_key = extract_idempotency_key(&req)?;
    let route = format!("POST /ai-decisions/{id}/feedback");
    let mut tx = match try_save_response(&route, &idempotency_key, app.store.pool()).await.map_err(error_500)? {
        NextAction::ReturnSavedResponse(resp) => return Ok(resp),
        NextAction::StartProcessing(tx) => tx,
    };

    store::ai_decision::get_by_id(&mut *tx, id)
        .await
        .map_err(error_500)?
        .ok_or_else(|| error_404(format!("ai decision {id} not found")))?;

    store::ai_decision::record_feedback(&mut *tx, id, feedback, body.notes.as_deref())
        .await
        .map_err(error_500)?;

    let http_response = HttpResponse::Ok().json(json!({ "id": id, "feedback": feedback.as_str() }));
    save_response(&route, &idempotency_key, http_response, tx).await.map_err(error_500)
}
