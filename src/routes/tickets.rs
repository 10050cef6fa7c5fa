use std::collections::HashSet;

use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::context_builder::ContextBuilder;
use crate::idempotency::save_response;
use crate::idempotency::try_save_response;
use crate::idempotency::NextAction;
use crate::routes::extract_idempotency_key;
use crate::routes::fetch_history;
use crate::store;
use crate::store::ai_decision::NewAiDecision;
use crate::utils::error_400;
use crate::utils::error_404;
use crate::utils::error_500;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub ignored_message_ids: Vec<String>,
    #[serde(default)]
    pub preview_only: bool,
}

/// `POST /tickets/{ticket_number}/analyze` (§6). Either returns the prompt
/// preview `ContextBuilder` would send, or runs the LLM and appends a new
/// `AiDecision` — no dispatch, unlike the automated pipeline's equivalent
/// step.
pub async fn analyze_ticket(
    app: web::Data<crate::startup::AppState>,
    path: web::Path<String>,
    body: web::Json<AnalyzeRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, actix_web::Error> {
    let ticket_number = path.into_inner();
    let body = body.into_inner();

    let ticket = store::ticket_state::get_by_ticket_number(app.store.pool(), &ticket_number)
        .await
        .map_err(error_500)?
        .ok_or_else(|| error_404(format!("ticket {ticket_number} not found")))?;

    let history = fetch_history(app.ticket_client.as_ref(), &ticket.ticket_number).await;
    let ignored: HashSet<String> = body.ignored_message_ids.into_iter().collect();
    let builder = ContextBuilder::new(&app.internal_agents, &app.language_overrides);
    let built = builder.build(&ticket, &history, &ignored).map_err(error_400)?;

    if body.preview_only {
        return Ok(HttpResponse::Ok().json(json!({
            "system_prompt": built.system_prompt,
            "user_prompt": built.user_prompt,
            "operator_preview": built.operator_preview,
        })));
    }

    let idempotency_key = extract_idempotency_key(&req)?;
    let route = format!("POST /tickets/{ticket_number}/analyze");
    let mut tx = match try_save_response(&route, &idempotency_key, app.store.pool()).await.map_err(error_500)? {
        NextAction::ReturnSavedResponse(resp) => return Ok(resp),
        NextAction::StartProcessing(tx) => tx,
    };

    let mut analysis = app
        .llm_client
        .analyze(&built.system_prompt, &built.user_prompt)
        .await
        .map_err(|e| error_500(e.to_string()))?;

    if built.requests_human_escalation {
        analysis.requires_escalation = true;
        analysis.customer_draft =
            crate::llm_client::Draft::NoDraft { reason: "Customer requested human contact".to_string() };
    }

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
            phase_at_decision: app.phase,
        },
    )
    .await
    .map_err(error_500)?;

    let http_response = HttpResponse::Ok().json(json!({
        "id": decision.id,
        "ticket_id": decision.ticket_id,
        "detected_intent": decision.detected_intent,
        "confidence": decision.confidence,
        "requires_escalation": decision.requires_escalation,
        "generated_customer_draft": decision.generated_customer_draft,
        "generated_supplier_draft": decision.generated_supplier_draft,
    }));
    save_response(&route, &idempotency_key, http_response, tx).await.map_err(error_500)
}
