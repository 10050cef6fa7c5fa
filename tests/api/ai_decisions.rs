use chrono::Utc;
use serde_json::json;
use triage_pilot::domain::Phase;
use triage_pilot::domain::TicketStatus;
use triage_pilot::store::ai_decision::insert as insert_ai_decision;
use triage_pilot::store::ai_decision::NewAiDecision;
use triage_pilot::store::ticket_state::insert as insert_ticket_state;
use triage_pilot::store::ticket_state::NewTicketState;
use uuid::Uuid;

use crate::helpers::spawn_app;

async fn seed_decision(pool: &sqlx::PgPool) -> Uuid {
    let ticket = insert_ticket_state(
        pool,
        NewTicketState {
            ticket_number: "T-3001".to_string(),
            ticket_id: "upstream-T-3001".to_string(),
            status: TicketStatus::AwaitingCustomer,
            custom_status_id: None,
            customer_email: Some("customer@example.com".to_string()),
            language: None,
            order_number: Some("ORD-1".to_string()),
            purchase_order_number: None,
            supplier_email: None,
            gmail_thread_id: None,
        },
    )
    .await
    .unwrap();

    insert_ai_decision(
        pool,
        NewAiDecision {
            ticket_id: ticket.id,
            at: Utc::now(),
            detected_language: Some("en".to_string()),
            detected_intent: "order_status".to_string(),
            confidence: 0.9,
            recommended_action: "reply to customer".to_string(),
            generated_customer_draft: Some("Your order is on its way.".to_string()),
            generated_supplier_draft: None,
            requires_escalation: false,
            phase_at_decision: Phase::Shadow,
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn submit_feedback_records_it_against_the_decision() {
    let app = spawn_app().await;
    let decision_id = seed_decision(&app.pool).await;

    let response = app
        .post_json(
            &format!("/ai-decisions/{decision_id}/feedback"),
            "11111111-0000-0000-0000-000000000001",
            &json!({ "feedback": "correct" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let row: (Option<String>, Option<String>) =
        sqlx::query_as("SELECT operator_feedback, feedback_notes FROM ai_decisions WHERE id = $1")
            .bind(decision_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(row.0.as_deref(), Some("correct"));
}

#[tokio::test]
async fn submit_feedback_rejects_invalid_value() {
    let app = spawn_app().await;
    let decision_id = seed_decision(&app.pool).await;

    let response = app
        .post_json(
            &format!("/ai-decisions/{decision_id}/feedback"),
            "11111111-0000-0000-0000-000000000002",
            &json!({ "feedback": "not-a-real-value" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn submit_feedback_404_when_decision_missing() {
    let app = spawn_app().await;
    let response = app
        .post_json(
            &format!("/ai-decisions/{}/feedback", Uuid::new_v4()),
            "11111111-0000-0000-0000-000000000003",
            &json!({ "feedback": "correct" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);
}
