use serde_json::json;
use triage_pilot::domain::TicketStatus;
use triage_pilot::store::ticket_state::insert;
use triage_pilot::store::ticket_state::NewTicketState;
use uuid::Uuid;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;

async fn seed_ticket(pool: &sqlx::PgPool, ticket_number: &str) -> Uuid {
    let ticket = insert(
        pool,
        NewTicketState {
            ticket_number: ticket_number.to_string(),
            ticket_id: format!("upstream-{ticket_number}"),
            status: TicketStatus::New,
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
    .expect("insert ticket_state");
    ticket.id
}

async fn mock_ticketing_oauth(server: &wiremock::MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in_seconds": 3600,
        })))
        .mount(server)
        .await;
}

async fn mock_ticket_lookup(server: &wiremock::MockServer, ticket_number: &str) {
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .and(query_param("ticket_number", ticket_number))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ticket_id": format!("upstream-{ticket_number}"),
            "ticket_number": ticket_number,
            "status": "new",
            "custom_status_id": null,
            "customer_email": "customer@example.com",
            "order_number": "ORD-1",
            "purchase_order_number": null,
            "history": [
                {
                    "from_address": "customer@example.com",
                    "role": "customer",
                    "body": "Where is my order ORD-1?",
                    "sent_at": "2026-07-20T10:00:00Z",
                }
            ],
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn analyze_preview_only_does_not_call_the_llm() {
    let app = spawn_app().await;
    seed_ticket(&app.pool, "T-1001").await;
    mock_ticketing_oauth(&app.ticketing_server).await;
    mock_ticket_lookup(&app.ticketing_server, "T-1001").await;

    // No mock registered on `app.llm_server` at all: if `analyze_ticket`
    // called the LLM despite `preview_only`, wiremock would panic on an
    // unexpected request once the server is dropped.
    let response = app
        .post_json(
            "/tickets/T-1001/analyze",
            "11111111-1111-1111-1111-111111111111",
            &json!({ "preview_only": true }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["system_prompt"].is_string());
    assert!(body["user_prompt"].is_string());
    assert!(body["operator_preview"].is_string());
}

#[tokio::test]
async fn analyze_runs_llm_and_persists_a_decision() {
    let app = spawn_app().await;
    seed_ticket(&app.pool, "T-1002").await;
    mock_ticketing_oauth(&app.ticketing_server).await;
    mock_ticket_lookup(&app.ticketing_server, "T-1002").await;

    let llm_content = json!({
        "intent": "order_status",
        "ticket_type_id": null,
        "confidence": 0.91,
        "requires_escalation": false,
        "customer_draft": { "state": "drafted", "body": "Your order is on its way." },
        "supplier_draft": { "state": "no_draft", "reason": "no supplier contact needed" },
        "state_json": {},
        "summary": "Customer asked for an order status update.",
    })
    .to_string();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "content": llm_content } } ]
        })))
        .mount(&app.llm_server)
        .await;

    let response = app
        .post_json(
            "/tickets/T-1002/analyze",
            "22222222-2222-2222-2222-222222222222",
            &json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detected_intent"], "order_status");
    assert_eq!(body["requires_escalation"], false);
    assert_eq!(body["generated_customer_draft"], "Your order is on its way.");

    let stored: i64 = sqlx::query_scalar("SELECT count(*) FROM ai_decisions WHERE ticket_id = $1")
        .bind(uuid::Uuid::parse_str(&body["ticket_id"].as_str().unwrap()).unwrap())
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn analyze_overrides_llm_when_customer_requests_a_human() {
    let app = spawn_app().await;
    seed_ticket(&app.pool, "T-1003").await;
    mock_ticketing_oauth(&app.ticketing_server).await;

    // History carries the deterministic escalation phrase (§8 scenario 4) —
    // `requests_human_escalation` should force escalation regardless of
    // what the LLM itself reports.
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .and(query_param("ticket_number", "T-1003"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ticket_id": "upstream-T-1003",
            "ticket_number": "T-1003",
            "status": "new",
            "custom_status_id": null,
            "customer_email": "customer@example.com",
            "order_number": "ORD-1",
            "purchase_order_number": null,
            "history": [
                {
                    "from_address": "customer@example.com",
                    "role": "customer",
                    "body": "I want to speak to a human about this.",
                    "sent_at": "2026-07-20T10:00:00Z",
                }
            ],
        })))
        .mount(&app.ticketing_server)
        .await;

    let llm_content = json!({
        "intent": "complaint",
        "ticket_type_id": null,
        "confidence": 0.4,
        "requires_escalation": false,
        "customer_draft": { "state": "drafted", "body": "Here is a draft reply." },
        "supplier_draft": { "state": "no_draft", "reason": "n/a" },
        "state_json": {},
        "summary": "Customer is frustrated.",
    })
    .to_string();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "content": llm_content } } ]
        })))
        .mount(&app.llm_server)
        .await;

    let response = app
        .post_json(
            "/tickets/T-1003/analyze",
            "33333333-3333-3333-3333-333333333333",
            &json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["requires_escalation"], true);
    assert!(body["generated_customer_draft"].is_null());
}

#[tokio::test]
async fn analyze_is_idempotent_on_repeated_idempotency_key() {
    let app = spawn_app().await;
    seed_ticket(&app.pool, "T-1004").await;
    mock_ticketing_oauth(&app.ticketing_server).await;
    mock_ticket_lookup(&app.ticketing_server, "T-1004").await;

    let llm_content = json!({
        "intent": "order_status",
        "ticket_type_id": null,
        "confidence": 0.91,
        "requires_escalation": false,
        "customer_draft": { "state": "no_draft", "reason": "nothing to say yet" },
        "supplier_draft": { "state": "no_draft", "reason": "n/a" },
        "state_json": {},
        "summary": "summary",
    })
    .to_string();

    // `expect(1)` — a second call with the same Idempotency-Key must be
    // served from the saved response, not re-invoke the LLM.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "content": llm_content } } ]
        })))
        .expect(1)
        .mount(&app.llm_server)
        .await;

    let key = "44444444-4444-4444-4444-444444444444";
    let first = app.post_json("/tickets/T-1004/analyze", key, &json!({})).await;
    assert_eq!(first.status().as_u16(), 200);
    let first_body: serde_json::Value = first.json().await.unwrap();

    let second = app.post_json("/tickets/T-1004/analyze", key, &json!({})).await;
    assert_eq!(second.status().as_u16(), 200);
    let second_body: serde_json::Value = second.json().await.unwrap();

    assert_eq!(first_body, second_body);
}
