use serde_json::json;
use triage_pilot::domain::MessageKind;
use triage_pilot::domain::PendingStatus;
use triage_pilot::domain::TicketStatus;
use triage_pilot::store::pending_message::insert as insert_pending_message;
use triage_pilot::store::pending_message::NewPendingMessage;
use triage_pilot::store::ticket_state::insert as insert_ticket_state;
use triage_pilot::store::ticket_state::NewTicketState;
use uuid::Uuid;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;

async fn seed_ticket(pool: &sqlx::PgPool, ticket_number: &str) -> Uuid {
    insert_ticket_state(
        pool,
        NewTicketState {
            ticket_number: ticket_number.to_string(),
            ticket_id: format!("upstream-{ticket_number}"),
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
    .expect("insert ticket_state")
    .id
}

async fn seed_pending(
    pool: &sqlx::PgPool,
    ticket_id: Uuid,
    status: PendingStatus,
) -> Uuid {
    let pending = insert_pending_message(
        pool,
        NewPendingMessage {
            ticket_id,
            kind: MessageKind::Customer,
            to_address: "customer@example.com".to_string(),
            cc: vec![],
            bcc: vec![],
            subject: "Re: your order".to_string(),
            body: "Your order is on its way.".to_string(),
            attachments: json!([]),
            confidence: Some(0.9),
            ai_decision_id: None,
            status,
        },
    )
    .await
    .expect("insert pending_message")
    .id;

    if status == PendingStatus::Failed {
        sqlx::query("UPDATE pending_messages SET retry_count = 1, last_error = 'boom' WHERE id = $1")
            .bind(pending)
            .execute(pool)
            .await
            .unwrap();
    }
    pending
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

#[tokio::test]
async fn list_pending_messages_filters_by_status_and_kind() {
    let app = spawn_app().await;
    let ticket_id = seed_ticket(&app.pool, "T-2001").await;
    seed_pending(&app.pool, ticket_id, PendingStatus::Pending).await;
    seed_pending(&app.pool, ticket_id, PendingStatus::Sent).await;

    let response = app.get("/messages/pending?status=pending").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["status"], "pending");

    let response = app.get("/messages/pending?kind=customer").await;
    let body: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(body.len(), 2);
}

#[tokio::test]
async fn get_pending_message_includes_redacted_context() {
    let app = spawn_app().await;
    let ticket_id = seed_ticket(&app.pool, "T-2002").await;
    mock_ticketing_oauth(&app.ticketing_server).await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ticket_id": "upstream-T-2002",
            "ticket_number": "T-2002",
            "status": "awaiting-customer",
            "custom_status_id": null,
            "customer_email": "customer@example.com",
            "order_number": "ORD-1",
            "purchase_order_number": null,
            "history": [],
        })))
        .mount(&app.ticketing_server)
        .await;
    let pending_id = seed_pending(&app.pool, ticket_id, PendingStatus::Pending).await;

    let response = app.get(&format!("/messages/pending/{pending_id}")).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["ticket_number"], "T-2002");
    assert!(body["redacted_context"]["preview"].is_string());
}

#[tokio::test]
async fn get_pending_message_404_when_missing() {
    let app = spawn_app().await;
    let response = app.get(&format!("/messages/pending/{}", Uuid::new_v4())).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn approve_pending_message_sends_and_marks_sent() {
    let app = spawn_app().await;
    let ticket_id = seed_ticket(&app.pool, "T-2003").await;
    let pending_id = seed_pending(&app.pool, ticket_id, PendingStatus::Pending).await;
    mock_ticketing_oauth(&app.ticketing_server).await;
    Mock::given(method("POST"))
        .and(path("/tickets/upstream-T-2003/messages/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message_id": "m-1" })))
        .mount(&app.ticketing_server)
        .await;

    let response = app
        .post_json(
            &format!("/messages/pending/{pending_id}/approve"),
            "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa",
            &json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "sent");

    let row: (String,) = sqlx::query_as("SELECT status FROM pending_messages WHERE id = $1")
        .bind(pending_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(row.0, "sent");
}

#[tokio::test]
async fn approve_is_idempotent_on_repeated_idempotency_key() {
    let app = spawn_app().await;
    let ticket_id = seed_ticket(&app.pool, "T-2004").await;
    let pending_id = seed_pending(&app.pool, ticket_id, PendingStatus::Pending).await;
    mock_ticketing_oauth(&app.ticketing_server).await;
    Mock::given(method("POST"))
        .and(path("/tickets/upstream-T-2004/messages/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message_id": "m-1" })))
        .expect(1)
        .mount(&app.ticketing_server)
        .await;

    let key = "bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb";
    let path_str = format!("/messages/pending/{pending_id}/approve");
    let first = app.post_json(&path_str, key, &json!({})).await;
    assert_eq!(first.status().as_u16(), 200);
    let second = app.post_json(&path_str, key, &json!({})).await;
    assert_eq!(second.status().as_u16(), 200);
    assert_eq!(
        first.json::<serde_json::Value>().await.unwrap(),
        second.json::<serde_json::Value>().await.unwrap()
    );
}

#[tokio::test]
async fn approve_nonexistent_message_returns_404() {
    let app = spawn_app().await;
    let response = app
        .post_json(
            &format!("/messages/pending/{}/approve", Uuid::new_v4()),
            "cccccccc-cccc-cccc-cccc-cccccccccccc",
            &json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn reject_pending_message_marks_rejected() {
    let app = spawn_app().await;
    let ticket_id = seed_ticket(&app.pool, "T-2005").await;
    let pending_id = seed_pending(&app.pool, ticket_id, PendingStatus::Pending).await;

    let response = app
        .post_json(
            &format!("/messages/pending/{pending_id}/reject"),
            "dddddddd-dddd-dddd-dddd-dddddddddddd",
            &json!({ "reason": "draft is inaccurate" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let row: (String, Option<String>) =
        sqlx::query_as("SELECT status, rejection_reason FROM pending_messages WHERE id = $1")
            .bind(pending_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(row.0, "rejected");
    assert_eq!(row.1.as_deref(), Some("draft is inaccurate"));
}

#[tokio::test]
async fn reject_already_terminal_message_returns_409() {
    let app = spawn_app().await;
    let ticket_id = seed_ticket(&app.pool, "T-2006").await;
    let pending_id = seed_pending(&app.pool, ticket_id, PendingStatus::Sent).await;

    let response = app
        .post_json(
            &format!("/messages/pending/{pending_id}/reject"),
            "eeeeeeee-eeee-eeee-eeee-eeeeeeeeeeee",
            &json!({ "reason": "too late" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn retry_failed_message_resends_and_marks_sent() {
    let app = spawn_app().await;
    let ticket_id = seed_ticket(&app.pool, "T-2007").await;
    let pending_id = seed_pending(&app.pool, ticket_id, PendingStatus::Failed).await;
    mock_ticketing_oauth(&app.ticketing_server).await;
    Mock::given(method("POST"))
        .and(path("/tickets/upstream-T-2007/messages/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message_id": "m-2" })))
        .mount(&app.ticketing_server)
        .await;

    let response = app
        .post_json(
            &format!("/messages/pending/{pending_id}/retry"),
            "ffffffff-ffff-ffff-ffff-ffffffffffff",
            &json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "sent");
}

#[tokio::test]
async fn retry_pending_message_not_failed_returns_409() {
    let app = spawn_app().await;
    let ticket_id = seed_ticket(&app.pool, "T-2008").await;
    let pending_id = seed_pending(&app.pool, ticket_id, PendingStatus::Pending).await;

    let response = app
        .post_json(
            &format!("/messages/pending/{pending_id}/retry"),
            "00000000-0000-0000-0000-000000000000",
            &json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);
}
