use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;

use super::token::TokenCache;
use super::TicketClientError;
use super::TicketHeader;
use super::TicketHistoryEntry;
use super::TicketView;
use crate::mail_source::Attachment;

/// Backoff schedule for network/5xx retries (§4.3): 0.5s, 1s, 2s, 4s, then
/// give up — 3 retries after the first attempt.
const BACKOFF_SCHEDULE_MS: [u64; 3] = [500, 1000, 2000];

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in_seconds: i64,
}

#[derive(Debug, Deserialize)]
struct WireHistoryEntry {
    from_address: String,
    role: String,
    body: String,
    sent_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
struct WireTicket {
    ticket_id: String,
    ticket_number: String,
    status: String,
    custom_status_id: Option<String>,
    customer_email: Option<String>,
    order_number: Option<String>,
    purchase_order_number: Option<String>,
    #[serde(default)]
    history: Vec<WireHistoryEntry>,
}

impl From<WireTicket> for TicketView {
    fn from(w: WireTicket) -> Self {
        Self {
            ticket_id: w.ticket_id,
            ticket_number: w.ticket_number,
            status: w.status,
            custom_status_id: w.custom_status_id,
            customer_email: w.customer_email,
            order_number: w.order_number,
            purchase_order_number: w.purchase_order_number,
            history: w
                .history
                .into_iter()
                .map(|h| TicketHistoryEntry {
                    from_address: h.from_address,
                    role: h.role,
                    body: h.body,
                    sent_at: h.sent_at,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireAttachmentRef<'a> {
    filename: &'a str,
    mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    message_id: String,
}

/// `reqwest`-backed `TicketClient` against a generic REST convention
/// (§4.3, §6). The concrete backend's protocol is out of scope; this
/// implementation exists to give the rest of the system something real to
/// call, and to host the token-lifecycle and retry policy the spec mandates.
#[derive(Debug)]
pub struct HttpTicketClient {
    http_client: Client,
    base_url: String,
    client_id: String,
    client_secret: Secret<String>,
    token: TokenCache,
}

impl HttpTicketClient {
    pub fn new(
        base_url: String,
        client_id: String,
        client_secret: Secret<String>,
        timeout_ms: u64,
    ) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .expect("reqwest client builder never fails with these options");
        Self {
            http_client,
            base_url,
            client_id,
            client_secret,
            token: TokenCache::new(),
        }
    }

    async fn fetch_token(&self) -> Result<Secret<String>, TicketClientError> {
        if let Some(token) = self.token.get().await {
            return Ok(token);
        }

        let url = format!("{}/oauth/token", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret.expose_secret(),
                "grant_type": "client_credentials",
            }))
            .send()
            .await
            .map_err(|e| TicketClientError::AuthFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TicketClientError::AuthFailed(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| TicketClientError::AuthFailed(e.to_string()))?;
        let value = Secret::new(parsed.access_token);
        let expires_at = Utc::now() + chrono::Duration::seconds(parsed.expires_in_seconds);
        self.token.set(value.clone(), expires_at).await;
        Ok(value)
    }

    /// Send `build` with the cached (or freshly fetched) token, retrying on
    /// network/5xx with the schedule in `BACKOFF_SCHEDULE_MS`, refreshing
    /// the token exactly once on a 401.
    async fn with_retry<F>(
        &self,
        build: F,
    ) -> Result<reqwest::Response, TicketClientError>
    where
        F: Fn(&Client, &str) -> reqwest::RequestBuilder,
    {
        let mut reauthed = false;
        let mut last_err = None;

        for (attempt, delay_ms) in
            std::iter::once(0).chain(BACKOFF_SCHEDULE_MS).enumerate()
        {
            if attempt > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }

            let token = self.fetch_token().await?;
            let request = build(&self.http_client, token.expose_secret());
            match request.send().await {
                Ok(response) if response.status() == StatusCode::UNAUTHORIZED && !reauthed => {
                    reauthed = true;
                    self.token.invalidate().await;
                    continue;
                }
                Ok(response) if response.status().is_server_error() => {
                    last_err = Some(TicketClientError::Transient(format!(
                        "ticketing backend returned {}",
                        response.status()
                    )));
                    continue;
                }
                Ok(response) if !response.status().is_success() => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(TicketClientError::Permanent(format!(
                        "ticketing backend returned {status}: {body}"
                    )));
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_err = Some(TicketClientError::Transient(e.to_string()));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            TicketClientError::Transient("exhausted retries".to_string())
        }))
    }

    async fn get_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<TicketView>, TicketClientError> {
        let url = format!("{}/tickets?{}={}", self.base_url, field, value);
        let response = self
            .with_retry(|client, token| client.get(&url).bearer_auth(token))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let ticket: Option<WireTicket> = response
            .json()
            .await
            .map_err(|e| TicketClientError::Permanent(e.to_string()))?;
        Ok(ticket.map(Into::into))
    }
}

#[async_trait]
impl super::TicketClient for HttpTicketClient {
    async fn get_by_order(
        &self,
        order_number: &str,
    ) -> Result<Option<TicketView>, TicketClientError> {
        self.get_by_field("order_number", order_number).await
    }

    async fn get_by_ticket(
        &self,
        ticket_number: &str,
    ) -> Result<Option<TicketView>, TicketClientError> {
        self.get_by_field("ticket_number", ticket_number).await
    }

    async fn get_by_purchase_order(
        &self,
        purchase_order_number: &str,
    ) -> Result<Option<TicketView>, TicketClientError> {
        self.get_by_field("purchase_order_number", purchase_order_number).await
    }

    async fn upsert(&self, header: TicketHeader) -> Result<String, TicketClientError> {
        let url = format!("{}/tickets", self.base_url);
        let body = json!({
            "ticket_number": header.ticket_number,
            "order_number": header.order_number,
            "purchase_order_number": header.purchase_order_number,
            "customer_email": header.customer_email,
            "subject": header.subject,
        });
        let response = self
            .with_retry(|client, token| client.post(&url).bearer_auth(token).json(&body))
            .await?;
        #[derive(Deserialize)]
        struct UpsertResponse {
            ticket_id: String,
        }
        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|e| TicketClientError::Permanent(e.to_string()))?;
        Ok(parsed.ticket_id)
    }

    async fn send_customer(
        &self,
        ticket_id: &str,
        subject: &str,
        body: &str,
        attachments: &[Attachment],
        cc: &[String],
        bcc: &[String],
    ) -> Result<String, TicketClientError> {
        let url = format!("{}/tickets/{}/messages/customer", self.base_url, ticket_id);
        let payload = json!({
            "subject": subject,
            "body": body,
            "attachments": attachments.iter().map(|a| WireAttachmentRef {
                filename: &a.filename,
                mime_type: &a.mime_type,
            }).collect::<Vec<_>>(),
            "cc": cc,
            "bcc": bcc,
        });
        let response = self
            .with_retry(|client, token| client.post(&url).bearer_auth(token).json(&payload))
            .await?;
        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| TicketClientError::Permanent(e.to_string()))?;
        Ok(parsed.message_id)
    }

    async fn send_supplier(
        &self,
        ticket_id: &str,
        to: &str,
        subject: &str,
        body: &str,
        attachments: &[Attachment],
        cc: &[String],
        bcc: &[String],
    ) -> Result<String, TicketClientError> {
        let url = format!("{}/tickets/{}/messages/supplier", self.base_url, ticket_id);
        let payload = json!({
            "to": to,
            "subject": subject,
            "body": body,
            "attachments": attachments.iter().map(|a| WireAttachmentRef {
                filename: &a.filename,
                mime_type: &a.mime_type,
            }).collect::<Vec<_>>(),
            "cc": cc,
            "bcc": bcc,
        });
        let response = self
            .with_retry(|client, token| client.post(&url).bearer_auth(token).json(&payload))
            .await?;
        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| TicketClientError::Permanent(e.to_string()))?;
        Ok(parsed.message_id)
    }

    async fn send_internal(&self, ticket_id: &str, body: &str) -> Result<String, TicketClientError> {
        let url = format!("{}/tickets/{}/messages/internal", self.base_url, ticket_id);
        let payload = json!({ "body": body });
        let response = self
            .with_retry(|client, token| client.post(&url).bearer_auth(token).json(&payload))
            .await?;
        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| TicketClientError::Permanent(e.to_string()))?;
        Ok(parsed.message_id)
    }
}
