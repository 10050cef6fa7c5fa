use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;

use super::Attachment;
use super::InboundMessage;
use super::MailSource;
use super::MailSourceError;

/// Polls a generic JSON HTTP endpoint for new inbound messages, standing in
/// for whatever mail transport (Gmail API, IMAP bridge, ...) fronts the
/// operation in production — that wire protocol is explicitly out of scope
/// (§1 Non-goals).
#[derive(Debug)]
pub struct HttpMailSource {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    attachment_id: String,
    filename: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    source_message_id: String,
    thread_id: Option<String>,
    from: String,
    #[serde(default)]
    to: Vec<String>,
    #[serde(default)]
    cc: Vec<String>,
    subject: Option<String>,
    received_at: chrono::DateTime<chrono::Utc>,
    body_plain: String,
    body_html: Option<String>,
    #[serde(default)]
    attachments: Vec<WireAttachment>,
}

impl From<WireMessage> for InboundMessage {
    fn from(w: WireMessage) -> Self {
        Self {
            source_message_id: w.source_message_id,
            thread_id: w.thread_id,
            from: w.from,
            to: w.to,
            cc: w.cc,
            subject: w.subject,
            received_at: w.received_at,
            body_plain: w.body_plain,
            body_html: w.body_html,
            attachments: w
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    attachment_id: a.attachment_id,
                    filename: a.filename,
                    mime_type: a.mime_type,
                })
                .collect(),
        }
    }
}

impl HttpMailSource {
    pub fn new(base_url: String, api_key: Secret<String>, timeout_ms: u64) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .expect("reqwest client builder never fails with these options");
        Self { http_client, base_url, api_key }
    }
}

#[async_trait]
impl MailSource for HttpMailSource {
    async fn list_new(&self) -> Result<Vec<InboundMessage>, MailSourceError> {
        let url = format!("{}/messages?status=new", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| MailSourceError::Transient(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(MailSourceError::Transient(format!(
                "mail source returned {}",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(MailSourceError::Permanent(format!(
                "mail source returned {}",
                response.status()
            )));
        }

        let messages: Vec<WireMessage> = response
            .json()
            .await
            .map_err(|e| MailSourceError::Permanent(e.to_string()))?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn mark_consumed(&self, source_message_id: &str) -> Result<(), MailSourceError> {
        let url = format!("{}/messages/{}/consumed", self.base_url, source_message_id);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| MailSourceError::Transient(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(MailSourceError::Transient(format!(
                "mail source returned {}",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(MailSourceError::Permanent(format!(
                "mail source returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn fetch_attachment(
        &self,
        source_message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, MailSourceError> {
        let url = format!(
            "{}/messages/{}/attachments/{}",
            self.base_url, source_message_id, attachment_id
        );
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| MailSourceError::Transient(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(MailSourceError::Transient(format!(
                "mail source returned {}",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(MailSourceError::Permanent(format!(
                "mail source returned {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| MailSourceError::Transient(e.to_string()))
    }
}
