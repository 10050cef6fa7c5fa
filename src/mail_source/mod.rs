mod http;
mod in_memory;

use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;
use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;

pub use http::HttpMailSource;
pub use in_memory::InMemoryMailSource;

/// A byte attachment carried by an inbound or outbound message (§4.2/§6).
#[derive(Debug, Clone)]
pub struct Attachment {
    pub attachment_id: String,
    pub filename: String,
    pub mime_type: String,
}

/// One inbound message as seen by the mail transport, before any
/// correlation against the ticketing backend (§4.2).
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub source_message_id: String,
    pub thread_id: Option<String>,
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: Option<String>,
    pub received_at: DateTime<Utc>,
    pub body_plain: String,
    pub body_html: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Error)]
pub enum MailSourceError {
    #[error("transient mail source failure: {0}")]
    Transient(String),
    #[error("permanent mail source failure: {0}")]
    Permanent(String),
}

/// Inbound mail transport (§4.2, §6). The Gmail-specific transport detail
/// is out of scope; this trait is the contract any transport must satisfy,
/// with `HttpMailSource` as the generic concrete implementation.
#[async_trait]
#[auto_impl(Box, Arc)]
pub trait MailSource: Send + Sync + Debug {
    /// Messages not previously marked consumed. Must be safe to call
    /// concurrently — the pipeline's own idempotency gate (via `Store`) is
    /// what ultimately prevents double-processing, not this method.
    async fn list_new(&self) -> Result<Vec<InboundMessage>, MailSourceError>;

    async fn mark_consumed(&self, source_message_id: &str) -> Result<(), MailSourceError>;

    async fn fetch_attachment(
        &self,
        source_message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, MailSourceError>;
}
