mod http;
mod token;

use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;
use thiserror::Error;

pub use http::HttpTicketClient;

use crate::mail_source::Attachment;

/// A ticket as seen by the upstream ticketing backend (§4.3). `history` is
/// the backend's own record of prior messages, used by `ContextBuilder`.
#[derive(Debug, Clone)]
pub struct TicketView {
    pub ticket_id: String,
    pub ticket_number: String,
    pub status: String,
    pub custom_status_id: Option<String>,
    pub customer_email: Option<String>,
    pub order_number: Option<String>,
    pub purchase_order_number: Option<String>,
    pub history: Vec<TicketHistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct TicketHistoryEntry {
    pub from_address: String,
    pub role: String,
    pub body: String,
    pub sent_at: chrono::DateTime<chrono::Utc>,
}

/// Fields supplied to `upsert` (§4.3). Creates when no matching ticket is
/// found upstream, otherwise updates the matched ticket.
#[derive(Debug, Clone)]
pub struct TicketHeader {
    pub ticket_number: Option<String>,
    pub order_number: Option<String>,
    pub purchase_order_number: Option<String>,
    pub customer_email: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Error)]
pub enum TicketClientError {
    #[error("transient ticketing backend failure: {0}")]
    Transient(String),
    #[error("ticketing backend rejected the request: {0}")]
    Permanent(String),
    #[error("authentication with ticketing backend failed: {0}")]
    AuthFailed(String),
}

/// Authenticated RPC surface against the upstream ticketing backend (§4.3,
/// §6). The wire protocol of any particular backend is out of scope; this
/// is the contract the rest of the system depends on, with
/// `HttpTicketClient` as the generic concrete implementation.
#[async_trait]
#[auto_impl(Box, Arc)]
pub trait TicketClient: Send + Sync + Debug {
    async fn get_by_order(
        &self,
        order_number: &str,
    ) -> Result<Option<TicketView>, TicketClientError>;

    async fn get_by_ticket(
        &self,
        ticket_number: &str,
    ) -> Result<Option<TicketView>, TicketClientError>;

    async fn get_by_purchase_order(
        &self,
        purchase_order_number: &str,
    ) -> Result<Option<TicketView>, TicketClientError>;

    /// Creates when `header.ticket_number` does not resolve upstream, else
    /// updates. Per §4.3, the returned id may not be immediately resolvable
    /// via `get_by_ticket` — callers must re-correlate via order/PO search.
    async fn upsert(&self, header: TicketHeader) -> Result<String, TicketClientError>;

    async fn send_customer(
        &self,
        ticket_id: &str,
        subject: &str,
        body: &str,
        attachments: &[Attachment],
        cc: &[String],
        bcc: &[String],
    ) -> Result<String, TicketClientError>;

    async fn send_supplier(
        &self,
        ticket_id: &str,
        to: &str,
        subject: &str,
        body: &str,
        attachments: &[Attachment],
        cc: &[String],
        bcc: &[String],
    ) -> Result<String, TicketClientError>;

    async fn send_internal(&self, ticket_id: &str, body: &str) -> Result<String, TicketClientError>;
}
