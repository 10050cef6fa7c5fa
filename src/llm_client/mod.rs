mod http;

use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub use http::HttpLLMClient;

/// A draft the LLM either produced or explicitly withheld, with a reason
/// (§4.4/§4.6: "either may be NO_DRAFT with a reason").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Draft {
    Drafted { body: String },
    NoDraft { reason: String },
}

impl Draft {
    pub fn is_drafted(&self) -> bool {
        matches!(self, Draft::Drafted { .. })
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Draft::Drafted { body } => Some(body),
            Draft::NoDraft { .. } => None,
        }
    }
}

/// The fixed schema an LLM response must match (§4.4, §6).
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResult {
    pub intent: String,
    pub ticket_type_id: Option<String>,
    pub confidence: f64,
    pub requires_escalation: bool,
    pub customer_draft: Draft,
    pub supplier_draft: Draft,
    pub state_json: serde_json::Value,
    pub summary: String,
}

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),
    #[error("LLM response did not match the expected schema: {0}")]
    SchemaViolation(String),
}

/// Single-operation LLM contract (§4.4). Provider-specific prompt
/// formatting is out of scope; `ContextBuilder` is responsible for
/// producing `system_prompt`/`user_prompt` content.
#[async_trait]
#[auto_impl(Box, Arc)]
pub trait LLMClient: Send + Sync + Debug {
    async fn analyze(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<AnalysisResult, LLMError>;
}
