use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_json::json;

use super::AnalysisResult;
use super::LLMClient;
use super::LLMError;

/// Retry schedule for transient failures before raising `LLMError::Unavailable`.
const BACKOFF_SCHEDULE_MS: [u64; 2] = [500, 1500];

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// `reqwest`-backed `LLMClient` against a generic chat-completion style
/// endpoint, shaped by `llm.{provider, model, temperature, max_tokens}`
/// (§4.4, §6). Any specific provider's request/response dialect is out of
/// scope; this implementation is the contract's one concrete realization.
#[derive(Debug)]
pub struct HttpLLMClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpLLMClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        model: String,
        temperature: f32,
        max_tokens: u32,
        timeout_ms: u64,
    ) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .expect("reqwest client builder never fails with these options");
        Self { http_client, base_url, api_key, model, temperature, max_tokens }
    }
}

#[async_trait]
impl LLMClient for HttpLLMClient {
    async fn analyze(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<AnalysisResult, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "response_format": { "type": "json_object" },
        });

        let mut last_err = None;
        for (attempt, delay_ms) in std::iter::once(0).chain(BACKOFF_SCHEDULE_MS).enumerate() {
            if attempt > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }

            let result = self
                .http_client
                .post(&url)
                .bearer_auth(self.api_key.expose_secret())
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_server_error() => {
                    last_err = Some(LLMError::Unavailable(format!(
                        "LLM provider returned {}",
                        response.status()
                    )));
                    continue;
                }
                Ok(response) if !response.status().is_success() => {
                    return Err(LLMError::Unavailable(format!(
                        "LLM provider returned {}",
                        response.status()
                    )));
                }
                Ok(response) => {
                    let parsed: ChatResponse = response
                        .json()
                        .await
                        .map_err(|e| LLMError::SchemaViolation(e.to_string()))?;
                    let content = parsed
                        .choices
                        .into_iter()
                        .next()
                        .ok_or_else(|| {
                            LLMError::SchemaViolation("empty choices array".to_string())
                        })?
                        .message
                        .content;
                    return serde_json::from_str(&content)
                        .map_err(|e| LLMError::SchemaViolation(e.to_string()));
                }
                Err(e) => {
                    last_err = Some(LLMError::Unavailable(e.to_string()));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| LLMError::Unavailable("exhausted retries".to_string())))
    }
}
