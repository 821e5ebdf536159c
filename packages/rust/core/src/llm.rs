//! Language model abstraction and the OpenAI-compatible client behind it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use billscope_shared::{BillscopeError, LlmConfig, Result};

/// A chat model that can answer with free text or with a JSON object.
///
/// Constructed once per process and shared as `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier recorded on every enriched bill.
    fn model_id(&self) -> &str;

    /// Free-text completion.
    async fn chat(&self, prompt: &str) -> Result<String>;

    /// Structured completion. The reply must be a JSON object.
    async fn json(&self, prompt: &str) -> Result<Value>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// OpenAiCompatibleClient
// ---------------------------------------------------------------------------

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiCompatibleClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| BillscopeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    #[instrument(skip_all, fields(model = %self.model, json = json_mode))]
    async fn complete(&self, prompt: &str, json_mode: bool) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        debug!(prompt_chars = prompt.len(), "sending completion request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BillscopeError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            error!(%url, status = status.as_u16(), "completion request failed");
            return Err(BillscopeError::Http {
                url,
                status: status.as_u16(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BillscopeError::Enrichment(format!("invalid completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| BillscopeError::Enrichment("completion had no content".into()))
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        self.complete(prompt, false).await
    }

    async fn json(&self, prompt: &str) -> Result<Value> {
        let text = self.complete(prompt, true).await?;
        parse_json_object(&text)
    }
}

/// Parse a model reply as a JSON object, tolerating a surrounding code fence.
pub(crate) fn parse_json_object(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let value: Value = serde_json::from_str(unfenced)
        .map_err(|e| BillscopeError::Enrichment(format!("model reply is not JSON: {e}")))?;
    if !value.is_object() {
        return Err(BillscopeError::Enrichment(
            "model reply is not a JSON object".into(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiCompatibleClient {
        let config = LlmConfig {
            base_url: format!("{}/v1", server.uri()),
            ..LlmConfig::default()
        };
        OpenAiCompatibleClient::new(&config, "sk-test", "gpt-test").unwrap()
    }

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }

    #[tokio::test]
    async fn chat_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-test"})))
            .respond_with(reply("  A short summary.\n"))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).chat("Summarize").await.unwrap();
        assert_eq!(text, "A short summary.");
    }

    #[tokio::test]
    async fn json_requests_object_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "response_format": {"type": "json_object"}
            })))
            .respond_with(reply(r#"{"issues": ["vague"]}"#))
            .mount(&server)
            .await;

        let value = client(&server).json("Audit").await.unwrap();
        assert_eq!(value["issues"][0], "vague");
    }

    #[tokio::test]
    async fn http_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server).chat("x").await.unwrap_err();
        assert!(matches!(err, BillscopeError::Http { status: 429, .. }));
    }

    #[test]
    fn parse_json_object_variants() {
        assert!(parse_json_object(r#"{"a":1}"#).is_ok());
        assert!(parse_json_object("```json\n{\"a\":1}\n```").is_ok());
        assert!(parse_json_object("[1,2]").is_err());
        assert!(parse_json_object("not json").is_err());
    }
}
