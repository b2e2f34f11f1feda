//! Transcript summarization providers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{AiResult, ProviderError};
use crate::http;

/// Maximum completion length requested from chat providers.
pub const MAX_COMPLETION_TOKENS: u32 = 512;

/// Black-box text generator used for highlight selection.
#[async_trait]
pub trait SummarizationProvider: Send + Sync {
    /// Returns the provider's raw text answer.
    async fn summarize(&self, system: &str, instruction: &str, transcript: &str)
        -> AiResult<String>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsProvider {
    config: ProviderConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    n: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: std::borrow::Cow<'a, str>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatCompletionsProvider {
    pub fn new(config: ProviderConfig) -> AiResult<Self> {
        let client = http::build_client(&config)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl SummarizationProvider for ChatCompletionsProvider {
    async fn summarize(
        &self,
        system: &str,
        instruction: &str,
        transcript: &str,
    ) -> AiResult<String> {
        let body = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.into(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("{instruction}\n{transcript}").into(),
                },
            ],
            max_tokens: MAX_COMPLETION_TOKENS,
            n: 1,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(
            model = %self.config.chat_model,
            transcript_chars = transcript.len(),
            "Requesting chat completion"
        );

        let request = http::authorize(
            self.client
                .post(self.config.endpoint("/chat/completions"))
                .json(&body),
            &self.config,
        );
        let response: ChatResponse = http::send(request, &self.config).await?.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::invalid_response("No content in chat completion"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> ChatCompletionsProvider {
        ChatCompletionsProvider::new(ProviderConfig::default().with_base_url(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_sends_prompt_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "max_tokens": 512,
                "response_format": {"type": "json_object"},
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "pick sections\n[00:00:00 - 00:00:01.000] hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"sections\": []}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider(&server)
            .summarize("be brief", "pick sections", "[00:00:00 - 00:00:01.000] hi")
            .await
            .unwrap();
        assert_eq!(text, "{\"sections\": []}");
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let result = provider(&server).summarize("s", "i", "t").await;
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_throttling_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = provider(&server).summarize("s", "i", "t").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 429, .. }));
        assert!(err.is_retryable());
    }
}
