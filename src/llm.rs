use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::error::{AppError, Result as AppResult};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    #[error("Invalid API credential: {0}")]
    InvalidCredential(String),

    #[error("Completion request failed: {0}")]
    Request(String),
}

/// A single system + user prompt sent to a completion backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

/// OpenAI-compatible chat-completions backend.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build completion client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CompletionError::InvalidCredential(format!("backend responded with {}", status)));
        }
        if !status.is_success() {
            return Err(CompletionError::Request(format!("backend responded with {}", status)));
        }

        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| CompletionError::Request("Invalid response format from backend".to_string()))?
            .trim()
            .to_string();

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "You are an SEO expert.".into(),
            user: "Fix the title".into(),
            max_output_tokens: 150,
            temperature: 0.3,
        }
    }

    #[tokio::test]
    async fn sends_chat_request_and_reads_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 150,
                "messages": [
                    {"role": "system", "content": "You are an SEO expert."},
                    {"role": "user", "content": "Fix the title"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Put the keyphrase first.  "}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new("sk-test", "gpt-4o-mini", format!("{}/v1/", server.uri())).unwrap();
        let reply = provider.complete(&request()).await.unwrap();
        assert_eq!(reply, "Put the keyphrase first.");
    }

    #[tokio::test]
    async fn unauthorized_is_a_credential_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new("sk-bad", "gpt-4o-mini", server.uri()).unwrap();
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn server_errors_and_bad_payloads_are_request_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let provider = OpenAiProvider::new("sk-test", "gpt-4o-mini", server.uri()).unwrap();
        assert!(matches!(
            provider.complete(&request()).await.unwrap_err(),
            CompletionError::Request(_)
        ));

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;
        let provider = OpenAiProvider::new("sk-test", "gpt-4o-mini", server.uri()).unwrap();
        assert!(matches!(
            provider.complete(&request()).await.unwrap_err(),
            CompletionError::Request(_)
        ));
    }
}
