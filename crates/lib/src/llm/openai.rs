//! OpenAI completions client (https://api.openai.com/v1 by default).

use crate::relay::Completer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Generation stops at the first newline so the reply is a single line.
const STOP_SEQUENCE: &str = "\n";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion api key not configured")]
    NotConfigured,
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion api error: {0}")]
    Api(String),
    #[error("completion returned no choices")]
    Empty,
}

/// Prompt for one user utterance.
pub fn build_prompt(user_text: &str) -> String {
    format!("User: {}\nBot:", user_text)
}

/// Client for the completions endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: u32,
    n: u32,
    stop: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

impl OpenAiClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        model: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            model: model.to_string(),
            max_tokens,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// POST /completions — single candidate, capped length, stop at newline. Returns the trimmed text.
    pub async fn complete(&self, user_text: &str) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::NotConfigured)?;
        let url = format!("{}/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            prompt: build_prompt(user_text),
            max_tokens: self.max_tokens,
            n: 1,
            stop: STOP_SEQUENCE,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CompletionError::Api(format!("{} {}", status, body)));
        }
        let data: CompletionResponse = res.json().await?;
        data.choices
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .ok_or(CompletionError::Empty)
    }
}

#[async_trait]
impl Completer for OpenAiClient {
    async fn complete(&self, user_text: &str) -> Result<String, CompletionError> {
        OpenAiClient::complete(self, user_text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> OpenAiClient {
        OpenAiClient::new(
            Some(format!("{}/v1/", uri)),
            Some("sk-test".to_string()),
            "gpt-3.5-turbo-instruct",
            256,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn prompt_format() {
        assert_eq!(build_prompt("island"), "User: island\nBot:");
        assert_eq!(build_prompt(""), "User: \nBot:");
        assert_eq!(build_prompt("a\nb"), "User: a\nb\nBot:");
    }

    #[tokio::test]
    async fn complete_sends_expected_request_and_trims() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(json!({
                "model": "gpt-3.5-turbo-instruct",
                "prompt": "User: island\nBot:",
                "max_tokens": 256,
                "n": 1,
                "stop": "\n"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cmpl-1",
                "object": "text_completion",
                "choices": [
                    { "text": "  Here is an island photo. ", "index": 0, "finish_reason": "stop" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server.uri()).complete("island").await.unwrap();
        assert_eq!(reply, "Here is an island photo.");
    }

    #[tokio::test]
    async fn empty_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client(&server.uri()).complete("island").await.unwrap_err();
        assert!(matches!(err, CompletionError::Empty));
    }

    #[tokio::test]
    async fn api_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).complete("island").await.unwrap_err();
        match err {
            CompletionError::Api(m) => assert!(m.starts_with("429") && m.contains("rate limited")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let c = OpenAiClient::new(None, None, "m", 16, Duration::from_secs(1));
        assert!(matches!(c.complete("x").await, Err(CompletionError::NotConfigured)));
    }
}
