//! Completion backend client
//!
//! Generation happens out of process: the shell renders the prompt and
//! sends it to an OpenAI-style `/v1/completions` endpoint of the serving
//! process. The trait exists so the shell can be tested against a mock.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from the completion backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// One completion request: a fully rendered prompt plus sampling knobs
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub repetition_penalty: f32,
    pub max_new_tokens: u32,
    pub stop: Option<String>,
}

/// The completed text for one request
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
}

/// A backend that completes rendered prompts
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send one completion request (blocking until complete)
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, BackendError>;
}

/// HTTP client for an OpenAI-style completions endpoint
pub struct HttpBackend {
    endpoint: String,
    http: Client,
}

impl HttpBackend {
    /// Create a client for the given endpoint
    pub fn new(endpoint: &str, timeout_ms: u64) -> Result<Self, BackendError> {
        debug!(%endpoint, timeout_ms, "HttpBackend::new: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(BackendError::Network)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn build_request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "prompt": request.prompt,
            "temperature": request.temperature,
            "repetition_penalty": request.repetition_penalty,
            "max_tokens": request.max_new_tokens,
        });
        if let Some(stop) = &request.stop {
            body["stop"] = serde_json::json!(stop);
        }
        body
    }
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, BackendError> {
        debug!(model = %request.model, prompt_len = request.prompt.len(), "generate: called");
        let url = format!("{}/v1/completions", self.endpoint);
        let body = self.build_request_body(request);

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(%status, "generate: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, message: text });
        }

        let api_response: CompletionsResponse = response.json().await?;
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse("No choices in response".to_string()))?;

        debug!(text_len = choice.text.len(), "generate: success");
        Ok(GenerationResponse { text: choice.text })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    choices: Vec<CompletionsChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionsChoice {
    text: String,
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend for unit tests; records every prompt it sees
    pub struct MockBackend {
        replies: Vec<String>,
        calls: Mutex<Vec<GenerationRequest>>,
    }

    impl MockBackend {
        pub fn new(replies: Vec<String>) -> Self {
            Self {
                replies,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<GenerationRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for MockBackend {
        async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, BackendError> {
            let mut calls = self.calls.lock().unwrap();
            let idx = calls.len();
            calls.push(request.clone());
            self.replies
                .get(idx)
                .cloned()
                .map(|text| GenerationResponse { text })
                .ok_or_else(|| BackendError::InvalidResponse("No more mock replies".to_string()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_backend_returns_replies_in_order() {
            let backend = MockBackend::new(vec!["one".to_string(), "two".to_string()]);
            let request = GenerationRequest {
                model: "m".to_string(),
                prompt: "p".to_string(),
                temperature: 0.7,
                repetition_penalty: 1.0,
                max_new_tokens: 16,
                stop: None,
            };

            assert_eq!(backend.generate(&request).await.unwrap().text, "one");
            assert_eq!(backend.generate(&request).await.unwrap().text, "two");
            assert!(backend.generate(&request).await.is_err());
            assert_eq!(backend.requests().len(), 3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_includes_stop_when_set() {
        let backend = HttpBackend::new("http://127.0.0.1:8000/", 1000).unwrap();
        let mut request = GenerationRequest {
            model: "vicuna".to_string(),
            prompt: "USER: hi ASSISTANT:".to_string(),
            temperature: 0.7,
            repetition_penalty: 1.0,
            max_new_tokens: 512,
            stop: Some("</s>".to_string()),
        };

        let body = backend.build_request_body(&request);
        assert_eq!(body["stop"], "</s>");
        assert_eq!(body["max_tokens"], 512);

        request.stop = None;
        let body = backend.build_request_body(&request);
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://localhost:9000///", 1000).unwrap();
        assert_eq!(backend.endpoint, "http://localhost:9000");
    }
}
