//! Hugging Face hosted inference provider.
//!
//! Talks to a text-generation endpoint that accepts
//! `{"inputs": ..., "parameters": {...}}` and answers with
//! `[{"generated_text": ...}]`. Instruct models served this way echo the
//! prompt at the start of `generated_text`; the echo is stripped here.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::llm::provider::InferenceProvider;

/// Client for a hosted text-generation endpoint.
pub struct HuggingFaceProvider {
    client: Client,
    config: InferenceConfig,
}

impl HuggingFaceProvider {
    /// Create a new provider. The per-request timeout comes from the config.
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::RequestFailed {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout {
                timeout: self.config.timeout,
            }
        } else {
            InferenceError::RequestFailed {
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl InferenceProvider for HuggingFaceProvider {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String, InferenceError> {
        let request = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_new_tokens,
                temperature: self.config.temperature,
                top_p: self.config.top_p,
            },
        };

        tracing::debug!(
            endpoint = %self.config.endpoint,
            prompt_chars = prompt.chars().count(),
            max_new_tokens,
            "Sending generation request"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_token.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Generation request failed: {}", e);
                self.map_transport_error(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "Generation endpoint returned an error");
            return Err(InferenceError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let generated = parse_generated_text(&body)?;
        let text = strip_prompt_echo(&generated, prompt);
        if text.is_empty() {
            return Err(InferenceError::EmptyResponse);
        }

        tracing::debug!(response_chars = text.chars().count(), "Generation complete");
        Ok(text)
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

/// Pull `generated_text` out of the first element of the response array.
///
/// A first element without `generated_text` counts as an empty generation.
fn parse_generated_text(body: &str) -> Result<String, InferenceError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| InferenceError::MalformedResponse {
            reason: format!("JSON parse error: {}", e),
        })?;

    let first = value
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| InferenceError::MalformedResponse {
            reason: "expected a non-empty JSON array".to_string(),
        })?;

    let object = first
        .as_object()
        .ok_or_else(|| InferenceError::MalformedResponse {
            reason: "array element is not an object".to_string(),
        })?;

    match object.get("generated_text") {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(InferenceError::MalformedResponse {
            reason: "generated_text is not a string".to_string(),
        }),
    }
}

/// Trim the completion and drop a leading copy of the prompt.
pub fn strip_prompt_echo(generated: &str, prompt: &str) -> String {
    let trimmed = generated.trim();
    match trimmed.strip_prefix(prompt) {
        Some(rest) => rest.trim().to_string(),
        None => trimmed.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use secrecy::SecretString;

    use super::*;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/generate", addr)
    }

    fn provider(endpoint: String) -> HuggingFaceProvider {
        let config = InferenceConfig::new(SecretString::from("hf_test_token"))
            .with_endpoint(endpoint)
            .with_timeout(Duration::from_millis(500));
        HuggingFaceProvider::new(config).unwrap()
    }

    #[test]
    fn test_strip_prompt_echo() {
        let prompt = "Summarize:\nTitle: X\nSummary:";
        let raw = format!("{}  A concise summary. ", prompt);
        let stripped = strip_prompt_echo(&raw, prompt);
        assert_eq!(stripped, "A concise summary.");
        assert!(!stripped.starts_with(prompt));
    }

    #[test]
    fn test_strip_prompt_echo_leaves_other_text() {
        assert_eq!(strip_prompt_echo("  plain answer \n", "prompt"), "plain answer");
        assert_eq!(strip_prompt_echo("prompt", "prompt"), "");
    }

    #[test]
    fn test_parse_generated_text() {
        assert_eq!(
            parse_generated_text(r#"[{"generated_text":"hello"}]"#).unwrap(),
            "hello"
        );
        assert_eq!(parse_generated_text(r#"[{"other":1}]"#).unwrap(), "");
        assert!(matches!(
            parse_generated_text(r#"[]"#),
            Err(InferenceError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_generated_text(r#"{"generated_text":"x"}"#),
            Err(InferenceError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_generated_text("not json"),
            Err(InferenceError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_generated_text(r#"[{"generated_text":5}]"#),
            Err(InferenceError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_sends_bearer_token_and_parameters() {
        let router = Router::new().route(
            "/generate",
            post(|headers: HeaderMap, body: axum::Json<serde_json::Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let params = &body.0["parameters"];
                let reply = format!(
                    "{} auth={} max={} temp={} top_p={}",
                    body.0["inputs"].as_str().unwrap_or_default(),
                    auth,
                    params["max_new_tokens"],
                    params["temperature"],
                    params["top_p"],
                );
                axum::Json(serde_json::json!([{ "generated_text": reply }]))
            }),
        );
        let provider = provider(spawn_stub(router).await);

        let text = provider.generate("Prompt:", 300).await.unwrap();
        assert!(!text.starts_with("Prompt:"));
        assert!(text.contains("auth=Bearer hf_test_token"));
        assert!(text.contains("max=300"));
        assert!(text.contains("temp=0.7"));
        assert!(text.contains("top_p=0.95"));
    }

    #[tokio::test]
    async fn test_non_200_is_http_status_error() {
        let router = Router::new().route(
            "/generate",
            post(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "loading") }),
        );
        let provider = provider(spawn_stub(router).await);

        let err = provider.generate("Prompt:", 10).await.unwrap_err();
        assert_eq!(err, InferenceError::HttpStatus { status: 503 });
    }

    #[tokio::test]
    async fn test_empty_generation() {
        let router = Router::new().route(
            "/generate",
            post(|| async { axum::Json(serde_json::json!([{ "generated_text": "Prompt:   " }])) }),
        );
        let provider = provider(spawn_stub(router).await);

        let err = provider.generate("Prompt:", 10).await.unwrap_err();
        assert_eq!(err, InferenceError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_timeout() {
        let router = Router::new().route(
            "/generate",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                axum::Json(serde_json::json!([{ "generated_text": "late" }]))
            }),
        );
        let provider = provider(spawn_stub(router).await);

        let err = provider.generate("Prompt:", 10).await.unwrap_err();
        assert!(matches!(err, InferenceError::Timeout { .. }));
        assert!(err.to_string().contains("Error"));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let provider = provider(format!("http://{}/generate", addr));

        let err = provider.generate("Prompt:", 10).await.unwrap_err();
        assert!(matches!(
            err,
            InferenceError::RequestFailed { .. } | InferenceError::Timeout { .. }
        ));
    }
}
