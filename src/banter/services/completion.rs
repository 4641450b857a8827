use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Request accepted by the completion backend's chat endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Response returned by the completion backend
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub response: String,
    #[serde(default)]
    pub processing_time_ms: u64,
}

/// Error body the backend attaches to non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Health document from the backend's health endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("AI service error ({status}): {detail}")]
    Upstream { status: u16, detail: String },

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        CompletionError::Http(e.to_string())
    }
}

/// Collaborator that turns a prompt into a generated reply.
///
/// This trait is object-safe and is used as `Arc<dyn CompletionClient>`;
/// tests substitute a scripted implementation.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;
}

/// HTTP client for the stateless completion backend
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCompletionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("banter/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Probe the backend's health endpoint
    pub async fn health(&self) -> Result<HealthStatus, CompletionError> {
        let url = format!("{}/api/v1/health", self.base_url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                detail: "Health check failed".to_string(),
            });
        }

        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let url = format!("{}/api/v1/chat", self.base_url);
        debug!(message_len = request.message.len(), "Sending chat request");

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.detail)
                .unwrap_or_else(|_| status.to_string());

            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        let completion = response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        info!(
            processing_time_ms = completion.processing_time_ms,
            response_len = completion.response.len(),
            "Received completion"
        );

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_absent_system_prompt() {
        let request = CompletionRequest {
            message: "hello".to_string(),
            system_prompt: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "hello" }));
    }

    #[test]
    fn test_request_includes_system_prompt() {
        let request = CompletionRequest {
            message: "hello".to_string(),
            system_prompt: Some("be brief".to_string()),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system_prompt"], "be brief");
    }

    #[test]
    fn test_response_parses_backend_shape() {
        let parsed: CompletionResponse =
            serde_json::from_str(r#"{"response":"Hi!","processing_time_ms":42}"#).unwrap();

        assert_eq!(parsed.response, "Hi!");
        assert_eq!(parsed.processing_time_ms, 42);
    }

    #[test]
    fn test_response_tolerates_missing_timing() {
        let parsed: CompletionResponse = serde_json::from_str(r#"{"response":"Hi!"}"#).unwrap();

        assert_eq!(parsed.processing_time_ms, 0);
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = HttpCompletionClient::new("http://localhost:8000/", Duration::from_secs(5));

        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
