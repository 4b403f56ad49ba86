//! JSON-over-HTTP client for the generative assessment service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::GatewayError;
use super::types::{DirectTextRequest, GenerationResponse, MaterialGenerationRequest};
use super::GenerationGateway;
use crate::sanitize;

const MATERIAL_PATH: &str = "assignments/generate-from-material";
const TEXT_PATH: &str = "assignments/generate-from-text";

/// Calls the generative service with a bearer API key.
///
/// No request timeout is set unless [`HttpGenerationGateway::with_timeout`]
/// is used; callers own deadline policy.
pub struct HttpGenerationGateway {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for HttpGenerationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGenerationGateway")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpGenerationGateway {
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, GatewayError> {
        Self::build(base_url, api_key, None)
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        Self::build(base_url, api_key, Some(timeout))
    }

    fn build(
        base_url: &str,
        api_key: SecretString,
        timeout: Option<Duration>,
    ) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, GatewayError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body = sanitize::truncate_for_log(&body);
            log::warn!("Generation service returned {}: {}", status, body);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GenerationGateway for HttpGenerationGateway {
    async fn generate_from_material(
        &self,
        request: &MaterialGenerationRequest,
    ) -> Result<GenerationResponse, GatewayError> {
        self.post_json(MATERIAL_PATH, request).await
    }

    async fn generate_from_text(
        &self,
        request: &DirectTextRequest,
    ) -> Result<GenerationResponse, GatewayError> {
        self.post_json(TEXT_PATH, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("sk-test-123".to_string())
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let gateway = HttpGenerationGateway::new("https://gen.example.com/api/", key()).unwrap();
        assert_eq!(
            gateway.endpoint(MATERIAL_PATH),
            "https://gen.example.com/api/assignments/generate-from-material"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let gateway = HttpGenerationGateway::new("https://gen.example.com", key()).unwrap();
        let debug = format!("{:?}", gateway);
        assert!(!debug.contains("sk-test-123"));
        assert!(debug.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_request_error() {
        // Port 9 (discard) on localhost is not expected to speak HTTP.
        let gateway = HttpGenerationGateway::with_timeout(
            "http://127.0.0.1:9",
            key(),
            Duration::from_secs(2),
        )
        .unwrap();
        let request = DirectTextRequest {
            class_id: "c-1".to_string(),
            curriculum_text: "text".to_string(),
            assignment_type: "quiz".to_string(),
            num_questions: 1,
            difficulty: Default::default(),
            question_types: Vec::new(),
        };
        let err = gateway.generate_from_text(&request).await.unwrap_err();
        assert!(matches!(err, GatewayError::Request(_)));
    }
}
