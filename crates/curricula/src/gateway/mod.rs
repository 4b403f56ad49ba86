//! Outbound contract to the generative assessment service.
//!
//! The gateway only ever receives text that passed normalization and the
//! minimum-content policy. It does not retry or rate-limit.

use async_trait::async_trait;

pub mod error;
pub mod http;
pub mod service;
pub mod types;

pub use error::{GatewayError, GenerationError};
pub use http::HttpGenerationGateway;
pub use service::GenerationService;
pub use types::{
    build_curriculum_text, Difficulty, DirectTextRequest, GeneratedAssignment, GeneratedQuestion,
    GenerationConfig, GenerationResponse, MaterialGenerationRequest, TopicGenerationRequest,
};

#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Generates an assignment from a completed material's text.
    async fn generate_from_material(
        &self,
        request: &MaterialGenerationRequest,
    ) -> Result<GenerationResponse, GatewayError>;

    /// Generates an assignment from caller-supplied curriculum text.
    async fn generate_from_text(
        &self,
        request: &DirectTextRequest,
    ) -> Result<GenerationResponse, GatewayError>;
}
