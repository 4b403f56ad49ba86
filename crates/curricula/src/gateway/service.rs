use std::sync::Arc;

use chrono::Utc;
use tracing::Instrument;

use super::error::GenerationError;
use super::types::{
    build_curriculum_text, DirectTextRequest, GenerationConfig, GenerationResponse,
    MaterialGenerationRequest, TopicGenerationRequest,
};
use super::GenerationGateway;
use crate::content::{normalize, ValidationPolicy};
use crate::store::MaterialStore;

/// Guards what reaches the gateway and records usage afterwards.
pub struct GenerationService {
    store: Arc<dyn MaterialStore>,
    gateway: Arc<dyn GenerationGateway>,
    policy: ValidationPolicy,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn MaterialStore>,
        gateway: Arc<dyn GenerationGateway>,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            store,
            gateway,
            policy,
        }
    }

    /// Generates an assignment from a `completed` material.
    ///
    /// The stored text is re-normalized and re-validated before it is sent.
    /// On success usage is bumped and returned insights are persisted; a
    /// failure to record usage is logged and does not fail the call.
    pub async fn generate_from_material(
        &self,
        material_id: &str,
        config: GenerationConfig,
    ) -> Result<GenerationResponse, GenerationError> {
        check_num_questions(config.num_questions)?;

        let material = self
            .store
            .find(material_id)?
            .filter(|m| !m.is_deleted())
            .ok_or_else(|| GenerationError::MaterialNotFound(material_id.to_string()))?;

        if material.is_expired(Utc::now()) {
            return Err(GenerationError::MaterialExpired(material_id.to_string()));
        }

        let Some(stored) = material.completed_text() else {
            return Err(GenerationError::MaterialNotReady {
                id: material_id.to_string(),
                status: material.processing_status,
            });
        };
        let curriculum_text = self.validated(stored)?;

        let request = MaterialGenerationRequest {
            material_id: material.id.clone(),
            title: material.title.clone(),
            curriculum_text,
            config,
        };

        let span = tracing::info_span!("generate", material_id = %material_id);
        let response = self
            .gateway
            .generate_from_material(&request)
            .instrument(span)
            .await?;

        let insights = response.material_insights.clone().unwrap_or_default();
        if let Err(e) = self.store.record_generation(material_id, &insights, Utc::now()) {
            log::warn!("Failed to record usage for material {}: {}", material_id, e);
        }

        log::info!(
            "Generated assignment {} with {} questions from material {}",
            response.assignment.id,
            response.questions.len(),
            material_id
        );
        Ok(response)
    }

    /// Generates an assignment from a concept list and learning objectives,
    /// without any stored material.
    pub async fn generate_from_topics(
        &self,
        request: TopicGenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        check_num_questions(request.num_questions)?;
        if request.concepts.iter().all(|c| c.trim().is_empty()) {
            return Err(GenerationError::InvalidRequest(
                "At least one concept is required".to_string(),
            ));
        }

        let raw = build_curriculum_text(&request.concepts, &request.learning_objectives);
        let curriculum_text = self.validated(&raw)?;

        let direct = DirectTextRequest {
            class_id: request.class_id,
            curriculum_text,
            assignment_type: request.assignment_type,
            num_questions: request.num_questions,
            difficulty: request.difficulty,
            question_types: request.question_types,
        };

        let span = tracing::info_span!("generate", class_id = %direct.class_id);
        let response = self
            .gateway
            .generate_from_text(&direct)
            .instrument(span)
            .await?;
        Ok(response)
    }

    fn validated(&self, text: &str) -> Result<String, GenerationError> {
        let clean = normalize(text);
        let outcome = self.policy.validate(&clean);
        if !outcome.is_valid {
            return Err(GenerationError::InvalidContent(
                outcome.reason.unwrap_or_default(),
            ));
        }
        Ok(clean)
    }
}

fn check_num_questions(num_questions: u32) -> Result<(), GenerationError> {
    if num_questions == 0 {
        return Err(GenerationError::InvalidRequest(
            "numQuestions must be at least 1".to_string(),
        ));
    }
    Ok(())
}
