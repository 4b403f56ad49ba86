use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::material::GenerationMetadata;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Mixed,
}

/// Assignment options for a material-based generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_question_types")]
    pub question_types: Vec<String>,
    #[serde(default = "default_assignment_type")]
    pub assignment_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

fn default_num_questions() -> u32 {
    10
}

fn default_question_types() -> Vec<String> {
    vec!["multiple_choice".to_string(), "short_answer".to_string()]
}

fn default_assignment_type() -> String {
    "quiz".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            num_questions: default_num_questions(),
            difficulty: Difficulty::default(),
            question_types: default_question_types(),
            assignment_type: default_assignment_type(),
            total_points: None,
            due_date: None,
            time_limit: None,
        }
    }
}

/// Payload sent for a material-based call. The text has already passed
/// normalization and validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialGenerationRequest {
    pub material_id: String,
    pub title: String,
    pub curriculum_text: String,
    #[serde(flatten)]
    pub config: GenerationConfig,
}

/// Topic-based request from a caller that has no uploaded material.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicGenerationRequest {
    pub class_id: String,
    pub concepts: Vec<String>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    #[serde(default = "default_assignment_type")]
    pub assignment_type: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_question_types")]
    pub question_types: Vec<String>,
}

/// Direct-text payload: bypasses material lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectTextRequest {
    pub class_id: String,
    pub curriculum_text: String,
    pub assignment_type: String,
    pub num_questions: u32,
    pub difficulty: Difficulty,
    pub question_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAssignment {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub total_points: u32,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub question_text: String,
    pub points: u32,
    pub question_order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub assignment: GeneratedAssignment,
    #[serde(default)]
    pub questions: Vec<GeneratedQuestion>,
    /// Summary, outline, topics and objectives derived from the material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_insights: Option<GenerationMetadata>,
}

/// Builds the text handed to the service for a topic-based request.
pub fn build_curriculum_text(concepts: &[String], learning_objectives: &[String]) -> String {
    let mut text = String::new();
    if !concepts.is_empty() {
        text.push_str("Key concepts:\n");
        for concept in concepts {
            text.push_str("- ");
            text.push_str(concept.trim());
            text.push('\n');
        }
    }
    if !learning_objectives.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str("Learning objectives:\n");
        for objective in learning_objectives {
            text.push_str("- ");
            text.push_str(objective.trim());
            text.push('\n');
        }
    }
    text
}
