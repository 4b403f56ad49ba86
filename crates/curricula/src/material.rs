//! The curriculum material record and its processing state.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::extractor::normalize_type_tag;

/// Processing state of a material.
///
/// Moves `Pending -> Processing -> Completed | Failed`. Only a manual
/// re-trigger moves a `Failed` (or `Completed`) record back to `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub const ALL: [ProcessingStatus; 4] = [
        ProcessingStatus::Pending,
        ProcessingStatus::Processing,
        ProcessingStatus::Completed,
        ProcessingStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            other => Err(format!("unknown processing status '{}'", other)),
        }
    }
}

/// Metadata written back after a successful generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub outline: Option<String>,
    #[serde(default)]
    pub suggested_topics: Vec<String>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

impl GenerationMetadata {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.outline.is_none()
            && self.suggested_topics.is_empty()
            && self.learning_objectives.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurriculumMaterial {
    pub id: String,
    pub teacher_id: String,
    pub school_id: String,

    pub title: String,
    pub description: Option<String>,
    pub original_file_name: String,
    /// Lower-cased file-type tag, e.g. `pdf`.
    pub file_type: String,
    pub file_size: u64,
    /// Absolute, or relative to the upload root.
    pub storage_path: String,
    pub mime_type: Option<String>,

    pub processing_status: ProcessingStatus,
    pub extracted_text: Option<String>,
    pub text_extraction_error: Option<String>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,

    pub generation: GenerationMetadata,

    pub usage_count: u64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CurriculumMaterial {
    /// Stored text, if processing completed with non-empty content.
    pub fn completed_text(&self) -> Option<&str> {
        match (self.processing_status, self.extracted_text.as_deref()) {
            (ProcessingStatus::Completed, Some(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    pub fn status_view(&self) -> MaterialStatus {
        MaterialStatus {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.processing_status,
            has_extracted_text: self
                .extracted_text
                .as_deref()
                .is_some_and(|text| !text.is_empty()),
            error: self.text_extraction_error.clone(),
            processing_started_at: self.processing_started_at,
            processing_completed_at: self.processing_completed_at,
        }
    }
}

/// Status query response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialStatus {
    pub id: String,
    pub title: String,
    pub status: ProcessingStatus,
    pub has_extracted_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_completed_at: Option<DateTime<Utc>>,
}

/// An upload to be recorded as a new `pending` material.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMaterial {
    pub teacher_id: String,
    pub school_id: String,
    pub title: String,
    pub description: Option<String>,
    pub original_file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub storage_path: String,
    pub mime_type: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewMaterial {
    /// Describes an uploaded file already written to `path`.
    ///
    /// The file-type tag comes from the extension and the MIME type is
    /// guessed from the file name. No check is made that the tag is
    /// extractable: uploads of any type are recorded and unsupported ones
    /// fail later, during processing.
    pub fn from_upload(
        path: &Path,
        title: &str,
        teacher_id: &str,
        school_id: &str,
    ) -> Result<Self, ExtractionError> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExtractionError::NotFound(path.to_path_buf()),
            _ => ExtractionError::ReadDocument {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let original_file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let file_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map(normalize_type_tag)
            .unwrap_or_default();
        let mime_type = mime_guess::from_path(path).first().map(|m| m.to_string());

        Ok(Self {
            teacher_id: teacher_id.to_string(),
            school_id: school_id.to_string(),
            title: title.to_string(),
            description: None,
            original_file_name,
            file_type,
            file_size: metadata.len(),
            storage_path: path.display().to_string(),
            mime_type,
            expires_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(status: ProcessingStatus, text: Option<&str>) -> CurriculumMaterial {
        let now = Utc::now();
        CurriculumMaterial {
            id: "m-1".to_string(),
            teacher_id: "t-1".to_string(),
            school_id: "s-1".to_string(),
            title: "Fractions unit".to_string(),
            description: None,
            original_file_name: "fractions.pdf".to_string(),
            file_type: "pdf".to_string(),
            file_size: 1024,
            storage_path: "fractions.pdf".to_string(),
            mime_type: Some("application/pdf".to_string()),
            processing_status: status,
            extracted_text: text.map(str::to_string),
            text_extraction_error: None,
            processing_started_at: None,
            processing_completed_at: None,
            generation: GenerationMetadata::default(),
            usage_count: 0,
            last_used_at: None,
            expires_at: None,
            is_archived: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ProcessingStatus::ALL {
            assert_eq!(status.as_str().parse::<ProcessingStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ProcessingStatus>().is_err());
    }

    #[test]
    fn test_completed_text_requires_completed_status() {
        assert_eq!(
            sample(ProcessingStatus::Completed, Some("text")).completed_text(),
            Some("text")
        );
        assert_eq!(sample(ProcessingStatus::Completed, Some("")).completed_text(), None);
        assert_eq!(sample(ProcessingStatus::Failed, Some("text")).completed_text(), None);
    }

    #[test]
    fn test_status_view_serializes_camel_case() {
        let mut material = sample(ProcessingStatus::Failed, None);
        material.text_extraction_error = Some("Text too short".to_string());

        let json = serde_json::to_value(material.status_view()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["hasExtractedText"], false);
        assert_eq!(json["error"], "Text too short");
        assert!(json.get("processingStartedAt").is_none());
    }

    #[test]
    fn test_is_expired() {
        let mut material = sample(ProcessingStatus::Completed, Some("text"));
        let now = Utc::now();
        assert!(!material.is_expired(now));
        material.expires_at = Some(now - chrono::Duration::hours(1));
        assert!(material.is_expired(now));
    }

    #[test]
    fn test_new_material_from_upload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Cells.DOCX");
        std::fs::write(&path, b"0123456789").unwrap();

        let new = NewMaterial::from_upload(&path, "Cells", "t-1", "s-1").unwrap();
        assert_eq!(new.original_file_name, "Cells.DOCX");
        assert_eq!(new.file_type, "docx");
        assert_eq!(new.file_size, 10);
        assert!(new.mime_type.unwrap().contains("wordprocessingml"));
    }

    #[test]
    fn test_new_material_from_missing_upload() {
        let result = NewMaterial::from_upload(Path::new("/nonexistent/a.pdf"), "A", "t", "s");
        assert!(matches!(result, Err(ExtractionError::NotFound(_))));
    }
}
