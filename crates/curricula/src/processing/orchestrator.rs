use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info_span;

use crate::content::{normalize, ValidationPolicy};
use crate::extractor::ExtractorRegistry;
use crate::material::{CurriculumMaterial, MaterialStatus, ProcessingStatus};
use crate::sanitize;
use crate::store::MaterialStore;

use super::error::{failure_message, ProcessingError};
use super::progress::{NoopProgress, ProcessingPhase, ProgressEvent, ProgressReporter};

/// How long a `processing` claim may go without finishing before a manual
/// re-trigger is allowed to take it over.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30 * 60);

/// Normalized, validated text of a completed material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedText {
    pub text: String,
    pub word_count: usize,
}

/// Result of a manual re-trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprocessReport {
    pub material_id: String,
    /// Length of the stored text in characters.
    pub extracted_text_length: usize,
    pub word_count: usize,
    pub processing_time_ms: u64,
}

/// Drives a single material through extraction, normalization and validation.
pub struct ProcessingOrchestrator {
    store: Arc<dyn MaterialStore>,
    registry: Arc<ExtractorRegistry>,
    policy: ValidationPolicy,
    progress: Arc<dyn ProgressReporter>,
    stale_after: Duration,
}

impl ProcessingOrchestrator {
    pub fn new(
        store: Arc<dyn MaterialStore>,
        registry: Arc<ExtractorRegistry>,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            store,
            registry,
            policy,
            progress: Arc::new(NoopProgress),
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn store(&self) -> &Arc<dyn MaterialStore> {
        &self.store
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Processes a `pending` material, or returns the stored text of a
    /// `completed` one without touching it.
    pub fn process(&self, material_id: &str) -> Result<ProcessedText, ProcessingError> {
        let material = self.load(material_id)?;

        if let Some(text) = material.completed_text() {
            log::debug!("Material {} already completed", material_id);
            return Ok(ProcessedText {
                text: text.to_string(),
                word_count: crate::content::word_count(text),
            });
        }

        match material.processing_status {
            ProcessingStatus::Pending => {}
            ProcessingStatus::Processing => {
                return Err(ProcessingError::AlreadyClaimed(material_id.to_string()));
            }
            status => {
                return Err(ProcessingError::NotClaimable {
                    id: material_id.to_string(),
                    status,
                });
            }
        }

        let claimed = self
            .store
            .claim(material_id, Utc::now())
            .map_err(|e| ProcessingError::persistence(material_id, e))?;
        if !claimed {
            log::info!("Material {} was claimed by another worker", material_id);
            return Err(ProcessingError::AlreadyClaimed(material_id.to_string()));
        }

        self.run_claimed(&material)
    }

    /// Manual re-trigger: re-extracts a `pending`, `failed` or `completed`
    /// material. A `processing` material is only taken over once its claim
    /// is older than the stale threshold, which recovers records left behind
    /// by a worker that died mid-extraction.
    pub fn reprocess(&self, material_id: &str) -> Result<ReprocessReport, ProcessingError> {
        let started = Instant::now();
        let material = self.load(material_id)?;

        let now = Utc::now();
        let claimed = self
            .store
            .claim_for_reprocess(material_id, now, self.stale_before(now))
            .map_err(|e| ProcessingError::persistence(material_id, e))?;
        if !claimed {
            return Err(ProcessingError::AlreadyClaimed(material_id.to_string()));
        }

        if material.processing_status == ProcessingStatus::Processing {
            log::warn!(
                "Taking over stale claim on material {} (started {:?})",
                material_id,
                material.processing_started_at
            );
        } else {
            log::info!(
                "Manual reprocess of material {} (was {})",
                material_id,
                material.processing_status
            );
        }
        let processed = self.run_claimed(&material)?;

        Ok(ReprocessReport {
            material_id: material_id.to_string(),
            extracted_text_length: processed.text.chars().count(),
            word_count: processed.word_count,
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    pub fn status(&self, material_id: &str) -> Result<MaterialStatus, ProcessingError> {
        Ok(self.load(material_id)?.status_view())
    }

    fn stale_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.stale_after)
            .ok()
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn load(&self, material_id: &str) -> Result<CurriculumMaterial, ProcessingError> {
        self.store
            .find(material_id)
            .map_err(|e| ProcessingError::persistence(material_id, e))?
            .filter(|m| !m.is_deleted())
            .ok_or_else(|| ProcessingError::NotFound(material_id.to_string()))
    }

    /// Runs the steps for a material this caller has already claimed.
    fn run_claimed(&self, material: &CurriculumMaterial) -> Result<ProcessedText, ProcessingError> {
        let id = material.id.as_str();
        let filename = sanitize::redact_path(Path::new(&material.storage_path));
        let _span = info_span!("process_material",
            material_id = %id,
            filename = %filename,
            file_type = %material.file_type,
        )
        .entered();

        self.progress.report(
            id,
            ProgressEvent::Phase {
                phase: ProcessingPhase::Claimed,
                message: "Claimed for processing".to_string(),
            },
        );

        let raw = {
            let _step = info_span!("extract").entered();
            self.progress.report(
                id,
                ProgressEvent::Phase {
                    phase: ProcessingPhase::Extracting,
                    message: format!("Extracting text from {}", material.file_type),
                },
            );
            match self
                .registry
                .extract(Path::new(&material.storage_path), &material.file_type)
            {
                Ok(raw) => raw,
                Err(e) => {
                    let message = failure_message(&e);
                    log::warn!("Extraction failed for material {}: {}", id, e);
                    self.record_failure(id, &message);
                    return Err(ProcessingError::Extraction(e));
                }
            }
        };

        let (clean, outcome) = {
            let _step = info_span!("validate").entered();
            self.progress.report(
                id,
                ProgressEvent::Phase {
                    phase: ProcessingPhase::Validating,
                    message: "Validating content".to_string(),
                },
            );
            let clean = normalize(&raw);
            let outcome = self.policy.validate(&clean);
            (clean, outcome)
        };

        if !outcome.is_valid {
            let reason = outcome.reason.unwrap_or_default();
            log::info!("Material {} rejected: {}", id, reason);
            self.record_failure(id, &reason);
            return Err(ProcessingError::Validation(reason));
        }

        let _step = info_span!("persist").entered();
        if let Err(e) = self.store.mark_completed(id, &clean, Utc::now()) {
            log::error!("Failed to store extracted text for material {}: {}", id, e);
            self.record_failure(id, &failure_message(&e));
            return Err(ProcessingError::persistence(id, e));
        }

        log::info!(
            "Material {} completed ({} words, {} chars)",
            id,
            outcome.word_count,
            clean.chars().count()
        );
        self.progress.report(
            id,
            ProgressEvent::Completed {
                word_count: outcome.word_count,
            },
        );

        Ok(ProcessedText {
            text: clean,
            word_count: outcome.word_count,
        })
    }

    /// Best-effort `failed` marking. A write failure here is only logged.
    fn record_failure(&self, id: &str, message: &str) {
        if let Err(e) = self.store.mark_failed(id, message, Utc::now()) {
            log::error!("Failed to record failure for material {}: {}", id, e);
        }
        self.progress.report(
            id,
            ProgressEvent::Failed {
                error: message.to_string(),
            },
        );
    }
}
