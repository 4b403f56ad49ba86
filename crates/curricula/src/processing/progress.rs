use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Phase of material processing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingPhase {
    Claimed,
    Extracting,
    Validating,
    Completed,
    Failed,
}

impl std::fmt::Display for ProcessingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingPhase::Claimed => write!(f, "Claimed"),
            ProcessingPhase::Extracting => write!(f, "Extracting text"),
            ProcessingPhase::Validating => write!(f, "Validating content"),
            ProcessingPhase::Completed => write!(f, "Completed"),
            ProcessingPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Events emitted by the orchestrator while processing one material.
/// Extracted text is never included (can be large).
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Phase {
        phase: ProcessingPhase,
        message: String,
    },
    Completed {
        word_count: usize,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, material_id: &str, event: ProgressEvent);
}

/// No-op reporter, the default.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _material_id: &str, _event: ProgressEvent) {}
}

/// Progress event as published to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialProgressEvent {
    pub material_id: String,
    pub phase: ProcessingPhase,
    /// Human-readable description of the current activity.
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Publishes progress on a tokio broadcast channel.
///
/// Sending with no live subscribers is not an error.
pub struct BroadcastProgress {
    sender: Arc<broadcast::Sender<MaterialProgressEvent>>,
}

impl BroadcastProgress {
    pub fn new(sender: Arc<broadcast::Sender<MaterialProgressEvent>>) -> Self {
        Self { sender }
    }

    /// Creates a reporter with its own channel of the given capacity.
    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<MaterialProgressEvent>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self::new(Arc::new(tx)), rx)
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, material_id: &str, event: ProgressEvent) {
        let (phase, message, word_count, error) = match event {
            ProgressEvent::Phase { phase, message } => (phase, message, None, None),
            ProgressEvent::Completed { word_count } => (
                ProcessingPhase::Completed,
                format!("Extracted {} words", word_count),
                Some(word_count),
                None,
            ),
            ProgressEvent::Failed { error } => (
                ProcessingPhase::Failed,
                "Processing failed".to_string(),
                None,
                Some(error),
            ),
        };

        let _ = self.sender.send(MaterialProgressEvent {
            material_id: material_id.to_string(),
            phase,
            message,
            timestamp: Utc::now(),
            word_count,
            error,
        });
    }
}
