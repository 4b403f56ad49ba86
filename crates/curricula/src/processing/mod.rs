//! Per-material processing: claim, extract, normalize, validate, persist.

pub mod error;
pub mod orchestrator;
pub mod progress;

pub use error::{failure_message, ErrorKind, ProcessingError, FAILURE_PREFIX};
pub use orchestrator::{
    ProcessedText, ProcessingOrchestrator, ReprocessReport, DEFAULT_STALE_AFTER,
};
pub use progress::{
    BroadcastProgress, MaterialProgressEvent, NoopProgress, ProcessingPhase, ProgressEvent,
    ProgressReporter,
};
