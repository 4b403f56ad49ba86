use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CurriculaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Processing error: {0}")]
    Processing(#[from] crate::processing::ProcessingError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] crate::scheduler::SchedulerError),

    #[error("Generation error: {0}")]
    Generation(#[from] crate::gateway::GenerationError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Generation API key unavailable: {0}")]
    Secret(#[from] crate::secrets::SecretError),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    Pdf(String),

    #[error("Failed to process PDF page {page}: {reason}")]
    PdfPage { page: u32, reason: String },

    #[error("Failed to process DOCX: {0}")]
    Docx(String),
}

pub type Result<T> = std::result::Result<T, CurriculaError>;
