pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod material;
pub mod processing;
pub mod sanitize;
pub mod scheduler;
pub mod secrets;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::{load_config, CurriculaConfig};
pub use content::{normalize, validate, ValidationOutcome, ValidationPolicy};
pub use db::Database;
pub use error::{ConfigError, CurriculaError, ExtractionError, Result};
pub use extractor::{Extractor, ExtractorRegistry, LazyConverter};
pub use gateway::{
    GenerationConfig, GenerationGateway, GenerationResponse, GenerationService,
    HttpGenerationGateway,
};
pub use material::{CurriculumMaterial, MaterialStatus, NewMaterial, ProcessingStatus};
pub use processing::{ErrorKind, ProcessedText, ProcessingError, ProcessingOrchestrator};
pub use scheduler::{BatchScheduler, SchedulerError, SweepSummary};
pub use secrets::{resolve_secret, SecretError};
pub use store::{register_upload, MaterialStore, SqliteMaterialStore};
