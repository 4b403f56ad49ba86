use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::ExtractionError;
use crate::material::ProcessingStatus;

/// Prefix of every extraction or persistence failure stored on a material.
pub const FAILURE_PREFIX: &str = "Failed to process curriculum file";

/// Coarse classification of a [`ProcessingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Record or file missing.
    NotFound,
    /// No extraction strategy for the file-type tag.
    UnsupportedType,
    /// Conversion failed.
    Extraction,
    /// Content too short or too sparse.
    Validation,
    /// Status or text write failed.
    Persistence,
    /// Claim lost or record not claimable.
    Conflict,
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Material not found: {0}")]
    NotFound(String),

    #[error("Material {0} is already being processed")]
    AlreadyClaimed(String),

    #[error("Material {id} cannot be claimed from status '{status}'")]
    NotClaimable {
        id: String,
        status: ProcessingStatus,
    },

    #[error("Failed to process curriculum file: {0}")]
    Extraction(#[source] ExtractionError),

    #[error("{0}")]
    Validation(String),

    #[error("Failed to persist material {id}: {source}")]
    Persistence {
        id: String,
        #[source]
        source: DatabaseError,
    },
}

impl ProcessingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessingError::NotFound(_) => ErrorKind::NotFound,
            ProcessingError::AlreadyClaimed(_) | ProcessingError::NotClaimable { .. } => {
                ErrorKind::Conflict
            }
            ProcessingError::Extraction(ExtractionError::NotFound(_)) => ErrorKind::NotFound,
            ProcessingError::Extraction(ExtractionError::UnsupportedType(_)) => {
                ErrorKind::UnsupportedType
            }
            ProcessingError::Extraction(_) => ErrorKind::Extraction,
            ProcessingError::Validation(_) => ErrorKind::Validation,
            ProcessingError::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    pub(crate) fn persistence(id: &str, source: DatabaseError) -> Self {
        ProcessingError::Persistence {
            id: id.to_string(),
            source,
        }
    }
}

/// Message stored on a material whose processing failed for `cause`.
pub fn failure_message(cause: &dyn std::fmt::Display) -> String {
    format!("{}: {}", FAILURE_PREFIX, cause)
}
