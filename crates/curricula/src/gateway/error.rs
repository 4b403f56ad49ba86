//! Generation gateway error types.

use thiserror::Error;

use crate::db::DatabaseError;
use crate::material::ProcessingStatus;

/// Transport-level failures talking to the generative service.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Generation request failed: {0}")]
    Request(String),

    /// Non-success response. `body` is truncated for logging.
    #[error("Generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid generation response: {0}")]
    Decode(String),
}

/// Failures of a generation call as seen by the caller.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Material not found: {0}")]
    MaterialNotFound(String),

    #[error("Material {id} has no usable text (status '{status}')")]
    MaterialNotReady {
        id: String,
        status: ProcessingStatus,
    },

    #[error("Material {0} has expired")]
    MaterialExpired(String),

    /// Text failed the minimum-content policy.
    #[error("Curriculum content rejected: {0}")]
    InvalidContent(String),

    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Database error: {0}")]
    Store(#[from] DatabaseError),
}
