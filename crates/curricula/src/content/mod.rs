//! Text cleanup and minimum-content policy applied to extracted text.

pub mod normalizer;
pub mod validator;

pub use normalizer::normalize;
pub use validator::{validate, word_count, ValidationOutcome, ValidationPolicy};
