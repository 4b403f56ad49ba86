//! Shared test utilities for curricula integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs against a temp upload root and database
//! - Fixture builders producing real PDF, DOCX and legacy DOC bytes

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
