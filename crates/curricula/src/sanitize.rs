//! Helpers for sanitizing data before it enters log lines and span attributes.
//!
//! Upload paths embed teacher and school directories, so spans only ever
//! carry the file name. Response bodies from the generation service are
//! truncated before they are logged.

use std::path::Path;

/// Maximum length for error bodies written to logs.
pub const MAX_LOGGED_BODY_LENGTH: usize = 200;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Truncates `body` to [`MAX_LOGGED_BODY_LENGTH`] characters, marking the cut.
pub fn truncate_for_log(body: &str) -> String {
    match body.char_indices().nth(MAX_LOGGED_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... (truncated)", &body[..cut]),
        None => body.to_string(),
    }
}
