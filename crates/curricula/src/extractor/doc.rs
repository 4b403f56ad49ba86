use std::path::Path;
use std::sync::Arc;

use crate::error::ExtractionError;
use crate::extractor::converter::LazyConverter;
use crate::extractor::Extractor;
use crate::sanitize;

/// Shortest run of printable characters kept by the byte-level fallback.
const MIN_PRINTABLE_RUN: usize = 4;

/// Legacy `.doc` extraction.
///
/// Many files carrying a `.doc` name are really OOXML packages, so the rich
/// converter is tried first. Genuine binary documents fall back to a raw
/// byte decode that keeps printable runs and drops everything else. The
/// fallback only fails when the file cannot be read.
pub struct LegacyDocExtractor {
    converter: Arc<LazyConverter>,
}

impl LegacyDocExtractor {
    pub fn new(converter: Arc<LazyConverter>) -> Self {
        Self { converter }
    }
}

impl Extractor for LegacyDocExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let _span =
            tracing::info_span!("extractor.doc", file = %sanitize::redact_path(path)).entered();

        match self.converter.get().convert_path(path) {
            Ok(text) => Ok(text),
            Err(err @ ExtractionError::ReadDocument { .. }) => Err(err),
            Err(e) => {
                log::warn!(
                    "Rich conversion failed for {} ({}), falling back to raw decode",
                    sanitize::redact_path(path),
                    e
                );
                let bytes = std::fs::read(path).map_err(|e| ExtractionError::ReadDocument {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                Ok(decode_printable_runs(&bytes))
            }
        }
    }
}

/// Best-effort byte-to-text decode: printable runs separated by spaces.
fn decode_printable_runs(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let mut output = String::new();
    let mut run = String::new();

    for c in decoded.chars() {
        let printable =
            c != char::REPLACEMENT_CHARACTER && (!c.is_control() || c == '\n' || c == '\t');
        if printable {
            run.push(c);
        } else {
            flush_run(&mut run, &mut output);
        }
    }
    flush_run(&mut run, &mut output);

    output
}

fn flush_run(run: &mut String, output: &mut String) {
    let trimmed = run.trim();
    if trimmed.chars().count() >= MIN_PRINTABLE_RUN {
        if !output.is_empty() {
            output.push(' ');
        }
        output.push_str(trimmed);
    }
    run.clear();
}
