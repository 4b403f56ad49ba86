use std::path::Path;

use crate::error::ExtractionError;
use crate::extractor::Extractor;
use crate::sanitize;

/// Page-by-page PDF text extraction.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let _span =
            tracing::info_span!("extractor.pdf", file = %sanitize::redact_path(path)).entered();

        let doc = lopdf::Document::load(path)
            .map_err(|e| ExtractionError::Pdf(format!("Failed to load PDF: {}", e)))?;

        // get_pages() is keyed by page number, so iteration is in page order.
        let pages = doc.get_pages();
        let mut text = String::new();

        for (index, (page_number, page_id)) in pages.iter().enumerate() {
            let page_error = |e: lopdf::Error| ExtractionError::PdfPage {
                page: *page_number,
                reason: e.to_string(),
            };

            // extract_text() drops streams it cannot decode, so check them first.
            check_page_content(&doc, *page_id).map_err(page_error)?;
            let raw = doc.extract_text(&[*page_number]).map_err(page_error)?;

            if index > 0 {
                text.push('\n');
            }
            text.push_str(&join_fragments(&raw));
        }

        tracing::debug!(pages = pages.len(), chars = text.len(), "PDF text extracted");

        Ok(text)
    }
}

/// Decodes every content stream of a page, failing on the first stream that
/// is missing, cannot be decompressed or does not parse as operators.
fn check_page_content(doc: &lopdf::Document, page_id: lopdf::ObjectId) -> lopdf::Result<()> {
    for content_id in doc.get_page_contents(page_id) {
        let stream = doc.get_object(content_id).and_then(lopdf::Object::as_stream)?;
        let data = stream.get_plain_content()?;
        lopdf::content::Content::decode(&data)?;
    }
    Ok(())
}

/// Joins the text fragments of one page with single spaces.
fn join_fragments(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
