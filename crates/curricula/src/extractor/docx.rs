use std::path::Path;
use std::sync::Arc;

use crate::error::ExtractionError;
use crate::extractor::converter::LazyConverter;
use crate::extractor::Extractor;
use crate::sanitize;

/// Extracts text from Office Open XML word-processing documents.
pub struct DocxExtractor {
    converter: Arc<LazyConverter>,
}

impl DocxExtractor {
    pub fn new(converter: Arc<LazyConverter>) -> Self {
        Self { converter }
    }
}

impl Extractor for DocxExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let _span =
            tracing::info_span!("extractor.docx", file = %sanitize::redact_path(path)).entered();

        self.converter.get().convert_path(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Builds a minimal DOCX package with one paragraph per entry.
    pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut body = String::new();
        for paragraph in paragraphs {
            body.push_str(&format!(
                "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
                paragraph
            ));
        }
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}</w:body></w:document>",
            body
        );

        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(document.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_extract_docx_paragraphs() {
        let file = NamedTempFile::with_suffix(".docx").unwrap();
        std::fs::write(
            file.path(),
            build_docx(&["Unit 3: Ecosystems", "Food webs &amp; energy flow"]),
        )
        .unwrap();

        let converter = Arc::new(LazyConverter::new());
        let extractor = DocxExtractor::new(Arc::clone(&converter));
        let text = extractor.extract(file.path()).unwrap();

        assert!(text.contains("Unit 3: Ecosystems"));
        assert!(text.contains("energy flow"));
        assert!(converter.is_initialized());
    }

    #[test]
    fn test_extract_docx_missing_document_part() {
        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            zip.start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<styles/>").unwrap();
            zip.finish().unwrap();
        }
        let file = NamedTempFile::with_suffix(".docx").unwrap();
        std::fs::write(file.path(), buffer.into_inner()).unwrap();

        let extractor = DocxExtractor::new(Arc::new(LazyConverter::new()));
        match extractor.extract(file.path()) {
            Err(ExtractionError::Docx(msg)) => assert!(msg.contains("word/document.xml")),
            other => panic!("Expected Docx error, got {:?}", other),
        }
    }
}
