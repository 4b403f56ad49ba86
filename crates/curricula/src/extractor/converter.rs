//! Rich-document (OOXML) to plain-text conversion.
//!
//! The converter is built once per registry and shared by every strategy
//! that needs it. [`LazyConverter`] defers construction until the first
//! document that actually needs it arrives.

use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use crate::error::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Converts word-processing documents into plain text.
pub struct RichTextConverter {
    control_chars: Regex,
}

impl RichTextConverter {
    pub fn new() -> Self {
        Self {
            // Control characters other than tab/newline leak out of field codes.
            control_chars: Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]")
                .expect("control character pattern is valid"),
        }
    }

    /// Opens `path` as an OOXML package and returns the text of its main part.
    pub fn convert_path(&self, path: &Path) -> Result<String, ExtractionError> {
        let file = std::fs::File::open(path).map_err(|e| ExtractionError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| ExtractionError::Docx(format!("Failed to open document: {}", e)))?;

        let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| {
            ExtractionError::Docx(format!("Failed to find {}: {}", DOCUMENT_PART, e))
        })?;

        let mut xml = String::new();
        part.read_to_string(&mut xml).map_err(|e| {
            ExtractionError::Docx(format!("Failed to read {}: {}", DOCUMENT_PART, e))
        })?;

        self.convert_xml(&xml)
    }

    /// Converts the body of a `document.xml` part.
    pub fn convert_xml(&self, xml: &str) -> Result<String, ExtractionError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut text = String::new();
        let mut in_text_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"t" {
                        in_text_element = true;
                    }
                }
                Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"tab" => text.push('\t'),
                    b"br" | b"cr" => text.push('\n'),
                    _ => {}
                },
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"t" => in_text_element = false,
                    b"p" => text.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if in_text_element {
                        let raw = String::from_utf8_lossy(&e);
                        match quick_xml::escape::unescape(&raw) {
                            Ok(decoded) => text.push_str(&decoded),
                            Err(_) => text.push_str(&raw),
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ExtractionError::Docx(format!("XML parsing error: {}", e)));
                }
                _ => {}
            }
        }

        Ok(self.control_chars.replace_all(&text, "").into_owned())
    }
}

impl Default for RichTextConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Get-or-create holder for a [`RichTextConverter`].
#[derive(Default)]
pub struct LazyConverter {
    cell: OnceLock<RichTextConverter>,
}

impl LazyConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the converter, building it on first access.
    pub fn get(&self) -> &RichTextConverter {
        self.cell.get_or_init(|| {
            log::debug!("Initializing rich-document converter");
            RichTextConverter::new()
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}
