pub mod converter;
pub mod doc;
pub mod docx;
pub mod pdf;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ExtractionError;

pub use converter::{LazyConverter, RichTextConverter};
pub use doc::LegacyDocExtractor;
pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;

/// One extraction strategy: turns a document on disk into raw text.
pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Normalizes a file-type tag: trimmed, lower-cased, without a leading dot.
pub fn normalize_type_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('.').to_lowercase()
}

/// Strategy table keyed by normalized file-type tag.
pub struct ExtractorRegistry {
    upload_root: Option<PathBuf>,
    strategies: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Registry with the built-in `pdf`, `docx` and `doc` strategies.
    ///
    /// `docx` and `doc` share one lazily-built converter.
    pub fn new(upload_root: Option<PathBuf>) -> Self {
        let converter = Arc::new(LazyConverter::new());

        let mut registry = Self::empty(upload_root);
        registry.register("pdf", Arc::new(PdfExtractor::new()));
        registry.register("docx", Arc::new(DocxExtractor::new(Arc::clone(&converter))));
        registry.register("doc", Arc::new(LegacyDocExtractor::new(converter)));
        registry
    }

    /// Registry without any strategies.
    pub fn empty(upload_root: Option<PathBuf>) -> Self {
        Self {
            upload_root,
            strategies: HashMap::new(),
        }
    }

    /// Adds or replaces the strategy for `tag`.
    pub fn register(&mut self, tag: &str, extractor: Arc<dyn Extractor>) {
        self.strategies.insert(normalize_type_tag(tag), extractor);
    }

    pub fn supports(&self, tag: &str) -> bool {
        self.strategies.contains_key(&normalize_type_tag(tag))
    }

    /// Registered tags, sorted.
    pub fn supported_types(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.strategies.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Resolves `path` against the upload root and checks that it exists.
    pub fn resolve_path(&self, path: &Path) -> Result<PathBuf, ExtractionError> {
        let resolved = match &self.upload_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        };

        if !resolved.is_file() {
            return Err(ExtractionError::NotFound(resolved));
        }

        Ok(resolved)
    }

    /// Extracts raw text from `path` using the strategy registered for `file_type`.
    pub fn extract(&self, path: &Path, file_type: &str) -> Result<String, ExtractionError> {
        let tag = normalize_type_tag(file_type);
        let extractor = self
            .strategies
            .get(&tag)
            .ok_or_else(|| ExtractionError::UnsupportedType(tag.clone()))?;

        let resolved = self.resolve_path(path)?;
        extractor.extract(&resolved)
    }
}
