//! Shared fixtures for unit tests.

use std::path::Path;
use std::sync::{mpsc, Mutex};

use crate::error::ExtractionError;
use crate::extractor::Extractor;
use crate::material::NewMaterial;

/// Normalizes to well over 100 characters and 50 words.
pub const LESSON: &str = "Photosynthesis is the process by which green plants use sunlight \
    water and carbon dioxide to make glucose and oxygen. Chlorophyll inside the \
    chloroplasts absorbs light energy which drives the reactions. Students will \
    describe the inputs and outputs of the process, explain the role of the leaf \
    and compare photosynthesis with cellular respiration in animals and plants \
    across a full school week of lessons.";

/// A `NewMaterial` stored relative to the upload root under `name`.
pub fn new_material(name: &str) -> NewMaterial {
    let file_type = name.rsplit('.').next().unwrap_or_default().to_string();
    NewMaterial {
        teacher_id: "t-1".to_string(),
        school_id: "s-1".to_string(),
        title: name.to_string(),
        description: None,
        original_file_name: name.to_string(),
        file_type,
        file_size: 1,
        storage_path: name.to_string(),
        mime_type: None,
        expires_at: None,
    }
}

/// Extractor that signals on entry and blocks until released, holding a
/// claim open for as long as a test needs.
pub struct GatedExtractor {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl GatedExtractor {
    /// Returns the extractor, an "entered" receiver and a "release" sender.
    pub fn new() -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gate = Self {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (gate, entered_rx, release_tx)
    }
}

impl Extractor for GatedExtractor {
    fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
        let _ = self.entered.lock().unwrap().send(());
        let _ = self.release.lock().unwrap().recv();
        Ok(LESSON.to_string())
    }
}
