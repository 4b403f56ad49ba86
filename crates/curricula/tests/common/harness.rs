//! Test harness for isolated integration runs.
//!
//! Each `TestHarness` owns a temp directory holding an upload root and a
//! file-backed SQLite database, wired into a store and orchestrator the same
//! way the worker binary wires them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use curricula::{
    BatchScheduler, CurriculumMaterial, Database, ExtractorRegistry, MaterialStore, NewMaterial,
    ProcessingOrchestrator, SqliteMaterialStore, ValidationPolicy,
};

pub struct TestHarness {
    temp_dir: TempDir,
    /// Relative storage paths resolve against this directory.
    pub upload_root: PathBuf,
    pub db_path: PathBuf,
    pub store: Arc<dyn MaterialStore>,
    pub orchestrator: Arc<ProcessingOrchestrator>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_policy(ValidationPolicy::default())
    }

    pub fn with_policy(policy: ValidationPolicy) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_root = temp_dir.path().join("uploads");
        std::fs::create_dir_all(&upload_root).expect("Failed to create upload root");
        let db_path = temp_dir.path().join("data").join("curricula.db");

        let db = Database::open(&db_path).expect("Failed to open database");
        let store: Arc<dyn MaterialStore> = Arc::new(SqliteMaterialStore::new(db));
        let registry = Arc::new(ExtractorRegistry::new(Some(upload_root.clone())));
        let orchestrator = Arc::new(ProcessingOrchestrator::new(
            Arc::clone(&store),
            registry,
            policy,
        ));

        Self {
            temp_dir,
            upload_root,
            db_path,
            store,
            orchestrator,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes an upload under the upload root and returns its absolute path.
    pub fn write_upload(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.upload_root.join(name);
        std::fs::write(&path, content).expect("Failed to write upload");
        path
    }

    /// Records a pending material whose storage path is relative to the
    /// upload root. The file itself is not required to exist.
    pub fn register(&self, name: &str) -> CurriculumMaterial {
        let file_type = name.rsplit('.').next().unwrap_or_default().to_string();
        let new = NewMaterial {
            teacher_id: "teacher-1".to_string(),
            school_id: "school-1".to_string(),
            title: name.to_string(),
            description: None,
            original_file_name: name.to_string(),
            file_type,
            file_size: 0,
            storage_path: name.to_string(),
            mime_type: None,
            expires_at: None,
        };
        self.store.insert(&new).expect("Failed to insert material")
    }

    /// Writes the upload and registers it in one step.
    pub fn upload(&self, name: &str, content: &[u8]) -> CurriculumMaterial {
        self.write_upload(name, content);
        self.register(name)
    }

    pub fn material(&self, id: &str) -> CurriculumMaterial {
        self.store
            .find(id)
            .expect("Failed to read material")
            .expect("Material missing")
    }

    pub fn scheduler(&self, batch_size: usize) -> BatchScheduler {
        BatchScheduler::new(
            Arc::clone(&self.orchestrator),
            batch_size,
            Duration::from_secs(3600),
        )
    }
}
