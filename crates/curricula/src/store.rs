//! Material record store: the read/write contract the orchestrator and
//! scheduler work against, and its SQLite implementation.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::db::material_repo::{self, format_timestamp, MaterialRow};
use crate::db::{Database, DatabaseError};
use crate::error::CurriculaError;
use crate::material::{CurriculumMaterial, GenerationMetadata, NewMaterial, ProcessingStatus};

/// Durable storage for curriculum materials.
///
/// `claim` and `claim_for_reprocess` must be single conditional updates:
/// of any number of concurrent callers, at most one observes `true`.
pub trait MaterialStore: Send + Sync {
    /// Records a new `pending` material and returns it.
    fn insert(&self, new: &NewMaterial) -> Result<CurriculumMaterial, DatabaseError>;

    fn find(&self, id: &str) -> Result<Option<CurriculumMaterial>, DatabaseError>;

    /// Ids of up to `limit` pending, non-deleted, non-archived materials,
    /// oldest first.
    fn list_pending_ids(&self, limit: usize) -> Result<Vec<String>, DatabaseError>;

    /// `pending -> processing`. Returns whether this caller won the claim.
    fn claim(&self, id: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError>;

    /// `{pending, failed, completed} -> processing` for a manual re-trigger.
    /// A `processing` record claimed before `stale_before` is taken over too.
    fn claim_for_reprocess(
        &self,
        id: &str,
        at: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;

    fn mark_completed(&self, id: &str, text: &str, at: DateTime<Utc>)
        -> Result<(), DatabaseError>;

    fn mark_failed(&self, id: &str, error: &str, at: DateTime<Utc>) -> Result<(), DatabaseError>;

    /// Increments usage and persists any insights returned by a generation call.
    fn record_generation(
        &self,
        id: &str,
        insights: &GenerationMetadata,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;

    fn archive(&self, id: &str, archived: bool) -> Result<(), DatabaseError>;

    fn soft_delete(&self, id: &str) -> Result<(), DatabaseError>;

    fn count_by_status(&self, status: ProcessingStatus) -> Result<u64, DatabaseError>;
}

/// SQLite-backed [`MaterialStore`].
#[derive(Clone)]
pub struct SqliteMaterialStore {
    db: Database,
}

impl SqliteMaterialStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn materialize(row: Option<MaterialRow>) -> Result<Option<CurriculumMaterial>, DatabaseError> {
    row.map(MaterialRow::into_material).transpose()
}

impl MaterialStore for SqliteMaterialStore {
    fn insert(&self, new: &NewMaterial) -> Result<CurriculumMaterial, DatabaseError> {
        let id = uuid::Uuid::new_v4().to_string();
        let row = MaterialRow::from_new(&id, new, Utc::now());
        material_repo::insert(&self.db, &row)?;
        log::info!("Registered material {} ({})", id, new.file_type);
        row.into_material()
    }

    fn find(&self, id: &str) -> Result<Option<CurriculumMaterial>, DatabaseError> {
        materialize(material_repo::find_by_id(&self.db, id)?)
    }

    fn list_pending_ids(&self, limit: usize) -> Result<Vec<String>, DatabaseError> {
        material_repo::list_pending_ids(&self.db, limit)
    }

    fn claim(&self, id: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        material_repo::try_claim(&self.db, id, &format_timestamp(at))
    }

    fn claim_for_reprocess(
        &self,
        id: &str,
        at: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        material_repo::try_claim_for_reprocess(
            &self.db,
            id,
            &format_timestamp(at),
            &format_timestamp(stale_before),
        )
    }

    fn mark_completed(
        &self,
        id: &str,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        material_repo::mark_completed(&self.db, id, text, &format_timestamp(at))
    }

    fn mark_failed(&self, id: &str, error: &str, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        material_repo::mark_failed(&self.db, id, error, &format_timestamp(at))
    }

    fn record_generation(
        &self,
        id: &str,
        insights: &GenerationMetadata,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        material_repo::record_generation(&self.db, id, insights, &format_timestamp(at))
    }

    fn archive(&self, id: &str, archived: bool) -> Result<(), DatabaseError> {
        material_repo::set_archived(&self.db, id, archived, &format_timestamp(Utc::now()))
    }

    fn soft_delete(&self, id: &str) -> Result<(), DatabaseError> {
        material_repo::soft_delete(&self.db, id, &format_timestamp(Utc::now()))
    }

    fn count_by_status(&self, status: ProcessingStatus) -> Result<u64, DatabaseError> {
        material_repo::count_by_status(&self.db, status.as_str())
    }
}

/// Describes the file at `path` and records it as a new `pending` material.
pub fn register_upload(
    store: &dyn MaterialStore,
    path: &Path,
    title: &str,
    teacher_id: &str,
    school_id: &str,
) -> Result<CurriculumMaterial, CurriculaError> {
    let new = NewMaterial::from_upload(path, title, teacher_id, school_id)?;
    Ok(store.insert(&new)?)
}
