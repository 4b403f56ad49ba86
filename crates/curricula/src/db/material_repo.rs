//! Material repository: SQL for the `materials` table.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::material::{CurriculumMaterial, GenerationMetadata, NewMaterial, ProcessingStatus};

/// A raw material row from the database.
#[derive(Debug, Clone)]
pub struct MaterialRow {
    pub id: String,
    pub teacher_id: String,
    pub school_id: String,
    pub title: String,
    pub description: Option<String>,
    pub original_file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_path: String,
    pub mime_type: Option<String>,
    pub processing_status: String,
    pub extracted_text: Option<String>,
    pub text_extraction_error: Option<String>,
    pub processing_started_at: Option<String>,
    pub processing_completed_at: Option<String>,
    pub summary: Option<String>,
    pub outline: Option<String>,
    /// JSON array of strings.
    pub suggested_topics: Option<String>,
    /// JSON array of strings.
    pub learning_objectives: Option<String>,
    pub usage_count: i64,
    pub last_used_at: Option<String>,
    pub expires_at: Option<String>,
    pub is_archived: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl MaterialRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            teacher_id: row.get("teacher_id")?,
            school_id: row.get("school_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            original_file_name: row.get("original_file_name")?,
            file_type: row.get("file_type")?,
            file_size: row.get("file_size")?,
            storage_path: row.get("storage_path")?,
            mime_type: row.get("mime_type")?,
            processing_status: row.get("processing_status")?,
            extracted_text: row.get("extracted_text")?,
            text_extraction_error: row.get("text_extraction_error")?,
            processing_started_at: row.get("processing_started_at")?,
            processing_completed_at: row.get("processing_completed_at")?,
            summary: row.get("summary")?,
            outline: row.get("outline")?,
            suggested_topics: row.get("suggested_topics")?,
            learning_objectives: row.get("learning_objectives")?,
            usage_count: row.get("usage_count")?,
            last_used_at: row.get("last_used_at")?,
            expires_at: row.get("expires_at")?,
            is_archived: row.get("is_archived")?,
            deleted_at: row.get("deleted_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Builds a fresh `pending` row for an upload.
    pub fn from_new(id: &str, new: &NewMaterial, now: DateTime<Utc>) -> Self {
        let now = format_timestamp(now);
        Self {
            id: id.to_string(),
            teacher_id: new.teacher_id.clone(),
            school_id: new.school_id.clone(),
            title: new.title.clone(),
            description: new.description.clone(),
            original_file_name: new.original_file_name.clone(),
            file_type: new.file_type.clone(),
            file_size: i64::try_from(new.file_size).unwrap_or(i64::MAX),
            storage_path: new.storage_path.clone(),
            mime_type: new.mime_type.clone(),
            processing_status: ProcessingStatus::Pending.as_str().to_string(),
            extracted_text: None,
            text_extraction_error: None,
            processing_started_at: None,
            processing_completed_at: None,
            summary: None,
            outline: None,
            suggested_topics: None,
            learning_objectives: None,
            usage_count: 0,
            last_used_at: None,
            expires_at: new.expires_at.map(format_timestamp),
            is_archived: false,
            deleted_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Maps the row onto the domain model, rejecting unparseable columns.
    pub fn into_material(self) -> Result<CurriculumMaterial, DatabaseError> {
        let id = self.id;
        let processing_status = self.processing_status.parse::<ProcessingStatus>().map_err(
            |reason| DatabaseError::CorruptRow {
                id: id.clone(),
                column: "processing_status",
                reason,
            },
        )?;

        let ts = |column: &'static str, value: Option<String>| {
            value
                .map(|v| parse_timestamp(&id, column, &v))
                .transpose()
        };
        let list = |column: &'static str, value: Option<String>| -> Result<Vec<String>, DatabaseError> {
            match value {
                Some(json) => serde_json::from_str(&json).map_err(|e| DatabaseError::CorruptRow {
                    id: id.clone(),
                    column,
                    reason: e.to_string(),
                }),
                None => Ok(Vec::new()),
            }
        };

        let generation = GenerationMetadata {
            summary: self.summary,
            outline: self.outline,
            suggested_topics: list("suggested_topics", self.suggested_topics)?,
            learning_objectives: list("learning_objectives", self.learning_objectives)?,
        };

        Ok(CurriculumMaterial {
            teacher_id: self.teacher_id,
            school_id: self.school_id,
            title: self.title,
            description: self.description,
            original_file_name: self.original_file_name,
            file_type: self.file_type,
            file_size: u64::try_from(self.file_size).unwrap_or(0),
            storage_path: self.storage_path,
            mime_type: self.mime_type,
            processing_status,
            extracted_text: self.extracted_text,
            text_extraction_error: self.text_extraction_error,
            processing_started_at: ts("processing_started_at", self.processing_started_at)?,
            processing_completed_at: ts("processing_completed_at", self.processing_completed_at)?,
            generation,
            usage_count: u64::try_from(self.usage_count).unwrap_or(0),
            last_used_at: ts("last_used_at", self.last_used_at)?,
            expires_at: ts("expires_at", self.expires_at)?,
            is_archived: self.is_archived,
            deleted_at: ts("deleted_at", self.deleted_at)?,
            created_at: parse_timestamp(&id, "created_at", &self.created_at)?,
            updated_at: parse_timestamp(&id, "updated_at", &self.updated_at)?,
            id,
        })
    }
}

/// RFC 3339 with fixed microsecond precision so lexical order matches time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(id: &str, column: &'static str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRow {
            id: id.to_string(),
            column,
            reason: e.to_string(),
        })
}

fn ensure_updated(changed: usize, id: &str) -> Result<(), DatabaseError> {
    if changed == 0 {
        return Err(DatabaseError::MaterialNotFound(id.to_string()));
    }
    Ok(())
}

/// Inserts a new material row.
pub fn insert(db: &Database, row: &MaterialRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO materials (id, teacher_id, school_id, title, description,
             original_file_name, file_type, file_size, storage_path, mime_type,
             processing_status, extracted_text, text_extraction_error,
             processing_started_at, processing_completed_at, summary, outline,
             suggested_topics, learning_objectives, usage_count, last_used_at,
             expires_at, is_archived, deleted_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
             ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)",
            params![
                row.id,
                row.teacher_id,
                row.school_id,
                row.title,
                row.description,
                row.original_file_name,
                row.file_type,
                row.file_size,
                row.storage_path,
                row.mime_type,
                row.processing_status,
                row.extracted_text,
                row.text_extraction_error,
                row.processing_started_at,
                row.processing_completed_at,
                row.summary,
                row.outline,
                row.suggested_topics,
                row.learning_objectives,
                row.usage_count,
                row.last_used_at,
                row.expires_at,
                row.is_archived,
                row.deleted_at,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a material by its ID, including soft-deleted rows.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<MaterialRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM materials WHERE id = ?1",
                params![id],
                MaterialRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Ids of up to `limit` pending, live materials, oldest first.
///
/// Only ids are read so one unreadable row cannot hide the others.
pub fn list_pending_ids(db: &Database, limit: usize) -> Result<Vec<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id FROM materials
             WHERE processing_status = 'pending' AND deleted_at IS NULL AND is_archived = 0
             ORDER BY created_at ASC, id ASC
             LIMIT ?1",
        )?;
        let ids = stmt
            .query_map(params![limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    })
}

/// Conditionally moves a `pending` material to `processing`.
///
/// Returns `true` only for the single caller whose update changed the row.
pub fn try_claim(db: &Database, id: &str, started_at: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE materials SET processing_status = 'processing',
             processing_started_at = ?2, processing_completed_at = NULL,
             text_extraction_error = NULL, updated_at = ?2
             WHERE id = ?1 AND processing_status = 'pending'",
            params![id, started_at],
        )?;
        Ok(changed == 1)
    })
}

/// Manual re-trigger claim: any settled state may move back to `processing`,
/// and so may a `processing` record whose claim started before `stale_before`.
pub fn try_claim_for_reprocess(
    db: &Database,
    id: &str,
    started_at: &str,
    stale_before: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE materials SET processing_status = 'processing',
             processing_started_at = ?2, processing_completed_at = NULL,
             text_extraction_error = NULL, updated_at = ?2
             WHERE id = ?1 AND (
                 processing_status IN ('pending', 'failed', 'completed')
                 OR (processing_status = 'processing'
                     AND (processing_started_at IS NULL OR processing_started_at < ?3))
             )",
            params![id, started_at, stale_before],
        )?;
        Ok(changed == 1)
    })
}

/// Stores extracted text and marks the material `completed`.
pub fn mark_completed(
    db: &Database,
    id: &str,
    text: &str,
    completed_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE materials SET processing_status = 'completed', extracted_text = ?2,
             text_extraction_error = NULL, processing_completed_at = ?3, updated_at = ?3
             WHERE id = ?1",
            params![id, text, completed_at],
        )?;
        ensure_updated(changed, id)
    })
}

/// Marks the material `failed` with the given message. Any earlier text is cleared.
pub fn mark_failed(
    db: &Database,
    id: &str,
    error: &str,
    completed_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE materials SET processing_status = 'failed', extracted_text = NULL,
             text_extraction_error = ?2, processing_completed_at = ?3, updated_at = ?3
             WHERE id = ?1",
            params![id, error, completed_at],
        )?;
        ensure_updated(changed, id)
    })
}

/// Bumps usage after a generation call and merges any returned insights.
///
/// Absent insight fields leave the stored values untouched.
pub fn record_generation(
    db: &Database,
    id: &str,
    insights: &GenerationMetadata,
    used_at: &str,
) -> Result<(), DatabaseError> {
    let topics = encode_list(&insights.suggested_topics)?;
    let objectives = encode_list(&insights.learning_objectives)?;

    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE materials SET usage_count = usage_count + 1, last_used_at = ?2,
             summary = COALESCE(?3, summary), outline = COALESCE(?4, outline),
             suggested_topics = COALESCE(?5, suggested_topics),
             learning_objectives = COALESCE(?6, learning_objectives),
             updated_at = ?2
             WHERE id = ?1",
            params![
                id,
                used_at,
                insights.summary,
                insights.outline,
                topics,
                objectives
            ],
        )?;
        ensure_updated(changed, id)
    })
}

fn encode_list(items: &[String]) -> Result<Option<String>, DatabaseError> {
    if items.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(items)
        .map(Some)
        .map_err(|e| DatabaseError::CorruptRow {
            id: String::new(),
            column: "generation",
            reason: e.to_string(),
        })
}

/// Sets or clears the archived flag.
pub fn set_archived(
    db: &Database,
    id: &str,
    archived: bool,
    updated_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE materials SET is_archived = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, archived, updated_at],
        )?;
        ensure_updated(changed, id)
    })
}

/// Stamps `deleted_at`. Rows are never physically removed.
pub fn soft_delete(db: &Database, id: &str, deleted_at: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE materials SET deleted_at = COALESCE(deleted_at, ?2), updated_at = ?2
             WHERE id = ?1",
            params![id, deleted_at],
        )?;
        ensure_updated(changed, id)
    })
}

/// Counts live (non-deleted) materials with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM materials WHERE processing_status = ?1 AND deleted_at IS NULL",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
