//! Note Store - SQL Operations for the Notes Table
//!
//! All SQL touching the `notes` table lives here: row mapping, per-note
//! CRUD, partition listings, and the three bulk rank primitives that keep
//! every partition's rank sequence dense.
//!
//! Mutating operations take a [`StoreSession`] so that every rank shift and
//! note write belonging to one logical operation shares one transaction.
//! The rank primitives never touch `modified_at`: rank bookkeeping is
//! structural housekeeping, not a user-visible edit.

use crate::db::error::DatabaseError;
use crate::db::session::StoreSession;
use crate::db::DatabaseService;
use crate::models::{Note, NoteCategory, NoteColor, PartitionKey};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;

/// Column list shared by every SELECT that maps into a [`Note`]
const NOTE_COLUMNS: &str =
    "id, owner_id, title, content, labels, category, color, rank, created_at, modified_at";

/// SQL operations for notes over a shared [`DatabaseService`]
pub struct NoteStore {
    db: Arc<DatabaseService>,
}

/// Map a single column fetch into a row-decode error
fn decode<T>(result: Result<T, libsql::Error>, name: &str) -> Result<T, DatabaseError> {
    result.map_err(|e| DatabaseError::row_decode(format!("Failed to get {}: {}", name, e)))
}

impl NoteStore {
    /// Create a store over an opened database
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Begin a transaction on a dedicated connection
    pub async fn begin_session(&self) -> Result<StoreSession, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        StoreSession::begin(conn).await
    }

    /// Parse a stored timestamp
    ///
    /// Rows written by this crate carry RFC3339; rows created through SQL
    /// defaults carry SQLite's `YYYY-MM-DD HH:MM:SS`.
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        Err(DatabaseError::row_decode(format!(
            "Unable to parse timestamp '{}'",
            s
        )))
    }

    /// Convert a libsql row (in `NOTE_COLUMNS` order) into a [`Note`]
    fn row_to_note(row: &libsql::Row) -> Result<Note, DatabaseError> {
        let id: String = decode(row.get(0), "id")?;
        let owner_id: String = decode(row.get(1), "owner_id")?;
        let title: String = decode(row.get(2), "title")?;
        let content: String = decode(row.get(3), "content")?;
        let labels_json: String = decode(row.get(4), "labels")?;
        let category_name: String = decode(row.get(5), "category")?;
        let color_name: String = decode(row.get(6), "color")?;
        let rank: i64 = decode(row.get(7), "rank")?;
        let created_at_str: String = decode(row.get(8), "created_at")?;
        let modified_at_str: String = decode(row.get(9), "modified_at")?;

        let labels: Vec<String> = serde_json::from_str(&labels_json)
            .map_err(|e| DatabaseError::row_decode(format!("Failed to parse labels: {}", e)))?;

        let category = NoteCategory::parse(&category_name).ok_or_else(|| {
            DatabaseError::row_decode(format!("Unknown category '{}'", category_name))
        })?;

        let color = NoteColor::parse(&color_name)
            .ok_or_else(|| DatabaseError::row_decode(format!("Unknown color '{}'", color_name)))?;

        let rank = u32::try_from(rank)
            .map_err(|_| DatabaseError::row_decode(format!("Rank out of range: {}", rank)))?;

        Ok(Note {
            id,
            owner_id,
            title,
            content,
            labels,
            category,
            color,
            rank,
            created_at: Self::parse_timestamp(&created_at_str)?,
            modified_at: Self::parse_timestamp(&modified_at_str)?,
        })
    }

    fn encode_labels(note: &Note) -> Result<String, DatabaseError> {
        serde_json::to_string(&note.labels)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to serialize labels: {}", e)))
    }

    //
    // TRANSACTIONAL OPERATIONS
    //

    /// Insert a note inside the given transaction
    pub async fn insert_note(
        &self,
        session: &StoreSession,
        note: &Note,
    ) -> Result<(), DatabaseError> {
        let labels = Self::encode_labels(note)?;

        session
            .conn()
            .execute(
                "INSERT INTO notes
                 (id, owner_id, title, content, labels, category, color, rank, created_at, modified_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    note.id.as_str(),
                    note.owner_id.as_str(),
                    note.title.as_str(),
                    note.content.as_str(),
                    labels.as_str(),
                    note.category.as_str(),
                    note.color.as_str(),
                    note.rank as i64,
                    note.created_at.to_rfc3339(),
                    note.modified_at.to_rfc3339(),
                ),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert note: {}", e)))?;

        Ok(())
    }

    /// Conditionally rewrite a note's mutable fields inside the transaction
    ///
    /// The WHERE clause guards on both id and owner; the returned count is 0
    /// when the note vanished or changed hands since it was read.
    pub async fn update_note_row(
        &self,
        session: &StoreSession,
        note: &Note,
    ) -> Result<u64, DatabaseError> {
        let labels = Self::encode_labels(note)?;

        let changed = session
            .conn()
            .execute(
                "UPDATE notes
                 SET title = ?, content = ?, labels = ?, category = ?, color = ?,
                     rank = ?, modified_at = ?
                 WHERE id = ? AND owner_id = ?",
                (
                    note.title.as_str(),
                    note.content.as_str(),
                    labels.as_str(),
                    note.category.as_str(),
                    note.color.as_str(),
                    note.rank as i64,
                    note.modified_at.to_rfc3339(),
                    note.id.as_str(),
                    note.owner_id.as_str(),
                ),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to update note: {}", e)))?;

        Ok(changed)
    }

    /// Delete one owned note inside the transaction, returning the count
    pub async fn delete_note_row(
        &self,
        session: &StoreSession,
        owner_id: &str,
        note_id: &str,
    ) -> Result<u64, DatabaseError> {
        let changed = session
            .conn()
            .execute(
                "DELETE FROM notes WHERE id = ? AND owner_id = ?",
                (note_id, owner_id),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete note: {}", e)))?;

        Ok(changed)
    }

    /// Fetch a note by id inside the transaction, regardless of owner
    ///
    /// The service layer distinguishes "no such record" from "owned by
    /// someone else", so this lookup deliberately does not filter on owner.
    pub async fn get_note(
        &self,
        session: &StoreSession,
        note_id: &str,
    ) -> Result<Option<Note>, DatabaseError> {
        let mut stmt = session
            .conn()
            .prepare(&format!(
                "SELECT {} FROM notes WHERE id = ?",
                NOTE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare note lookup: {}", e))
            })?;

        let mut rows = stmt.query([note_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute note lookup: {}", e))
        })?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::row_to_note(&row)?)),
            None => Ok(None),
        }
    }

    /// Ids currently in a partition, in rank order, inside the transaction
    pub async fn partition_ids(
        &self,
        session: &StoreSession,
        key: &PartitionKey,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = session
            .conn()
            .prepare(
                "SELECT id FROM notes
                 WHERE owner_id = ? AND category = ?
                 ORDER BY rank ASC",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare partition listing: {}", e))
            })?;

        let mut rows = stmt
            .query((key.owner_id.as_str(), key.category.as_str()))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to list partition ids: {}", e))
            })?;

        let mut ids = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            ids.push(decode(row.get(0), "id")?);
        }

        Ok(ids)
    }

    //
    // RANK PRIMITIVES
    // One bulk statement each; none of them touches modified_at.
    //

    /// Shift every note in the partition down by one, freeing rank 0
    ///
    /// Runs inside the caller's transaction, before the rank-0 write, so no
    /// two notes ever share a rank observably.
    pub async fn open_slot_at_top(
        &self,
        session: &StoreSession,
        key: &PartitionKey,
    ) -> Result<u64, DatabaseError> {
        let changed = session
            .conn()
            .execute(
                "UPDATE notes SET rank = rank + 1
                 WHERE owner_id = ? AND category = ?",
                (key.owner_id.as_str(), key.category.as_str()),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to open slot in partition {}: {}",
                    key, e
                ))
            })?;

        Ok(changed)
    }

    /// Pull every note ranked below `vacated_rank` up by one
    ///
    /// Re-establishes contiguity after a note left the partition. Must be
    /// called with the rank the note held *before* it was removed or moved.
    pub async fn close_gap_after(
        &self,
        session: &StoreSession,
        key: &PartitionKey,
        vacated_rank: u32,
    ) -> Result<u64, DatabaseError> {
        let changed = session
            .conn()
            .execute(
                "UPDATE notes SET rank = rank - 1
                 WHERE owner_id = ? AND category = ? AND rank > ?",
                (
                    key.owner_id.as_str(),
                    key.category.as_str(),
                    vacated_rank as i64,
                ),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to close gap in partition {}: {}",
                    key, e
                ))
            })?;

        Ok(changed)
    }

    /// Rewrite ranks to match the position of each id in `ordered_ids`
    ///
    /// One conditional bulk update: only rows still in this partition
    /// match, so the returned count falls short of the batch size whenever
    /// a concurrent mutation moved or removed a note after the plan was
    /// made. The caller compares the count against the batch size and
    /// aborts on a shortfall.
    pub async fn assign_ranks(
        &self,
        session: &StoreSession,
        key: &PartitionKey,
        ordered_ids: &[String],
    ) -> Result<u64, DatabaseError> {
        if ordered_ids.is_empty() {
            return Ok(0);
        }

        let mut sql = String::from("UPDATE notes SET rank = CASE id ");
        let mut params: Vec<libsql::Value> = Vec::with_capacity(ordered_ids.len() * 2 + 2);

        for (index, id) in ordered_ids.iter().enumerate() {
            sql.push_str("WHEN ? THEN ? ");
            params.push(libsql::Value::Text(id.clone()));
            params.push(libsql::Value::Integer(index as i64));
        }

        sql.push_str("END WHERE owner_id = ? AND category = ? AND id IN (");
        params.push(libsql::Value::Text(key.owner_id.clone()));
        params.push(libsql::Value::Text(key.category.as_str().to_string()));

        for (index, id) in ordered_ids.iter().enumerate() {
            if index > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            params.push(libsql::Value::Text(id.clone()));
        }
        sql.push(')');

        let changed = session
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to assign ranks in partition {}: {}",
                    key, e
                ))
            })?;

        Ok(changed)
    }

    /// Delete every note in a partition inside the transaction
    pub async fn delete_partition(
        &self,
        session: &StoreSession,
        key: &PartitionKey,
    ) -> Result<u64, DatabaseError> {
        let changed = session
            .conn()
            .execute(
                "DELETE FROM notes WHERE owner_id = ? AND category = ?",
                (key.owner_id.as_str(), key.category.as_str()),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to delete partition {}: {}",
                    key, e
                ))
            })?;

        Ok(changed)
    }

    //
    // PLAIN READS
    // Short autocommit queries on their own connection.
    //

    /// Fetch a note by id, regardless of owner
    pub async fn load_note(&self, note_id: &str) -> Result<Option<Note>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM notes WHERE id = ?",
                NOTE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare note lookup: {}", e))
            })?;

        let mut rows = stmt.query([note_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute note lookup: {}", e))
        })?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::row_to_note(&row)?)),
            None => Ok(None),
        }
    }

    /// All notes in one partition, rank 0 first
    pub async fn list_partition(&self, key: &PartitionKey) -> Result<Vec<Note>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM notes
                 WHERE owner_id = ? AND category = ?
                 ORDER BY rank ASC",
                NOTE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare partition query: {}", e))
            })?;

        let mut rows = stmt
            .query((key.owner_id.as_str(), key.category.as_str()))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to query partition: {}", e))
            })?;

        let mut notes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            notes.push(Self::row_to_note(&row)?);
        }

        Ok(notes)
    }

    /// Per-category note counts for one owner
    pub async fn category_counts(
        &self,
        owner_id: &str,
    ) -> Result<Vec<(NoteCategory, u64)>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT category, COUNT(*) FROM notes
                 WHERE owner_id = ?
                 GROUP BY category",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare count query: {}", e))
            })?;

        let mut rows = stmt.query([owner_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to query counts: {}", e))
        })?;

        let mut counts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            let name: String = decode(row.get(0), "category")?;
            let count: i64 = decode(row.get(1), "count")?;

            let category = NoteCategory::parse(&name).ok_or_else(|| {
                DatabaseError::row_decode(format!("Unknown category '{}'", name))
            })?;

            counts.push((category, count as u64));
        }

        Ok(counts)
    }
}
