//! Partition Rank Bookkeeping
//!
//! `PartitionRanks` owns the dense-rank invariant: within one partition,
//! ranks always form exactly `0..n`. It sequences the bulk shift
//! primitives of [`NoteStore`] so callers state intent (admit, evict,
//! relocate, apply an order) instead of choreographing shifts.
//!
//! All methods run inside the caller's [`StoreSession`]. Nothing here
//! commits; the caller owns the transaction boundary so a note write and
//! its rank shifts land atomically.

use crate::db::{DatabaseError, NoteStore, StoreSession};
use crate::models::PartitionKey;
use std::sync::Arc;

/// Sequences bulk rank shifts for partition membership changes
pub struct PartitionRanks {
    store: Arc<NoteStore>,
}

impl PartitionRanks {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }

    /// Make room at rank 0 for a note entering the partition
    ///
    /// Every resident shifts down by one. The caller must write the
    /// entering note with rank 0 in the same transaction.
    pub async fn admit_at_top(
        &self,
        session: &StoreSession,
        key: &PartitionKey,
    ) -> Result<u64, DatabaseError> {
        let shifted = self.store.open_slot_at_top(session, key).await?;
        tracing::debug!("Opened top slot in {} ({} notes shifted)", key, shifted);
        Ok(shifted)
    }

    /// Re-densify after a note left the partition
    ///
    /// `vacated_rank` is the rank the note held before it was removed or
    /// moved; everything that sat below it moves up by one.
    pub async fn evict(
        &self,
        session: &StoreSession,
        key: &PartitionKey,
        vacated_rank: u32,
    ) -> Result<u64, DatabaseError> {
        let shifted = self.store.close_gap_after(session, key, vacated_rank).await?;
        tracing::debug!(
            "Closed gap after rank {} in {} ({} notes shifted)",
            vacated_rank,
            key,
            shifted
        );
        Ok(shifted)
    }

    /// Compensating shift pair for a cross-partition move
    ///
    /// Destination first, then source. The caller must write the moved
    /// note with the destination key and rank 0 before committing.
    pub async fn relocate(
        &self,
        session: &StoreSession,
        from: &PartitionKey,
        vacated_rank: u32,
        to: &PartitionKey,
    ) -> Result<(), DatabaseError> {
        self.admit_at_top(session, to).await?;
        self.evict(session, from, vacated_rank).await?;
        Ok(())
    }

    /// Rewrite the whole partition's ranks to match `ordered_ids`
    ///
    /// Returns the number of rows actually rewritten. The caller must
    /// verify it equals the batch size before committing; a shortfall
    /// means a concurrent mutation invalidated the plan.
    pub async fn apply_order(
        &self,
        session: &StoreSession,
        key: &PartitionKey,
        ordered_ids: &[String],
    ) -> Result<u64, DatabaseError> {
        let changed = self.store.assign_ranks(session, key, ordered_ids).await?;
        tracing::debug!(
            "Applied order of {} ids to {} ({} rows changed)",
            ordered_ids.len(),
            key,
            changed
        );
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseService;
    use crate::models::{Note, NoteCategory};
    use tempfile::TempDir;

    async fn create_test_ranks() -> (PartitionRanks, Arc<NoteStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let store = Arc::new(NoteStore::new(db));
        (PartitionRanks::new(Arc::clone(&store)), store, temp_dir)
    }

    async fn seed_partition(store: &NoteStore, owner: &str, category: NoteCategory, n: u32) -> Vec<Note> {
        let session = store.begin_session().await.unwrap();
        let mut notes = Vec::new();
        for rank in 0..n {
            let mut note = Note::new(owner.to_string(), format!("note-{}", rank), String::new());
            note.category = category;
            note.rank = rank;
            store.insert_note(&session, &note).await.unwrap();
            notes.push(note);
        }
        session.commit().await.unwrap();
        notes
    }

    async fn ranks_of(store: &NoteStore, key: &PartitionKey) -> Vec<u32> {
        store
            .list_partition(key)
            .await
            .unwrap()
            .iter()
            .map(|n| n.rank)
            .collect()
    }

    #[tokio::test]
    async fn test_relocate_shifts_both_partitions() {
        let (ranks, store, _temp) = create_test_ranks().await;
        let regular = PartitionKey::new("u1".to_string(), NoteCategory::Regular);
        let pinned = PartitionKey::new("u1".to_string(), NoteCategory::Pinned);

        let moved = seed_partition(&store, "u1", NoteCategory::Regular, 3)
            .await
            .remove(1);
        seed_partition(&store, "u1", NoteCategory::Pinned, 2).await;

        let session = store.begin_session().await.unwrap();
        ranks
            .relocate(&session, &regular, moved.rank, &pinned)
            .await
            .unwrap();

        // Finish the move the way a transition does
        let mut relocated = moved.clone();
        relocated.category = NoteCategory::Pinned;
        relocated.rank = 0;
        store.update_note_row(&session, &relocated).await.unwrap();
        session.commit().await.unwrap();

        assert_eq!(ranks_of(&store, &regular).await, vec![0, 1]);
        assert_eq!(ranks_of(&store, &pinned).await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_admit_then_evict_round_trip_keeps_density() {
        let (ranks, store, _temp) = create_test_ranks().await;
        let key = PartitionKey::new("u1".to_string(), NoteCategory::Regular);
        seed_partition(&store, "u1", NoteCategory::Regular, 4).await;

        let session = store.begin_session().await.unwrap();
        ranks.admit_at_top(&session, &key).await.unwrap();
        // No note took the freed slot; rank 0 is vacant, so evicting at 0
        // restores the original layout
        ranks.evict(&session, &key, 0).await.unwrap();
        session.commit().await.unwrap();

        assert_eq!(ranks_of(&store, &key).await, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_apply_order_reports_row_count() {
        let (ranks, store, _temp) = create_test_ranks().await;
        let key = PartitionKey::new("u1".to_string(), NoteCategory::Regular);
        let notes = seed_partition(&store, "u1", NoteCategory::Regular, 3).await;

        let order: Vec<String> = notes.iter().rev().map(|n| n.id.clone()).collect();
        let session = store.begin_session().await.unwrap();
        let changed = ranks.apply_order(&session, &key, &order).await.unwrap();
        session.commit().await.unwrap();

        assert_eq!(changed, 3);
        assert_eq!(ranks_of(&store, &key).await, vec![0, 1, 2]);
    }
}
