//! Note Service - Ordered Partition Engine
//!
//! The public surface of the engine. Every mutation resolves the acting
//! user, validates its payload before any transaction opens, then runs the
//! rank bookkeeping and the note write as one atomic unit.
//!
//! Category changes all funnel through one transition primitive, so every
//! path (pin, archive, delete, restore, or a field update that carries a
//! new category) maintains dense ranks and keeps each note in exactly one
//! category.

use crate::db::{DatabaseService, NoteStore, StoreSession};
use crate::models::{
    CategoryCounts, Note, NoteCategory, NoteDraft, NoteLimits, NotePatch, PartitionKey,
    SystemTimeProvider, TimeProvider,
};
use crate::services::auth::Authenticator;
use crate::services::crypto::ContentCipher;
use crate::services::error::NoteServiceError;
use crate::services::ranks::PartitionRanks;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Tunable limits for the note engine
#[derive(Debug, Clone)]
pub struct NoteServiceConfig {
    /// Payload size limits applied before any transaction opens
    pub limits: NoteLimits,

    /// Upper bound on one reorder batch; bounds worst-case transaction size
    pub reorder_batch_limit: usize,
}

impl Default for NoteServiceConfig {
    fn default() -> Self {
        Self {
            limits: NoteLimits::default(),
            reorder_batch_limit: 500,
        }
    }
}

/// The three category toggles exposed to callers
///
/// Destinations are computed from the current category, never from
/// per-route flag juggling, so every toggle path shares one policy.
#[derive(Debug, Clone, Copy)]
enum Toggle {
    Pin,
    Archive,
    Delete,
}

impl Toggle {
    /// Destination category for a toggle applied to `current`
    ///
    /// Pinning is only meaningful between the regular and pinned
    /// partitions. Archive and delete accept any source; their inverses
    /// always restore to regular.
    fn destination(self, current: NoteCategory) -> Result<NoteCategory, NoteServiceError> {
        match (self, current) {
            (Toggle::Pin, NoteCategory::Regular) => Ok(NoteCategory::Pinned),
            (Toggle::Pin, NoteCategory::Pinned) => Ok(NoteCategory::Regular),
            (Toggle::Pin, other) => Err(NoteServiceError::precondition_failed(format!(
                "cannot pin a note in the {} category",
                other
            ))),
            (Toggle::Archive, NoteCategory::Archived) => Ok(NoteCategory::Regular),
            (Toggle::Archive, _) => Ok(NoteCategory::Archived),
            (Toggle::Delete, NoteCategory::Deleted) => Ok(NoteCategory::Regular),
            (Toggle::Delete, _) => Ok(NoteCategory::Deleted),
        }
    }
}

/// Ordered-partition note engine
///
/// Owns the transition and reorder flows over [`NoteStore`], with rank
/// bookkeeping delegated to [`PartitionRanks`]. Encryption and
/// authentication are injected collaborators; the engine never interprets
/// ciphertext and never orders on it.
pub struct NoteService {
    store: Arc<NoteStore>,
    ranks: PartitionRanks,
    cipher: Arc<dyn ContentCipher>,
    auth: Arc<dyn Authenticator>,
    time: Arc<dyn TimeProvider>,
    config: NoteServiceConfig,
}

impl NoteService {
    /// Create a service with default configuration
    pub fn new(
        db: Arc<DatabaseService>,
        cipher: Arc<dyn ContentCipher>,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        Self::with_config(db, cipher, auth, NoteServiceConfig::default())
    }

    /// Create a service with explicit configuration
    pub fn with_config(
        db: Arc<DatabaseService>,
        cipher: Arc<dyn ContentCipher>,
        auth: Arc<dyn Authenticator>,
        config: NoteServiceConfig,
    ) -> Self {
        let store = Arc::new(NoteStore::new(db));
        let ranks = PartitionRanks::new(Arc::clone(&store));

        Self {
            store,
            ranks,
            cipher,
            auth,
            time: Arc::new(SystemTimeProvider),
            config,
        }
    }

    /// Replace the clock; tests pin timestamps through this
    pub fn with_time_provider(mut self, time: Arc<dyn TimeProvider>) -> Self {
        self.time = time;
        self
    }

    /// Resolve a bearer token to the acting user's id
    pub async fn authenticate(&self, token: &str) -> Result<String, NoteServiceError> {
        let user_id = self.auth.authenticate(token).await?;
        Ok(user_id)
    }

    //
    // PUBLIC OPERATIONS
    //

    /// Create a note at the top of its destination partition
    ///
    /// The draft's category picks the partition (regular by default);
    /// every note already there shifts down one rank in the same
    /// transaction.
    pub async fn create_note(
        &self,
        owner_id: &str,
        draft: NoteDraft,
    ) -> Result<Note, NoteServiceError> {
        Self::check_owner_id(owner_id)?;
        draft.validate(&self.config.limits)?;

        if draft.category == NoteCategory::Deleted {
            return Err(NoteServiceError::invalid_category(
                NoteCategory::Deleted.as_str(),
                "new notes cannot be created in the trash",
            ));
        }

        let note = Note::from_draft(owner_id.to_string(), draft, self.time.now());
        let key = note.partition_key();

        let session = self.store.begin_session().await?;
        self.ranks.admit_at_top(&session, &key).await?;

        let mut sealed = note.clone();
        self.seal_note(&mut sealed).await?;
        self.store.insert_note(&session, &sealed).await?;
        session.commit().await?;

        tracing::info!("Created note {} in {}", note.id, key);
        Ok(note)
    }

    /// Fetch one owned note
    pub async fn fetch_note(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> Result<Note, NoteServiceError> {
        Self::check_owner_id(owner_id)?;
        Self::check_note_id(note_id)?;

        let mut note = self
            .store
            .load_note(note_id)
            .await?
            .ok_or_else(|| NoteServiceError::not_found(note_id))?;

        if note.owner_id != owner_id {
            return Err(NoteServiceError::access_denied(note_id));
        }

        self.open_note(&mut note).await?;
        Ok(note)
    }

    /// All notes in one partition, most prominent first
    pub async fn fetch_by_category(
        &self,
        owner_id: &str,
        category: NoteCategory,
    ) -> Result<Vec<Note>, NoteServiceError> {
        Self::check_owner_id(owner_id)?;

        let key = PartitionKey::new(owner_id.to_string(), category);
        let mut notes = self.store.list_partition(&key).await?;
        for note in &mut notes {
            self.open_note(note).await?;
        }

        Ok(notes)
    }

    /// Note totals per category for one owner
    pub async fn category_counts(
        &self,
        owner_id: &str,
    ) -> Result<CategoryCounts, NoteServiceError> {
        Self::check_owner_id(owner_id)?;

        let mut counts = CategoryCounts::default();
        for (category, count) in self.store.category_counts(owner_id).await? {
            counts.set(category, count);
        }

        Ok(counts)
    }

    /// Apply a sparse field update, relocating the note if its category
    /// changes
    ///
    /// An update in which no field actually changes value writes nothing
    /// and leaves the modification timestamp untouched.
    pub async fn update_note(
        &self,
        owner_id: &str,
        note_id: &str,
        patch: NotePatch,
    ) -> Result<Note, NoteServiceError> {
        Self::check_owner_id(owner_id)?;
        Self::check_note_id(note_id)?;
        patch.validate(&self.config.limits)?;

        let session = self.store.begin_session().await?;
        let mut note = self.load_owned(&session, owner_id, note_id).await?;
        self.open_note(&mut note).await?;

        let wrote = self.transition_in_session(&session, &mut note, &patch).await?;
        session.commit().await?;

        if wrote {
            tracing::debug!("Updated note {} ({})", note.id, note.partition_key());
        }
        Ok(note)
    }

    /// Pin a regular note, or unpin a pinned one back to regular
    pub async fn toggle_pin(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> Result<Note, NoteServiceError> {
        self.toggle(owner_id, note_id, Toggle::Pin).await
    }

    /// Archive a note, or restore an archived one to regular
    pub async fn toggle_archive(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> Result<Note, NoteServiceError> {
        self.toggle(owner_id, note_id, Toggle::Archive).await
    }

    /// Soft-delete a note, or restore a deleted one to regular
    pub async fn toggle_delete(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> Result<Note, NoteServiceError> {
        self.toggle(owner_id, note_id, Toggle::Delete).await
    }

    /// Permanently destroy a soft-deleted note and close its gap
    ///
    /// Only notes already in the deleted partition can be destroyed; the
    /// trash partition re-densifies in the same transaction.
    pub async fn purge_note(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> Result<(), NoteServiceError> {
        Self::check_owner_id(owner_id)?;
        Self::check_note_id(note_id)?;

        let session = self.store.begin_session().await?;
        let note = self.load_owned(&session, owner_id, note_id).await?;

        if note.category != NoteCategory::Deleted {
            return Err(NoteServiceError::precondition_failed(format!(
                "note {} must be soft-deleted first",
                note.id
            )));
        }

        let key = note.partition_key();
        let removed = self
            .store
            .delete_note_row(&session, owner_id, &note.id)
            .await?;
        if removed != 1 {
            return Err(NoteServiceError::transaction_conflict(format!(
                "note {} changed during permanent deletion",
                note.id
            )));
        }

        self.ranks.evict(&session, &key, note.rank).await?;
        session.commit().await?;

        tracing::info!("Permanently deleted note {} from {}", note.id, key);
        Ok(())
    }

    /// Permanently destroy every note in the deleted partition
    pub async fn empty_trash(&self, owner_id: &str) -> Result<u64, NoteServiceError> {
        Self::check_owner_id(owner_id)?;

        let key = PartitionKey::new(owner_id.to_string(), NoteCategory::Deleted);
        let session = self.store.begin_session().await?;
        let removed = self.store.delete_partition(&session, &key).await?;
        session.commit().await?;

        tracing::info!("Emptied trash for {} ({} notes)", owner_id, removed);
        Ok(removed)
    }

    /// Apply a caller-supplied total order to one partition
    ///
    /// The batch must name exactly the partition's current membership, with
    /// no duplicates, and fit under the batch ceiling. The rank rewrite is
    /// one conditional bulk update; it aborts unless every named row was
    /// actually rewritten, so a concurrent mutation can never leave a
    /// half-applied order behind. Returns the partition in its new order.
    pub async fn reorder(
        &self,
        owner_id: &str,
        category: NoteCategory,
        ordered_ids: &[String],
    ) -> Result<Vec<Note>, NoteServiceError> {
        Self::check_owner_id(owner_id)?;

        if category == NoteCategory::Deleted {
            return Err(NoteServiceError::invalid_category(
                category.as_str(),
                "the trash cannot be reordered",
            ));
        }
        if ordered_ids.len() > self.config.reorder_batch_limit {
            return Err(NoteServiceError::batch_too_large(
                ordered_ids.len(),
                self.config.reorder_batch_limit,
            ));
        }
        for id in ordered_ids {
            Self::check_note_id(id)?;
        }

        let mut seen = HashSet::with_capacity(ordered_ids.len());
        let mut duplicated: Vec<String> = Vec::new();
        for id in ordered_ids {
            if !seen.insert(id.as_str()) && !duplicated.contains(id) {
                duplicated.push(id.clone());
            }
        }
        if !duplicated.is_empty() {
            return Err(NoteServiceError::SetMismatch {
                missing: Vec::new(),
                unlisted: Vec::new(),
                duplicated,
            });
        }

        let key = PartitionKey::new(owner_id.to_string(), category);
        let session = self.store.begin_session().await?;

        let live_ids = self.store.partition_ids(&session, &key).await?;
        let live: HashSet<&str> = live_ids.iter().map(String::as_str).collect();
        let requested: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();

        let missing: Vec<String> = ordered_ids
            .iter()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect();
        let unlisted: Vec<String> = live_ids
            .iter()
            .filter(|id| !requested.contains(id.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() || !unlisted.is_empty() {
            return Err(NoteServiceError::SetMismatch {
                missing,
                unlisted,
                duplicated: Vec::new(),
            });
        }

        let changed = self.ranks.apply_order(&session, &key, ordered_ids).await?;
        if changed != ordered_ids.len() as u64 {
            tracing::warn!(
                "Reorder of {} applied {} of {} rank updates, aborting",
                key,
                changed,
                ordered_ids.len()
            );
            session.rollback().await?;
            return Err(NoteServiceError::transaction_conflict(format!(
                "expected {} rank updates in {}, applied {}",
                ordered_ids.len(),
                key,
                changed
            )));
        }
        session.commit().await?;

        tracing::info!("Reordered {} ({} notes)", key, changed);
        self.fetch_by_category(owner_id, category).await
    }

    //
    // INTERNALS
    //

    /// One category transition or in-place field update, inside the
    /// caller's transaction
    ///
    /// Same partition: write only when a field actually changed value, so
    /// cosmetic no-op updates never bump the modification timestamp. Cross
    /// partition: open the destination's top slot, close the source's gap,
    /// then write the note at rank 0. Returns whether a row was written.
    async fn transition_in_session(
        &self,
        session: &StoreSession,
        note: &mut Note,
        patch: &NotePatch,
    ) -> Result<bool, NoteServiceError> {
        let old_key = note.partition_key();
        let vacated_rank = note.rank;

        let changed = note.apply_patch(patch, self.time.now());
        let new_key = note.partition_key();

        if new_key == old_key {
            if !changed {
                return Ok(false);
            }
        } else {
            self.ranks
                .relocate(session, &old_key, vacated_rank, &new_key)
                .await?;
            note.rank = 0;
        }

        let mut sealed = note.clone();
        self.seal_note(&mut sealed).await?;
        let updated = self.store.update_note_row(session, &sealed).await?;
        if updated != 1 {
            return Err(NoteServiceError::transaction_conflict(format!(
                "note {} changed during the update",
                note.id
            )));
        }

        Ok(true)
    }

    /// Shared body of the three toggles
    async fn toggle(
        &self,
        owner_id: &str,
        note_id: &str,
        toggle: Toggle,
    ) -> Result<Note, NoteServiceError> {
        Self::check_owner_id(owner_id)?;
        Self::check_note_id(note_id)?;

        let session = self.store.begin_session().await?;
        let mut note = self.load_owned(&session, owner_id, note_id).await?;
        self.open_note(&mut note).await?;

        let destination = toggle.destination(note.category)?;
        let patch = NotePatch::default().with_category(destination);
        self.transition_in_session(&session, &mut note, &patch).await?;
        session.commit().await?;

        tracing::info!("Moved note {} to {}", note.id, note.partition_key());
        Ok(note)
    }

    /// Load a note inside the transaction and enforce ownership
    ///
    /// "No such record" and "owned by someone else" are distinct outcomes;
    /// the lookup is unfiltered so the two can be told apart.
    async fn load_owned(
        &self,
        session: &StoreSession,
        owner_id: &str,
        note_id: &str,
    ) -> Result<Note, NoteServiceError> {
        let note = self
            .store
            .get_note(session, note_id)
            .await?
            .ok_or_else(|| NoteServiceError::not_found(note_id))?;

        if note.owner_id != owner_id {
            return Err(NoteServiceError::access_denied(note_id));
        }

        Ok(note)
    }

    /// Encrypt user-authored text fields in place before a write
    async fn seal_note(&self, note: &mut Note) -> Result<(), NoteServiceError> {
        note.title = self.cipher.encrypt(&note.owner_id, &note.title).await?;
        note.content = self.cipher.encrypt(&note.owner_id, &note.content).await?;

        let mut sealed_labels = Vec::with_capacity(note.labels.len());
        for label in &note.labels {
            sealed_labels.push(self.cipher.encrypt(&note.owner_id, label).await?);
        }
        note.labels = sealed_labels;

        Ok(())
    }

    /// Decrypt user-authored text fields in place after a read
    async fn open_note(&self, note: &mut Note) -> Result<(), NoteServiceError> {
        note.title = self.cipher.decrypt(&note.owner_id, &note.title).await?;
        note.content = self.cipher.decrypt(&note.owner_id, &note.content).await?;

        let mut opened_labels = Vec::with_capacity(note.labels.len());
        for label in &note.labels {
            opened_labels.push(self.cipher.decrypt(&note.owner_id, label).await?);
        }
        note.labels = opened_labels;

        Ok(())
    }

    fn check_owner_id(owner_id: &str) -> Result<(), NoteServiceError> {
        if owner_id.trim().is_empty() {
            return Err(NoteServiceError::invalid_identifier(
                "owner id must not be empty",
            ));
        }
        Ok(())
    }

    fn check_note_id(note_id: &str) -> Result<(), NoteServiceError> {
        if Uuid::parse_str(note_id).is_err() {
            return Err(NoteServiceError::invalid_identifier(format!(
                "'{}' is not a valid note id",
                note_id
            )));
        }
        Ok(())
    }
}

// Policy and flow tests in sibling modules
#[cfg(test)]
#[path = "note_service_test.rs"]
mod note_service_test;

#[cfg(test)]
#[path = "note_service_reorder_test.rs"]
mod note_service_reorder_test;
