//! Partition Identity
//!
//! A partition is the set of notes sharing one `(owner, category)` pair.
//! Every rank in the system is scoped to exactly one `PartitionKey`; two
//! notes in different partitions never interact through ranks.

use crate::models::note::NoteCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a `(owner, category)` partition
///
/// Pure value: equality and hashing only, no behavior. The dense-rank
/// invariant (ranks form exactly `0..n` for a partition of n notes) is
/// maintained per key by the rank bookkeeping layer.
///
/// # Examples
///
/// ```rust
/// use notegrid_core::models::{NoteCategory, PartitionKey};
///
/// let key = PartitionKey::new("user-1".to_string(), NoteCategory::Pinned);
/// assert_eq!(key, key.clone());
/// assert_ne!(
///     key,
///     PartitionKey::new("user-1".to_string(), NoteCategory::Regular)
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionKey {
    /// Owning user id
    pub owner_id: String,

    /// Lifecycle category
    pub category: NoteCategory,
}

impl PartitionKey {
    /// Create a key for one `(owner, category)` pair
    pub fn new(owner_id: String, category: NoteCategory) -> Self {
        Self { owner_id, category }
    }

    /// All four partitions belonging to one owner
    pub fn all_for_owner(owner_id: &str) -> [PartitionKey; 4] {
        NoteCategory::ALL
            .map(|category| PartitionKey::new(owner_id.to_string(), category))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.category)
    }
}

/// Per-category note totals for one owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub regular: u64,
    pub pinned: u64,
    pub archived: u64,
    pub deleted: u64,
}

impl CategoryCounts {
    /// Store the count for one category
    pub fn set(&mut self, category: NoteCategory, count: u64) {
        match category {
            NoteCategory::Regular => self.regular = count,
            NoteCategory::Pinned => self.pinned = count,
            NoteCategory::Archived => self.archived = count,
            NoteCategory::Deleted => self.deleted = count,
        }
    }

    /// Read the count for one category
    pub fn get(&self, category: NoteCategory) -> u64 {
        match category {
            NoteCategory::Regular => self.regular,
            NoteCategory::Pinned => self.pinned,
            NoteCategory::Archived => self.archived,
            NoteCategory::Deleted => self.deleted,
        }
    }

    /// Total across all categories
    pub fn total(&self) -> u64 {
        self.regular + self.pinned + self.archived + self.deleted
    }
}
