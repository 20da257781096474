//! Note Data Structures
//!
//! This module defines the core `Note` struct and related types for the
//! ordered-partition engine.
//!
//! # Architecture
//!
//! - **Single category enum**: lifecycle state is one tagged value
//!   (regular/pinned/archived/deleted), never independent booleans, so
//!   mutual exclusivity is structural
//! - **Dense ranks**: every note carries a 0-based rank that is unique and
//!   contiguous within its `(owner, category)` partition; rank 0 is the most
//!   prominent position
//! - **Opaque text**: title, content, and labels hold whatever the injected
//!   cipher produced; nothing in this crate orders or compares on them
//!
//! # Examples
//!
//! ```rust
//! use notegrid_core::models::{Note, NoteCategory};
//!
//! let note = Note::new(
//!     "user-1".to_string(),
//!     "Groceries".to_string(),
//!     "milk, eggs".to_string(),
//! );
//!
//! assert_eq!(note.category, NoteCategory::Regular);
//! assert_eq!(note.rank, 0);
//! ```

use crate::models::partition::PartitionKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for note payloads
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Title too long: {len} chars (limit {max})")]
    TitleTooLong { len: usize, max: usize },

    #[error("Content too long: {len} chars (limit {max})")]
    ContentTooLong { len: usize, max: usize },

    #[error("Too many labels: {count} (limit {max})")]
    TooManyLabels { count: usize, max: usize },

    #[error("Label too long: {len} chars (limit {max})")]
    LabelTooLong { len: usize, max: usize },
}

/// Lifecycle category of a note
///
/// Exactly one category at any instant. Pinned, archived, and deleted are
/// mutually exclusive by construction; there is no state with two flags set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    #[default]
    Regular,
    Pinned,
    Archived,
    Deleted,
}

impl NoteCategory {
    /// All categories, in display-priority order
    pub const ALL: [NoteCategory; 4] = [
        NoteCategory::Pinned,
        NoteCategory::Regular,
        NoteCategory::Archived,
        NoteCategory::Deleted,
    ];

    /// Storage/wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteCategory::Regular => "regular",
            NoteCategory::Pinned => "pinned",
            NoteCategory::Archived => "archived",
            NoteCategory::Deleted => "deleted",
        }
    }

    /// Parse a storage/wire name back into a category
    pub fn parse(s: &str) -> Option<NoteCategory> {
        match s {
            "regular" => Some(NoteCategory::Regular),
            "pinned" => Some(NoteCategory::Pinned),
            "archived" => Some(NoteCategory::Archived),
            "deleted" => Some(NoteCategory::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display color from the fixed palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Indigo,
    Purple,
    Pink,
    Brown,
    Gray,
}

impl NoteColor {
    /// Storage/wire name of the color
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteColor::Default => "default",
            NoteColor::Red => "red",
            NoteColor::Orange => "orange",
            NoteColor::Yellow => "yellow",
            NoteColor::Green => "green",
            NoteColor::Teal => "teal",
            NoteColor::Blue => "blue",
            NoteColor::Indigo => "indigo",
            NoteColor::Purple => "purple",
            NoteColor::Pink => "pink",
            NoteColor::Brown => "brown",
            NoteColor::Gray => "gray",
        }
    }

    /// Parse a storage/wire name back into a palette color
    pub fn parse(s: &str) -> Option<NoteColor> {
        match s {
            "default" => Some(NoteColor::Default),
            "red" => Some(NoteColor::Red),
            "orange" => Some(NoteColor::Orange),
            "yellow" => Some(NoteColor::Yellow),
            "green" => Some(NoteColor::Green),
            "teal" => Some(NoteColor::Teal),
            "blue" => Some(NoteColor::Blue),
            "indigo" => Some(NoteColor::Indigo),
            "purple" => Some(NoteColor::Purple),
            "pink" => Some(NoteColor::Pink),
            "brown" => Some(NoteColor::Brown),
            "gray" => Some(NoteColor::Gray),
            _ => None,
        }
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's note
///
/// # Fields
///
/// - `id`: Unique identifier (UUIDv4 string)
/// - `owner_id`: Owning user id; never changes after creation
/// - `title` / `content` / `labels`: Text fields, opaque to the engine
/// - `category`: Lifecycle state (exactly one of the four)
/// - `color`: Display color from the fixed palette
/// - `rank`: 0-based position within the `(owner, category)` partition;
///   unique and contiguous per partition, rank 0 is most prominent
/// - `created_at` / `modified_at`: Timestamps; rank bookkeeping never
///   touches `modified_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier (UUIDv4)
    pub id: String,

    /// Owning user id (opaque, issued by the authenticator)
    pub owner_id: String,

    /// Note title
    pub title: String,

    /// Note body
    pub content: String,

    /// Label strings attached to the note
    #[serde(default)]
    pub labels: Vec<String>,

    /// Lifecycle category
    pub category: NoteCategory,

    /// Display color
    #[serde(default)]
    pub color: NoteColor,

    /// Position within the note's partition (0 = top)
    pub rank: u32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last user-visible modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl Note {
    /// Create a new regular note at rank 0 with an auto-generated UUID
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use notegrid_core::models::Note;
    /// let note = Note::new(
    ///     "user-1".to_string(),
    ///     "Title".to_string(),
    ///     "Body".to_string(),
    /// );
    /// assert_eq!(note.owner_id, "user-1");
    /// ```
    pub fn new(owner_id: String, title: String, content: String) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title,
            content,
            labels: Vec::new(),
            category: NoteCategory::Regular,
            color: NoteColor::Default,
            rank: 0,
            created_at: now,
            modified_at: now,
        }
    }

    /// Create a note from a draft, stamping both timestamps with `now`
    ///
    /// The draft's category is taken as-is; the caller is responsible for
    /// rejecting categories that may not be created into directly.
    pub fn from_draft(owner_id: String, draft: NoteDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title: draft.title,
            content: draft.content,
            labels: draft.labels,
            category: draft.category,
            color: draft.color,
            rank: 0,
            created_at: now,
            modified_at: now,
        }
    }

    /// The `(owner, category)` partition this note currently belongs to
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::new(self.owner_id.clone(), self.category)
    }

    /// Structural validation of identity fields
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }
        if self.owner_id.trim().is_empty() {
            return Err(ValidationError::MissingField("ownerId".to_string()));
        }
        Ok(())
    }

    /// Apply a patch in place, returning whether any field actually changed
    /// value
    ///
    /// `modified_at` is bumped to `now` only when a change occurred.
    /// Re-setting a field to its current value is a no-op: same title, same
    /// color, or a label list that is set-equal to the current one all leave
    /// the note untouched, stored label order included.
    pub fn apply_patch(&mut self, patch: &NotePatch, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if let Some(title) = &patch.title {
            if *title != self.title {
                self.title = title.clone();
                changed = true;
            }
        }

        if let Some(content) = &patch.content {
            if *content != self.content {
                self.content = content.clone();
                changed = true;
            }
        }

        if let Some(labels) = &patch.labels {
            let current: BTreeSet<&str> = self.labels.iter().map(String::as_str).collect();
            let proposed: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
            if current != proposed {
                self.labels = labels.clone();
                changed = true;
            }
        }

        if let Some(color) = patch.color {
            if color != self.color {
                self.color = color;
                changed = true;
            }
        }

        if let Some(category) = patch.category {
            if category != self.category {
                self.category = category;
                changed = true;
            }
        }

        if changed {
            self.modified_at = now;
        }

        changed
    }
}

/// Size limits applied to note payloads before any transaction opens
///
/// Full charset/format validation is the front door's job; these bounds are
/// what the engine itself refuses to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteLimits {
    /// Maximum title length in characters
    pub max_title_chars: usize,
    /// Maximum content length in characters
    pub max_content_chars: usize,
    /// Maximum number of labels per note
    pub max_labels: usize,
    /// Maximum label length in characters
    pub max_label_chars: usize,
}

impl Default for NoteLimits {
    fn default() -> Self {
        Self {
            max_title_chars: 10_000,
            max_content_chars: 100_000,
            max_labels: 100,
            max_label_chars: 500,
        }
    }
}

impl NoteLimits {
    fn check_labels(&self, labels: &[String]) -> Result<(), ValidationError> {
        if labels.len() > self.max_labels {
            return Err(ValidationError::TooManyLabels {
                count: labels.len(),
                max: self.max_labels,
            });
        }
        for label in labels {
            let len = label.chars().count();
            if len > self.max_label_chars {
                return Err(ValidationError::LabelTooLong {
                    len,
                    max: self.max_label_chars,
                });
            }
        }
        Ok(())
    }

    fn check_title(&self, title: &str) -> Result<(), ValidationError> {
        let len = title.chars().count();
        if len > self.max_title_chars {
            return Err(ValidationError::TitleTooLong {
                len,
                max: self.max_title_chars,
            });
        }
        Ok(())
    }

    fn check_content(&self, content: &str) -> Result<(), ValidationError> {
        let len = content.chars().count();
        if len > self.max_content_chars {
            return Err(ValidationError::ContentTooLong {
                len,
                max: self.max_content_chars,
            });
        }
        Ok(())
    }
}

/// Creation payload for a new note
///
/// Defaults to an empty regular note with the default color. Creating
/// directly into the pinned or archived partition is allowed; the service
/// rejects drafts aimed at the deleted partition.
///
/// # Examples
///
/// ```rust
/// # use notegrid_core::models::{NoteCategory, NoteColor, NoteDraft};
/// let draft = NoteDraft::default()
///     .with_title("Reading list".to_string())
///     .with_color(NoteColor::Teal)
///     .with_category(NoteCategory::Pinned);
///
/// assert_eq!(draft.category, NoteCategory::Pinned);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub color: NoteColor,

    #[serde(default)]
    pub category: NoteCategory,
}

impl NoteDraft {
    /// Set the title
    pub fn with_title(mut self, title: String) -> Self {
        self.title = title;
        self
    }

    /// Set the content
    pub fn with_content(mut self, content: String) -> Self {
        self.content = content;
        self
    }

    /// Set the labels
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Set the color
    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = color;
        self
    }

    /// Set the starting category
    pub fn with_category(mut self, category: NoteCategory) -> Self {
        self.category = category;
        self
    }

    /// Check payload bounds against the configured limits
    pub fn validate(&self, limits: &NoteLimits) -> Result<(), ValidationError> {
        limits.check_title(&self.title)?;
        limits.check_content(&self.content)?;
        limits.check_labels(&self.labels)?;
        Ok(())
    }
}

/// Partial note update for PATCH-style operations
///
/// `None` fields are left unchanged. There are no nullable columns on a
/// note, so a plain `Option` per field is sufficient (clearing labels is
/// `Some(vec![])`, not a null).
///
/// # Examples
///
/// ```rust
/// # use notegrid_core::models::{NoteColor, NotePatch};
/// // Recolor only; title/content/labels untouched
/// let patch = NotePatch::default().with_color(NoteColor::Yellow);
/// assert!(!patch.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    /// Replace the title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Replace the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Replace the whole label set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,

    /// Replace the color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<NoteColor>,

    /// Move the note to another category (routes through the transition
    /// coordinator when it differs from the current one)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<NoteCategory>,
}

impl NotePatch {
    /// Replace the title
    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    /// Replace the content
    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }

    /// Replace the label set
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Replace the color
    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Move to another category
    pub fn with_category(mut self, category: NoteCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// True when no field is being updated
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.labels.is_none()
            && self.color.is_none()
            && self.category.is_none()
    }

    /// Check payload bounds against the configured limits
    pub fn validate(&self, limits: &NoteLimits) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            limits.check_title(title)?;
        }
        if let Some(content) = &self.content {
            limits.check_content(content)?;
        }
        if let Some(labels) = &self.labels {
            limits.check_labels(labels)?;
        }
        Ok(())
    }
}

// Patch application policy tests in separate module
#[cfg(test)]
#[path = "note_patch_test.rs"]
mod note_patch_test;
