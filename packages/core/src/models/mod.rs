//! Data Models
//!
//! Core data structures for the ordered-partition engine:
//!
//! - `Note` - a user's note with its lifecycle category and partition rank
//! - `PartitionKey` - identity of one `(owner, category)` partition
//! - `NoteDraft` / `NotePatch` - creation and partial-update payloads
//! - `TimeProvider` - injectable clock for deterministic timestamp tests

mod note;
mod partition;
pub mod time;

pub use note::{
    Note, NoteCategory, NoteColor, NoteDraft, NoteLimits, NotePatch, ValidationError,
};
pub use partition::{CategoryCounts, PartitionKey};
pub use time::{SystemTimeProvider, TimeProvider};
