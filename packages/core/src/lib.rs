//! Notegrid Core - Ordered Partition Engine
//!
//! This crate provides the data model, storage layer, and services for a
//! personal note-taking backend whose defining feature is dense per-user,
//! per-category ordering: every note holds a rank inside its
//! `(owner, category)` partition, ranks always form an unbroken `0..n`
//! sequence, and every category change or reorder maintains that invariant
//! atomically.
//!
//! # Architecture
//!
//! - **Single category enum**: pinned/archived/deleted are one tagged
//!   state, never independent flags, so mutual exclusivity is structural
//! - **Transactional rank shifts**: bulk `rank + 1` / `rank - 1` updates
//!   commit together with the note write that motivated them
//! - **libsql**: embedded SQLite in WAL mode; concurrent writers serialize
//!   through immediate transactions
//! - **Injected collaborators**: encryption and authentication enter as
//!   trait objects, never as ambient globals
//!
//! # Modules
//!
//! - [`models`] - Data structures (Note, PartitionKey, drafts and patches)
//! - [`services`] - Business services (NoteService, PartitionRanks)
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
