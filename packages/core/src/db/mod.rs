//! Database Layer
//!
//! This module handles all SQLite interactions through libsql:
//!
//! - Database initialization, schema setup, and connection management
//! - Transaction sessions over dedicated connections
//! - SQL operations for the `notes` table, including the bulk rank shifts
//!   that keep each partition's ordering dense
//!
//! # Architecture
//!
//! Notegrid uses a single local SQLite database in WAL mode. Every
//! mutating operation runs inside a [`StoreSession`] so that rank
//! bookkeeping and note writes commit or roll back together.

mod database;
mod error;
mod note_store;
mod session;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use note_store::NoteStore;
pub use session::StoreSession;
