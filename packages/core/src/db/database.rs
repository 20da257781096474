//! Database Connection Management
//!
//! Core connection and schema initialization over libsql for the notes
//! table and its partition index.
//!
//! # Architecture
//!
//! - **Path-agnostic**: accepts any valid `PathBuf`, creating parent
//!   directories as needed
//! - **WAL mode**: Write-Ahead Logging so readers never block the single
//!   writer
//! - **Idempotent init**: `CREATE TABLE IF NOT EXISTS`, safe to run on
//!   every open
//!
//! # Connection Pattern
//!
//! Use `connect_with_timeout()` in async code. It hands out a fresh
//! connection with a 5-second busy timeout, so concurrent writers queue on
//! the lock instead of failing immediately with `SQLITE_BUSY`, and no
//! connection is ever shared across await points by two tasks.
//!
//! ```no_run
//! # use notegrid_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseService::new(PathBuf::from("./data/notes.db")).await?;
//! let conn = db.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service managing the libsql handle and schema
///
/// # Examples
///
/// ```no_run
/// use notegrid_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = DatabaseService::new(PathBuf::from("/path/to/notes.db")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and initialize the schema
    ///
    /// Ensures the parent directory exists, opens the file through the
    /// libsql builder, and runs the idempotent schema setup.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created,
    /// the connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        // A brand-new file gets a WAL checkpoint after schema creation;
        // existing files skip it
        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema(is_new_database).await?;

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so query() must be used instead of
    /// execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize schema and SQLite configuration
    ///
    /// Idempotent: every statement is a `CREATE ... IF NOT EXISTS` or a
    /// PRAGMA, so calling this on an existing database is a no-op.
    ///
    /// # Schema
    ///
    /// - `notes` table: one row per note, category as TEXT, labels as a
    ///   JSON array column
    /// - Partition index on `(owner_id, category, rank)`: every rank shift
    ///   and ordered listing runs against this index
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        // WAL mode for concurrent readers alongside the single writer
        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        // Wait up to 5s on a held write lock instead of failing immediately
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                labels JSON NOT NULL DEFAULT '[]',
                category TEXT NOT NULL DEFAULT 'regular',
                color TEXT NOT NULL DEFAULT 'default',
                rank INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                modified_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create notes table: {}", e))
        })?;

        self.create_core_indexes(&conn).await?;

        // Flush the fresh schema out of the WAL so a database file handed to
        // another handle immediately sees the tables
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Create core indexes for the notes table
    async fn create_core_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        // Partition scans, ordered listings, and rank shifts all filter on
        // (owner_id, category); rank completes the covering order
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notes_partition
             ON notes(owner_id, category, rank)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_notes_partition': {}",
                e
            ))
        })?;

        Ok(())
    }

    /// Get a raw connection without the busy timeout configured
    ///
    /// Only for synchronous contexts; async code should call
    /// `connect_with_timeout()`.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with the 5-second busy timeout configured
    ///
    /// The default choice everywhere in this crate: each operation takes its
    /// own connection, and the timeout makes concurrent writers wait their
    /// turn instead of surfacing spurious lock errors.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        // connect() only creates the handle; actual SQLite work happens on
        // the statements issued later
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        Ok(conn)
    }
}
