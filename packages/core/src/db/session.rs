//! Transaction Scope Handle
//!
//! A `StoreSession` is one open transaction on its own dedicated
//! connection. Store operations that participate in a transaction take a
//! `&StoreSession`; `commit()` and `rollback()` consume the session, so a
//! finished transaction cannot be used again.
//!
//! Release is guaranteed on every exit path: dropping an uncommitted
//! session drops its connection, and SQLite discards the open transaction
//! when the connection closes. Error paths may also call `rollback()` for
//! an immediate, explicit abort.

use crate::db::error::DatabaseError;

/// One open transaction over a dedicated connection
pub struct StoreSession {
    conn: libsql::Connection,
    finished: bool,
}

impl StoreSession {
    /// Begin a transaction on `conn`
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front; concurrent writers
    /// queue on the busy timeout instead of deadlocking on a later lock
    /// upgrade.
    pub(crate) async fn begin(conn: libsql::Connection) -> Result<Self, DatabaseError> {
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// The connection this transaction runs on
    pub(crate) fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Commit the transaction, consuming the session
    ///
    /// On a failed COMMIT a best-effort ROLLBACK is issued before the error
    /// is returned.
    pub async fn commit(mut self) -> Result<(), DatabaseError> {
        self.finished = true;

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            let _rollback = self.conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }

        Ok(())
    }

    /// Abort the transaction, consuming the session
    pub async fn rollback(mut self) -> Result<(), DatabaseError> {
        self.finished = true;

        self.conn.execute("ROLLBACK", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to roll back transaction: {}", e))
        })?;

        Ok(())
    }
}

impl Drop for StoreSession {
    fn drop(&mut self) {
        if !self.finished {
            // Connection teardown discards the open transaction
            tracing::debug!("store session dropped without commit; transaction discarded");
        }
    }
}
