//! # symq-db
//!
//! libSQL storage for the symq symbol index.
//!
//! Owns the connection, generates the schema from the column registry, keeps
//! a reusable prepared insert for producers, deletes per-file rows for
//! reindexing, and switches the connection into concurrent mode (WAL,
//! relaxed fsync, busy timeout) so an indexer and a querier can share a file.
//!
//! Uses the `libsql` crate (C `SQLite` fork) against local files only.

pub mod error;
pub mod helpers;
pub mod ingest;
pub mod migrations;
pub mod writer;

use std::time::Duration;

use error::DatabaseError;
use libsql::Builder;

pub use migrations::SYMBOLS_TABLE;
pub use writer::SymbolWriter;

/// Connection options.
#[derive(Debug, Clone, Copy)]
pub struct DbOptions {
    /// WAL journal, `synchronous = NORMAL` and a busy timeout.
    pub concurrent: bool,
    /// Lock-contention retry window handed to the engine.
    pub busy_timeout: Duration,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            concurrent: true,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// Central database handle for the symbol index.
pub struct SymbolDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl SymbolDb {
    /// Open (or create) a local database at the given path.
    ///
    /// Creates the schema on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened, the pragmas
    /// are rejected, or schema creation fails.
    pub async fn open_local(path: &str, options: DbOptions) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let symbol_db = Self { db, conn };
        if options.concurrent {
            symbol_db.enable_concurrency(options.busy_timeout).await?;
        }
        symbol_db.run_migrations().await?;
        Ok(symbol_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Switch to write-ahead logging with reduced fsync and a busy timeout.
    async fn enable_concurrency(&self, busy_timeout: Duration) -> Result<(), DatabaseError> {
        let mode = self.pragma("PRAGMA journal_mode = WAL").await?;
        self.pragma("PRAGMA synchronous = NORMAL").await?;
        self.pragma(&format!("PRAGMA busy_timeout = {}", busy_timeout.as_millis()))
            .await?;
        tracing::debug!(journal_mode = ?mode, "concurrent mode enabled");
        Ok(())
    }

    /// Run a pragma and return its first value, if it produces one.
    async fn pragma(&self, sql: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .conn
            .query(sql, ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("{sql}: {e}")))?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(match row.get_value(0)? {
            libsql::Value::Text(s) => Some(s),
            libsql::Value::Integer(i) => Some(i.to_string()),
            _ => None,
        })
    }

    /// Delete every record of one file, for reindexing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn delete_file(&self, dir: &str, filename: &str) -> Result<u64, DatabaseError> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM symbols WHERE dir = ?1 AND filename = ?2",
                libsql::params![dir, filename],
            )
            .await?;
        tracing::debug!(dir, filename, deleted, "deleted file records");
        Ok(deleted)
    }

    /// Total number of stored records.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the count query fails.
    pub async fn count(&self) -> Result<u64, DatabaseError> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM symbols", ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let count = row.get::<i64>(0)?;
        u64::try_from(count).map_err(|_| DatabaseError::InvalidState(format!("count {count}")))
    }

    /// Start an immediate (write-locking) transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the engine refuses the lock.
    pub async fn begin(&self) -> Result<(), DatabaseError> {
        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        Ok(())
    }

    /// Commit the open transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the commit fails.
    pub async fn commit(&self) -> Result<(), DatabaseError> {
        self.conn.execute("COMMIT", ()).await?;
        Ok(())
    }

    /// Roll back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the rollback fails.
    pub async fn rollback(&self) -> Result<(), DatabaseError> {
        self.conn.execute("ROLLBACK", ()).await?;
        Ok(())
    }
}
