//! Database error types for symq-db.

use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema creation or upgrade failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// An insert was rejected by the engine.
    #[error("Insert failed for '{symbol}': {message}")]
    Insert { symbol: String, message: String },

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A producer record violated the input contract.
    #[error("Invalid input at line {line}: {message}")]
    Input { line: usize, message: String },

    /// Reading producer input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}
