//! Query error types for symq-query.

use symq_core::errors::CoreError;
use symq_db::error::DatabaseError;

/// Errors from building or running a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Error from the symbol store.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Error from a libSQL call made directly by the query layer.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Generated query text would exceed the hard size cap.
    #[error("query too large: generated text exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// Malformed or conflicting user input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A column name that the registry does not know.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// `--within` named a symbol that has no definition record.
    #[error("no definition found for '{0}'; --within needs every symbol to resolve")]
    MissingDefinition(String),

    /// Reading a source file for context display failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the core types.
    #[error(transparent)]
    Core(#[from] CoreError),
}
