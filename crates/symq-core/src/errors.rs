//! Cross-cutting error types for symq.
//!
//! Storage and query errors live in their own crates (`DatabaseError`,
//! `QueryError`); the binaries converge everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any symq crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A context category name or compact code was not recognized.
    #[error("unknown context '{0}'")]
    UnknownContext(String),

    /// A column name, flag or alias did not resolve in the schema registry.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// A source span string was not of the form `startRow:startCol-endRow:endCol`.
    #[error("malformed source span '{0}'")]
    MalformedSpan(String),

    /// Data failed validation (format, ranges, constraints).
    #[error("validation error: {0}")]
    Validation(String),
}
