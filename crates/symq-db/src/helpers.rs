//! Row-to-record parsing helpers.
//!
//! Every query that materializes [`SymbolRecord`]s selects
//! [`record_select_list`] so the positional decoding in [`row_to_record`]
//! stays in step with the registry.

use std::collections::BTreeMap;

use symq_core::entities::{AttributeValue, SourceSpan, SymbolRecord};
use symq_core::enums::ContextKind;
use symq_core::schema::{ColumnKind, EXTENSIBLE_COLUMNS};

use crate::error::DatabaseError;

/// Fixed leading columns of [`record_select_list`].
const RECORD_CORE: &[&str] = &[
    "id",
    "search_key",
    "symbol",
    "dir",
    "filename",
    "line",
    "context",
    "source_location",
];

/// Comma-separated column list decoded by [`row_to_record`].
#[must_use]
pub fn record_select_list() -> String {
    RECORD_CORE
        .iter()
        .copied()
        .chain(EXTENSIBLE_COLUMNS.iter().map(|col| col.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode a row selected with [`record_select_list`].
///
/// # Errors
///
/// Returns `DatabaseError::InvalidState` for unknown context codes or
/// out-of-range line numbers, and `DatabaseError::LibSql` for column reads.
pub fn row_to_record(row: &libsql::Row) -> Result<SymbolRecord, DatabaseError> {
    let context_code = row.get::<String>(6)?;
    let context = ContextKind::from_compact(&context_code).ok_or_else(|| {
        DatabaseError::InvalidState(format!("unknown context code '{context_code}'"))
    })?;
    let line = row.get::<i64>(5)?;
    let line = u32::try_from(line)
        .map_err(|_| DatabaseError::InvalidState(format!("line {line} out of range")))?;

    let mut attributes = BTreeMap::new();
    for (offset, col) in EXTENSIBLE_COLUMNS.iter().enumerate() {
        let idx = column_index(RECORD_CORE.len() + offset)?;
        let value = match col.kind {
            ColumnKind::Int => AttributeValue::Int(row.get::<i64>(idx)?),
            ColumnKind::Text { .. } => AttributeValue::Text(row.get::<String>(idx)?),
        };
        attributes.insert(col.name.to_string(), value);
    }

    Ok(SymbolRecord {
        id: row.get::<i64>(0)?,
        search_key: row.get::<String>(1)?,
        symbol: row.get::<String>(2)?,
        dir: row.get::<String>(3)?,
        filename: row.get::<String>(4)?,
        line,
        context,
        span: parse_span(&row.get::<String>(7)?),
        attributes,
    })
}

/// Decode a stored span; empty or malformed spans read as `None`.
#[must_use]
pub fn parse_span(raw: &str) -> Option<SourceSpan> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(span) => Some(span),
        Err(error) => {
            tracing::warn!(%error, "ignoring stored span");
            None
        }
    }
}

/// Convert a positional index to libSQL's `i32` column index.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidState` if the index does not fit.
pub fn column_index(idx: usize) -> Result<i32, DatabaseError> {
    i32::try_from(idx).map_err(|_| DatabaseError::InvalidState(format!("column index {idx}")))
}

/// Read an optional integer aggregate (`NULL` when no rows matched).
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_i64(row: &libsql::Row, idx: i32) -> Result<Option<i64>, DatabaseError> {
    Ok(row.get::<Option<i64>>(idx)?)
}
