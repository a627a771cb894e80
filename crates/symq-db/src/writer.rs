//! Prepared insert path for producers.
//!
//! One [`SymbolWriter`] holds a single prepared `INSERT`; every call binds a
//! fresh parameter set in registry order and resets the statement.

use symq_core::entities::{AttributeValue, SymbolInput, search_key};
use symq_core::schema::{self, CORE_COLUMNS, ColumnDescriptor, ColumnKind, EXTENSIBLE_COLUMNS};

use crate::SymbolDb;
use crate::error::DatabaseError;

/// Build the insert statement: core columns then extensible columns.
#[must_use]
pub fn insert_sql() -> String {
    let names: Vec<&str> = CORE_COLUMNS
        .iter()
        .chain(EXTENSIBLE_COLUMNS.iter())
        .map(|col| col.name)
        .collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO symbols ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Parameter values for [`insert_sql`], in the same order.
#[must_use]
pub fn insert_values(input: &SymbolInput) -> Vec<libsql::Value> {
    let key = search_key(&input.symbol, input.context);
    let dir = input.normalized_dir();
    let span = input.span.map(|s| s.to_string()).unwrap_or_default();

    let mut values = Vec::with_capacity(CORE_COLUMNS.len() + EXTENSIBLE_COLUMNS.len());
    for col in CORE_COLUMNS {
        let value: libsql::Value = match col.name {
            "search_key" => col.clamp_text(&key).into(),
            "symbol" => col.clamp_text(&input.symbol).into(),
            "dir" => clamp_dir(col, &dir).into(),
            "filename" => col.clamp_text(&input.filename).into(),
            "line" => i64::from(input.line).into(),
            "context" => input.context.compact().into(),
            "source_location" => span.as_str().into(),
            other => {
                tracing::warn!(column = other, "core column without insert mapping");
                libsql::Value::Null
            }
        };
        values.push(value);
    }

    for (col, value) in EXTENSIBLE_COLUMNS.iter().zip(input.attribute_values()) {
        values.push(match col.kind {
            ColumnKind::Int => value.as_int().unwrap_or(0).into(),
            ColumnKind::Text { .. } => match &value {
                AttributeValue::Text(s) => col.clamp_text(s).into(),
                AttributeValue::Int(i) => i.to_string().into(),
            },
        });
    }
    values
}

/// Clamp a normalized directory, keeping the trailing separator that
/// directory suffix filters rely on.
fn clamp_dir(col: &ColumnDescriptor, dir: &str) -> String {
    let clamped = col.clamp_text(dir);
    let mut kept = clamped.to_string();
    if clamped.len() < dir.len() && !clamped.ends_with(['/', '\\']) {
        kept.pop();
        kept.push('/');
    }
    kept
}

/// Reusable prepared insert bound to one connection.
pub struct SymbolWriter {
    insert: libsql::Statement,
    inserted: u64,
}

impl SymbolWriter {
    /// Insert one producer record.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Insert` carrying the engine (or validation)
    /// message; callers treat it as fatal for the load.
    pub async fn insert(&mut self, input: &SymbolInput) -> Result<(), DatabaseError> {
        input.validate().map_err(|e| DatabaseError::Insert {
            symbol: input.symbol.clone(),
            message: e.to_string(),
        })?;

        let values = insert_values(input);
        let result = self.insert.execute(libsql::params_from_iter(values)).await;
        self.insert.reset();
        result.map_err(|e| DatabaseError::Insert {
            symbol: input.symbol.clone(),
            message: e.to_string(),
        })?;
        self.inserted += 1;
        Ok(())
    }

    /// Rows inserted through this writer.
    #[must_use]
    pub const fn inserted(&self) -> u64 {
        self.inserted
    }
}

impl SymbolDb {
    /// Prepare the insert statement.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Query` if the statement cannot be prepared.
    pub async fn writer(&self) -> Result<SymbolWriter, DatabaseError> {
        let insert = self
            .conn
            .prepare(&insert_sql())
            .await
            .map_err(|e| DatabaseError::Query(format!("prepare insert: {e}")))?;
        Ok(SymbolWriter {
            insert,
            inserted: 0,
        })
    }
}

/// Column position of an extensible value in [`insert_values`].
#[must_use]
pub fn insert_position(name: &str) -> Option<usize> {
    schema::position(name).map(|pos| CORE_COLUMNS.len() + pos)
}
