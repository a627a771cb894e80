//! Schema creation.
//!
//! The DDL is generated from the column registry at open time, so the table
//! shape, the insert parameter order and the display code can never disagree.
//! All statements use `IF NOT EXISTS`; extensible columns missing from an
//! older database are added with `ALTER TABLE`.

use symq_core::schema::{CORE_COLUMNS, EXTENSIBLE_COLUMNS};

use crate::SymbolDb;
use crate::error::DatabaseError;

/// Main symbol table.
pub const SYMBOLS_TABLE: &str = "symbols";

/// Build the `CREATE TABLE` statement for a table with the symbol shape.
#[must_use]
pub fn create_table_sql(table: &str, temporary: bool) -> String {
    let mut columns = vec![String::from("id INTEGER PRIMARY KEY")];
    columns.extend(
        CORE_COLUMNS
            .iter()
            .chain(EXTENSIBLE_COLUMNS.iter())
            .map(|col| {
                format!(
                    "{} {} NOT NULL DEFAULT {}",
                    col.name,
                    col.kind.sql_type(),
                    col.kind.sql_default()
                )
            }),
    );
    let temp = if temporary { "TEMP " } else { "" };
    format!(
        "CREATE {temp}TABLE IF NOT EXISTS {table} (\n    {}\n)",
        columns.join(",\n    ")
    )
}

fn index_sql() -> String {
    [
        "CREATE INDEX IF NOT EXISTS idx_symbols_search_key ON symbols(search_key)",
        "CREATE INDEX IF NOT EXISTS idx_symbols_symbol ON symbols(symbol)",
        "CREATE INDEX IF NOT EXISTS idx_symbols_location ON symbols(dir, filename, line)",
        "CREATE INDEX IF NOT EXISTS idx_symbols_context ON symbols(context)",
    ]
    .join(";\n")
}

impl SymbolDb {
    /// Create the symbol table and indexes if they do not exist yet.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(&create_table_sql(SYMBOLS_TABLE, false))
            .await
            .map_err(|e| DatabaseError::Migration(format!("create {SYMBOLS_TABLE}: {e}")))?;
        self.add_missing_columns().await?;
        self.conn
            .execute_batch(&index_sql())
            .await
            .map_err(|e| DatabaseError::Migration(format!("create indexes: {e}")))?;
        Ok(())
    }

    /// Add registry columns an older database file does not have yet.
    async fn add_missing_columns(&self) -> Result<(), DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT name FROM pragma_table_info(?1)",
                [SYMBOLS_TABLE],
            )
            .await
            .map_err(|e| DatabaseError::Migration(format!("inspect {SYMBOLS_TABLE}: {e}")))?;
        let mut existing = Vec::new();
        while let Some(row) = rows.next().await? {
            existing.push(row.get::<String>(0)?);
        }

        for col in EXTENSIBLE_COLUMNS {
            if existing.iter().any(|name| name.eq_ignore_ascii_case(col.name)) {
                continue;
            }
            tracing::debug!(column = col.name, "adding missing extensible column");
            self.conn
                .execute(
                    &format!(
                        "ALTER TABLE {SYMBOLS_TABLE} ADD COLUMN {} {} NOT NULL DEFAULT {}",
                        col.name,
                        col.kind.sql_type(),
                        col.kind.sql_default()
                    ),
                    (),
                )
                .await
                .map_err(|e| DatabaseError::Migration(format!("add column {}: {e}", col.name)))?;
        }
        Ok(())
    }

    /// Drop and recreate a connection-scoped scratch table with the symbol shape.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Migration` with the engine message on failure.
    pub async fn recreate_temp_table(&self, table: &str) -> Result<(), DatabaseError> {
        let sql = format!(
            "DROP TABLE IF EXISTS temp.{table};\n{}",
            create_table_sql(table, true)
        );
        self.conn
            .execute_batch(&sql)
            .await
            .map_err(|e| DatabaseError::Migration(format!("recreate temp.{table}: {e}")))?;
        Ok(())
    }
}
