//! Query assembly and execution.
//!
//! A [`Selection`] names a table, the search patterns and the filter set;
//! it renders the statements every consumer needs (rows, counts, widths,
//! file listing, copies into the proximity table) from one `WHERE` body, so
//! the presenter's width pass and row pass always see the same rows.

use serde::Serialize;
use symq_core::entities::SymbolRecord;
use symq_core::schema::ColumnDescriptor;
use symq_db::SymbolDb;
use symq_db::helpers::{record_select_list, row_to_record};

use crate::error::QueryError;
use crate::filter::{FilterSet, combine_clauses, pattern_clause, pattern_param};
use crate::query_text::QueryText;

/// Generated SQL plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<libsql::Value>,
}

/// What to read: table, patterns (OR'd) and filters.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    table: &'a str,
    patterns: &'a [String],
    filters: &'a FilterSet,
    extra: Vec<String>,
}

impl<'a> Selection<'a> {
    #[must_use]
    pub const fn new(table: &'a str, patterns: &'a [String], filters: &'a FilterSet) -> Self {
        Self {
            table,
            patterns,
            filters,
            extra: Vec::new(),
        }
    }

    /// Add a pre-escaped clause to the conjunction.
    #[must_use]
    pub fn and(mut self, clause: String) -> Self {
        self.extra.push(clause);
        self
    }

    fn where_body(&self) -> Result<(String, Vec<libsql::Value>), QueryError> {
        let mut clauses = Vec::with_capacity(2 + self.extra.len());
        if !self.patterns.is_empty() {
            clauses.push(pattern_clause(self.patterns.len(), 1));
        }
        clauses.push(self.filters.predicate()?);
        clauses.extend(self.extra.iter().cloned());

        let params = self
            .patterns
            .iter()
            .map(|p| libsql::Value::Text(pattern_param(p)))
            .collect();
        Ok((combine_clauses(&clauses), params))
    }

    fn build(&self, head: &str, tail: &str) -> Result<BuiltQuery, QueryError> {
        let (body, params) = self.where_body()?;
        let mut text = QueryText::new();
        text.push(head)?;
        text.push_fmt(format_args!(" FROM {}", self.table))?;
        if !body.is_empty() {
            text.push(" WHERE ")?;
            text.push(&body)?;
        }
        text.push(tail)?;
        Ok(BuiltQuery {
            sql: text.into_string(),
            params,
        })
    }

    /// Full records in file/line order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the text exceeds the query cap.
    pub fn records(&self) -> Result<BuiltQuery, QueryError> {
        self.build(
            &format!("SELECT {}", record_select_list()),
            " ORDER BY dir, filename, line, id",
        )
    }

    /// Matching row count.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the text exceeds the query cap.
    pub fn count(&self) -> Result<BuiltQuery, QueryError> {
        self.build("SELECT COUNT(*)", "")
    }

    /// Number of distinct search keys among matching rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the text exceeds the query cap.
    pub fn distinct_keys(&self) -> Result<BuiltQuery, QueryError> {
        self.build("SELECT COUNT(DISTINCT search_key)", "")
    }

    /// `MAX(LENGTH(col))` for each given column, in order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the text exceeds the query cap.
    pub fn widths(&self, columns: &[&ColumnDescriptor]) -> Result<BuiltQuery, QueryError> {
        let aggregates: Vec<String> = columns
            .iter()
            .map(|col| format!("MAX(LENGTH({}))", col.name))
            .collect();
        self.build(&format!("SELECT {}", aggregates.join(", ")), "")
    }

    /// Distinct files with their match counts.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the text exceeds the query cap.
    pub fn files(&self) -> Result<BuiltQuery, QueryError> {
        self.build(
            "SELECT dir, filename, COUNT(*)",
            " GROUP BY dir, filename ORDER BY dir, filename",
        )
    }

    /// Copy matching rows into `target` (same shape), skipping ids already
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the text exceeds the query cap.
    pub fn copy_into(&self, target: &str) -> Result<BuiltQuery, QueryError> {
        let list = record_select_list();
        self.build(
            &format!("INSERT OR IGNORE INTO {target} ({list}) SELECT {list}"),
            "",
        )
    }
}

/// One entry of the `--files` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCount {
    pub path: String,
    pub count: u64,
}

/// Executes built queries against one database.
#[derive(Clone, Copy)]
pub struct Searcher<'a> {
    db: &'a SymbolDb,
    debug: bool,
}

impl<'a> Searcher<'a> {
    /// `debug` echoes every generated statement to stderr.
    #[must_use]
    pub const fn new(db: &'a SymbolDb, debug: bool) -> Self {
        Self { db, debug }
    }

    #[must_use]
    pub const fn db(&self) -> &'a SymbolDb {
        self.db
    }

    pub(crate) fn echo(&self, sql: &str) {
        tracing::debug!(sql, "executing query");
        if self.debug {
            eprintln!("{sql}");
        }
    }

    /// Open a row stream.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the statement fails to run.
    pub async fn rows(&self, query: &BuiltQuery) -> Result<libsql::Rows, QueryError> {
        self.echo(&query.sql);
        Ok(self
            .db
            .conn()
            .query(&query.sql, libsql::params_from_iter(query.params.clone()))
            .await?)
    }

    /// Materialize every record of a [`Selection::records`] query.
    ///
    /// # Errors
    ///
    /// Returns the engine error or a decoding error.
    pub async fn records(&self, query: &BuiltQuery) -> Result<Vec<SymbolRecord>, QueryError> {
        let mut rows = self.rows(query).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Run a single-value aggregate.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the statement fails.
    pub async fn scalar(&self, query: &BuiltQuery) -> Result<u64, QueryError> {
        let mut rows = self.rows(query).await?;
        let Some(row) = rows.next().await? else {
            return Ok(0);
        };
        let value = row.get::<Option<i64>>(0)?.unwrap_or(0);
        Ok(u64::try_from(value).unwrap_or(0))
    }

    /// Run a statement that changes rows.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the statement fails.
    pub async fn execute(&self, query: &BuiltQuery) -> Result<u64, QueryError> {
        self.echo(&query.sql);
        Ok(self
            .db
            .conn()
            .execute(&query.sql, libsql::params_from_iter(query.params.clone()))
            .await?)
    }

    /// Per-column maximum lengths (`None` when nothing matched).
    ///
    /// # Errors
    ///
    /// Returns the engine error if the statement fails.
    pub async fn widths(
        &self,
        selection: &Selection<'_>,
        columns: &[&ColumnDescriptor],
    ) -> Result<Vec<Option<usize>>, QueryError> {
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let query = selection.widths(columns)?;
        let mut rows = self.rows(&query).await?;
        let Some(row) = rows.next().await? else {
            return Ok(vec![None; columns.len()]);
        };
        let mut widths = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let idx = symq_db::helpers::column_index(idx)?;
            let value = symq_db::helpers::get_opt_i64(&row, idx)?;
            widths.push(value.and_then(|v| usize::try_from(v).ok()));
        }
        Ok(widths)
    }

    /// Distinct files and their match counts.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the statement fails.
    pub async fn files(&self, selection: &Selection<'_>) -> Result<Vec<FileCount>, QueryError> {
        let mut rows = self.rows(&selection.files()?).await?;
        let mut files = Vec::new();
        while let Some(row) = rows.next().await? {
            let dir = row.get::<String>(0)?;
            let filename = row.get::<String>(1)?;
            files.push(FileCount {
                path: format!("{dir}{filename}"),
                count: u64::try_from(row.get::<i64>(2)?).unwrap_or(0),
            });
        }
        Ok(files)
    }
}
