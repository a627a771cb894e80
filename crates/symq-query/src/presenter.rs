//! Result presentation.
//!
//! Column selection produces a request-scoped [`ActiveColumns`]. Rendering
//! runs in two passes over the same [`Selection`]: an aggregate pass sizes
//! each text column to `max(header, longest value)`, then rows are streamed
//! and printed pipe-separated. The all-columns mode skips the first pass and
//! uses the registry's fixed widths instead.

use std::io::Write;

use serde::Serialize;
use symq_core::entities::SymbolRecord;
use symq_core::schema::{
    self, CORE_COLUMNS, ColumnDescriptor, EXTENSIBLE_COLUMNS, HeaderStyle,
};
use symq_db::helpers::row_to_record;

use crate::error::QueryError;
use crate::filter::FilterSet;
use crate::search::{Searcher, Selection};
use crate::source::{ContextLines, SourceReader, highlight, highlight_terms};

const SEPARATOR: &str = " | ";

// ---------------------------------------------------------------------------
// Column selection
// ---------------------------------------------------------------------------

/// How the column set is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnChoice {
    /// Line, symbol, filtered/shown extensible columns, context.
    #[default]
    Default,
    /// Exactly these columns, in this order (`--columns a b`).
    Explicit(Vec<&'static ColumnDescriptor>),
    /// Every core and extensible column at fixed width (`--columns all`).
    All,
}

impl ColumnChoice {
    /// Parse `--columns` values.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownColumn`] for names the registry does not
    /// know.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, QueryError> {
        if names.is_empty() {
            return Ok(Self::Default);
        }
        if names.iter().any(|n| n.as_ref().eq_ignore_ascii_case("all")) {
            return Ok(Self::All);
        }
        names
            .iter()
            .map(|name| {
                schema::lookup_any(name.as_ref())
                    .ok_or_else(|| QueryError::UnknownColumn(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Explicit)
    }
}

/// Display settings for one query.
#[derive(Debug, Clone, Default)]
pub struct DisplayOptions {
    pub verbose: bool,
    pub columns: ColumnChoice,
    /// Extensible columns requested with `--show-*`.
    pub show: Vec<&'static str>,
    pub header_style: HeaderStyle,
    pub limit: Option<u64>,
    pub limit_per_file: Option<u64>,
    pub context: Option<ContextLines>,
    pub expand: bool,
    /// Emit ANSI highlighting in context lines.
    pub color: bool,
}

/// One candidate column and whether it is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveColumn {
    pub descriptor: &'static ColumnDescriptor,
    pub enabled: bool,
}

/// Ordered column list for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveColumns {
    columns: Vec<ActiveColumn>,
    fixed_width: bool,
}

fn core(name: &str) -> Result<&'static ColumnDescriptor, QueryError> {
    schema::core_column(name).ok_or_else(|| QueryError::UnknownColumn(name.to_string()))
}

impl ActiveColumns {
    /// Apply the selection rules.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownColumn`] if a core column is missing
    /// from the registry.
    pub fn select(options: &DisplayOptions, filters: &FilterSet) -> Result<Self, QueryError> {
        let enabled = |descriptor| ActiveColumn {
            descriptor,
            enabled: true,
        };
        match &options.columns {
            ColumnChoice::All => Ok(Self {
                columns: CORE_COLUMNS
                    .iter()
                    .chain(EXTENSIBLE_COLUMNS.iter())
                    .map(enabled)
                    .collect(),
                fixed_width: true,
            }),
            ColumnChoice::Explicit(list) => Ok(Self {
                columns: list.iter().copied().map(enabled).collect(),
                fixed_width: false,
            }),
            ColumnChoice::Default => {
                let mut columns = vec![enabled(core("line")?), enabled(core("symbol")?)];
                columns.extend(EXTENSIBLE_COLUMNS.iter().map(|col| ActiveColumn {
                    descriptor: col,
                    enabled: options.verbose
                        || filters.has_column_filter(col.name)
                        || options.show.contains(&col.name),
                }));
                columns.push(enabled(core("context")?));
                Ok(Self {
                    columns,
                    fixed_width: false,
                })
            }
        }
    }

    /// Displayed columns in order.
    pub fn enabled(&self) -> impl Iterator<Item = &'static ColumnDescriptor> + '_ {
        self.columns
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.descriptor)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.enabled().map(|c| c.name).collect()
    }

    #[must_use]
    pub const fn is_fixed_width(&self) -> bool {
        self.fixed_width
    }
}

/// Text of a record's cell for a column.
#[must_use]
pub fn cell(record: &SymbolRecord, column: &ColumnDescriptor) -> String {
    match column.name {
        "search_key" => record.search_key.clone(),
        "symbol" => record.symbol.clone(),
        "dir" => record.dir.clone(),
        "filename" => record.filename.clone(),
        "line" => record.line.to_string(),
        "context" => record.context.compact().to_string(),
        "source_location" => record.span.map(|s| s.to_string()).unwrap_or_default(),
        name => record
            .attribute(name)
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        value.to_string()
    } else {
        format!("{value}{}", " ".repeat(width - len))
    }
}

fn fit(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        value.chars().take(width).collect()
    } else {
        pad(value, width)
    }
}

// ---------------------------------------------------------------------------
// Layout and rendering
// ---------------------------------------------------------------------------

/// Resolved column widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub columns: Vec<(&'static ColumnDescriptor, usize)>,
    fixed: bool,
}

impl Layout {
    fn header(&self, style: HeaderStyle) -> String {
        self.columns
            .iter()
            .map(|(col, width)| pad(col.header_for(style), *width))
            .collect::<Vec<_>>()
            .join(SEPARATOR)
            .trim_end()
            .to_string()
    }

    fn rule(&self) -> String {
        let total: usize = self.columns.iter().map(|(_, w)| *w).sum::<usize>()
            + SEPARATOR.len() * self.columns.len().saturating_sub(1);
        "-".repeat(total)
    }

    fn row(&self, record: &SymbolRecord) -> String {
        self.columns
            .iter()
            .map(|(col, width)| {
                let value = cell(record, col);
                if self.fixed {
                    fit(&value, *width)
                } else {
                    pad(&value, *width)
                }
            })
            .collect::<Vec<_>>()
            .join(SEPARATOR)
            .trim_end()
            .to_string()
    }
}

/// Counts reported after rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    pub total: u64,
    pub shown: u64,
}

impl RenderSummary {
    /// `N matches` or `showing X of N matches`.
    #[must_use]
    pub fn line(&self) -> String {
        let noun = if self.total == 1 { "match" } else { "matches" };
        if self.shown < self.total {
            format!("showing {} of {} {noun}", self.shown, self.total)
        } else {
            format!("{} {noun}", self.total)
        }
    }
}

/// Rows as serialized for `--format json`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub total: u64,
    pub shown: u64,
    pub columns: Vec<&'static str>,
    pub rows: Vec<SymbolRecord>,
}

/// Global and per-file caps applied while streaming.
struct Caps {
    limit: Option<u64>,
    per_file: Option<u64>,
    shown: u64,
    file: Option<String>,
    in_file: u64,
}

impl Caps {
    const fn new(options: &DisplayOptions) -> Self {
        Self {
            limit: options.limit,
            per_file: options.limit_per_file,
            shown: 0,
            file: None,
            in_file: 0,
        }
    }

    fn exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.shown >= limit)
    }

    /// Returns `(accepted, starts_new_file)`.
    fn admit(&mut self, path: &str) -> (bool, bool) {
        let new_file = self.file.as_deref() != Some(path);
        if new_file {
            self.file = Some(path.to_string());
            self.in_file = 0;
        }
        if self.per_file.is_some_and(|cap| self.in_file >= cap) {
            return (false, new_file);
        }
        self.in_file += 1;
        self.shown += 1;
        (true, new_file)
    }
}

/// Renders one query's rows.
pub struct Presenter<'a> {
    searcher: Searcher<'a>,
    options: &'a DisplayOptions,
    terms: Vec<String>,
}

impl<'a> Presenter<'a> {
    /// `patterns` are used for highlighting context lines.
    #[must_use]
    pub fn new(searcher: Searcher<'a>, options: &'a DisplayOptions, patterns: &[String]) -> Self {
        Self {
            searcher,
            options,
            terms: highlight_terms(patterns),
        }
    }

    /// Width pass.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the aggregate query fails.
    pub async fn layout(
        &self,
        selection: &Selection<'_>,
        active: &ActiveColumns,
    ) -> Result<Layout, QueryError> {
        let style = self.options.header_style;
        let columns: Vec<&'static ColumnDescriptor> = active.enabled().collect();

        if active.is_fixed_width() {
            return Ok(Layout {
                columns: columns
                    .into_iter()
                    .map(|col| (col, col.width.max(col.header_for(style).len())))
                    .collect(),
                fixed: true,
            });
        }

        let measured: Vec<&'static ColumnDescriptor> =
            columns.iter().copied().filter(|c| c.name != "line").collect();
        let observed = self.searcher.widths(selection, &measured).await?;

        let columns = columns
            .into_iter()
            .map(|col| {
                let header = col.header_for(style).chars().count();
                let width = if col.name == "line" {
                    col.width.max(header)
                } else {
                    let longest = measured
                        .iter()
                        .position(|m| m.name == col.name)
                        .and_then(|idx| observed.get(idx).copied().flatten())
                        .unwrap_or(0);
                    header.max(longest)
                };
                (col, width)
            })
            .collect();
        Ok(Layout {
            columns,
            fixed: false,
        })
    }

    /// Render the table (or nothing when no row matches).
    ///
    /// # Errors
    ///
    /// Returns a query error or the write error from `out`.
    pub async fn render<W: Write>(
        &self,
        selection: &Selection<'_>,
        active: &ActiveColumns,
        out: &mut W,
    ) -> Result<RenderSummary, QueryError> {
        let total = self.searcher.scalar(&selection.count()?).await?;
        if total == 0 {
            return Ok(RenderSummary::default());
        }

        let layout = self.layout(selection, active).await?;
        writeln!(out, "{}", layout.header(self.options.header_style))?;
        writeln!(out, "{}", layout.rule())?;

        let mut caps = Caps::new(self.options);
        let mut reader = SourceReader::new();
        let mut rows = self.searcher.rows(&selection.records()?).await?;
        while let Some(row) = rows.next().await? {
            if caps.exhausted() {
                break;
            }
            let record = row_to_record(&row)?;
            let path = record.path();
            let (accepted, new_file) = caps.admit(&path);
            if new_file {
                writeln!(out, "{path}")?;
            }
            if !accepted {
                continue;
            }
            writeln!(out, "{}", layout.row(&record))?;
            self.write_source(&mut reader, &record, out)?;
        }

        let summary = RenderSummary {
            total,
            shown: caps.shown,
        };
        writeln!(out)?;
        writeln!(out, "{}", summary.line())?;
        Ok(summary)
    }

    /// Expansion wins over context lines for definitions.
    fn write_source<W: Write>(
        &self,
        reader: &mut SourceReader,
        record: &SymbolRecord,
        out: &mut W,
    ) -> Result<(), QueryError> {
        let path = record.path();
        let lines = match (self.options.expand && record.is_definition(), record.span) {
            (true, Some(span)) => reader.range(&path, span.start_row, span.end_row),
            _ => match self.options.context {
                Some(context) => reader.around(&path, record.line, context),
                None => return Ok(()),
            },
        };
        let lines = match lines {
            Ok(lines) => lines,
            Err(error) => {
                tracing::warn!(path, %error, "cannot show source lines");
                return Ok(());
            }
        };
        for line in lines {
            let marker = if line.number == record.line { '>' } else { ' ' };
            let text = if self.options.color {
                highlight(&line.text, &self.terms)
            } else {
                line.text
            };
            writeln!(out, "{marker}{:>6}: {text}", line.number)?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// Collect rows for structured output, honoring the same caps.
    ///
    /// # Errors
    ///
    /// Returns a query or decoding error.
    pub async fn collect(
        &self,
        selection: &Selection<'_>,
        active: &ActiveColumns,
    ) -> Result<QueryReport, QueryError> {
        let total = self.searcher.scalar(&selection.count()?).await?;
        let mut caps = Caps::new(self.options);
        let mut collected = Vec::new();
        let mut rows = self.searcher.rows(&selection.records()?).await?;
        while let Some(row) = rows.next().await? {
            if caps.exhausted() {
                break;
            }
            let record = row_to_record(&row)?;
            if caps.admit(&record.path()).0 {
                collected.push(record);
            }
        }
        Ok(QueryReport {
            total,
            shown: caps.shown,
            columns: active.names(),
            rows: collected,
        })
    }
}
