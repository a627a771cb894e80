//! Per-file table of contents (`--toc`).
//!
//! Definition-class rows (class, enum, type, function) are grouped by file
//! and then by category, sorted by line, and printed as `name .... line`.
//! Import rows are folded into one deduplicated list per file and filename
//! markers make a file appear even when it defines nothing. Caps apply while
//! accumulating: a skipped entry still counts toward the total.

use std::io::Write;

use serde::Serialize;
use symq_core::enums::ContextKind;
use symq_db::SYMBOLS_TABLE;
use symq_db::helpers::row_to_record;

use crate::error::QueryError;
use crate::filter::FilterSet;
use crate::search::{Searcher, Selection};

/// Category order within a file.
pub const TOC_CATEGORIES: [ContextKind; 4] = [
    ContextKind::Class,
    ContextKind::Enum,
    ContextKind::Type,
    ContextKind::Function,
];

/// Caps and layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocOptions {
    pub limit: Option<u64>,
    pub limit_per_file: Option<u64>,
    /// Column the line numbers end at.
    pub leader_width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub name: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocCategory {
    pub context: ContextKind,
    pub entries: Vec<TocEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocFile {
    pub path: String,
    pub imports: Vec<String>,
    pub categories: Vec<TocCategory>,
}

/// Why a TOC came out empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TocDiagnostic {
    /// `-i` asked only for categories the TOC never lists, or `-x` removed
    /// every category it does list.
    IneligibleContexts(Vec<ContextKind>),
    /// Eligible categories, but nothing matched.
    NoDefinitions,
}

impl TocDiagnostic {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::IneligibleContexts(kinds) => {
                let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
                format!(
                    "--toc lists class, enum, type and function definitions; {} not eligible",
                    names.join(", ")
                )
            }
            Self::NoDefinitions => String::from("no definitions matched the file filter"),
        }
    }
}

/// A built table of contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Toc {
    pub files: Vec<TocFile>,
    pub shown: u64,
    pub total: u64,
    pub diagnostic: Option<TocDiagnostic>,
}

impl Toc {
    /// `N definitions in M files`, or `showing X of N ...` when capped.
    #[must_use]
    pub fn summary(&self) -> String {
        let files = self.files.len();
        let file_noun = if files == 1 { "file" } else { "files" };
        if self.shown < self.total {
            format!(
                "showing {} of {} definitions in {files} {file_noun}",
                self.shown, self.total
            )
        } else {
            format!("{} definitions in {files} {file_noun}", self.total)
        }
    }
}

/// Category set for the TOC query: eligible include entries (or every
/// definition category), minus excludes, plus the import/filename markers.
fn toc_contexts(filters: &FilterSet) -> Result<Vec<ContextKind>, TocDiagnostic> {
    let mut kinds: Vec<ContextKind> = if filters.include.is_empty() {
        let remaining: Vec<ContextKind> = TOC_CATEGORIES
            .into_iter()
            .filter(|k| !filters.exclude.contains(k))
            .collect();
        if remaining.is_empty() {
            let left = ContextKind::ALL
                .into_iter()
                .filter(|k| !filters.exclude.contains(k) && !k.is_toc_marker())
                .collect();
            return Err(TocDiagnostic::IneligibleContexts(left));
        }
        remaining
    } else {
        let eligible: Vec<ContextKind> = filters
            .include
            .iter()
            .copied()
            .filter(|k| k.is_toc_definition())
            .collect();
        if eligible.is_empty() {
            return Err(TocDiagnostic::IneligibleContexts(filters.include.clone()));
        }
        eligible
    };
    kinds.extend([ContextKind::Import, ContextKind::Filename]);
    Ok(kinds)
}

struct Accumulator {
    options: TocOptions,
    files: Vec<TocFile>,
    in_file: u64,
    shown: u64,
    total: u64,
}

impl Accumulator {
    fn file(&mut self, path: &str) -> &mut TocFile {
        let is_new = self.files.last().is_none_or(|f| f.path != path);
        if is_new {
            self.in_file = 0;
            self.files.push(TocFile {
                path: path.to_string(),
                imports: Vec::new(),
                categories: Vec::new(),
            });
        }
        let last = self.files.len() - 1;
        &mut self.files[last]
    }

    fn import(&mut self, path: &str, name: &str) {
        let file = self.file(path);
        if !file.imports.iter().any(|i| i == name) {
            file.imports.push(name.to_string());
        }
    }

    fn definition(&mut self, path: &str, context: ContextKind, entry: TocEntry) {
        self.file(path);
        self.total += 1;
        let over_global = self.options.limit.is_some_and(|cap| self.shown >= cap);
        let over_file = self
            .options
            .limit_per_file
            .is_some_and(|cap| self.in_file >= cap);
        if over_global || over_file {
            return;
        }
        self.shown += 1;
        self.in_file += 1;

        let file = self.file(path);
        match file.categories.iter_mut().find(|c| c.context == context) {
            Some(category) => category.entries.push(entry),
            None => file.categories.push(TocCategory {
                context,
                entries: vec![entry],
            }),
        }
    }

    fn finish(mut self) -> Toc {
        for file in &mut self.files {
            file.categories.sort_by_key(|c| {
                TOC_CATEGORIES
                    .iter()
                    .position(|k| *k == c.context)
                    .unwrap_or(TOC_CATEGORIES.len())
            });
            for category in &mut file.categories {
                category.entries.sort_by_key(|e| e.line);
            }
        }
        Toc {
            files: self.files,
            shown: self.shown,
            total: self.total,
            diagnostic: None,
        }
    }
}

impl Searcher<'_> {
    /// Build the table of contents for the files matched by `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] without a file filter, or the
    /// engine error if the query fails.
    pub async fn toc(&self, filters: &FilterSet, options: TocOptions) -> Result<Toc, QueryError> {
        if filters.files.is_empty() {
            return Err(QueryError::InvalidInput(
                "--toc requires at least one -f file pattern".into(),
            ));
        }
        let contexts = match toc_contexts(filters) {
            Ok(contexts) => contexts,
            Err(diagnostic) => {
                return Ok(Toc {
                    diagnostic: Some(diagnostic),
                    ..Toc::default()
                });
            }
        };
        let scoped = FilterSet {
            include: contexts,
            exclude: Vec::new(),
            ..filters.clone()
        };

        let mut acc = Accumulator {
            options,
            files: Vec::new(),
            in_file: 0,
            shown: 0,
            total: 0,
        };
        let mut rows = self
            .rows(&Selection::new(SYMBOLS_TABLE, &[], &scoped).records()?)
            .await?;
        while let Some(row) = rows.next().await? {
            let record = row_to_record(&row)?;
            let path = record.path();
            match record.context {
                ContextKind::Import => acc.import(&path, &record.symbol),
                ContextKind::Filename => {
                    acc.file(&path);
                }
                context => acc.definition(
                    &path,
                    context,
                    TocEntry {
                        name: record.symbol,
                        line: record.line,
                    },
                ),
            }
        }

        let mut toc = acc.finish();
        if toc.total == 0 {
            toc.diagnostic = Some(TocDiagnostic::NoDefinitions);
        }
        Ok(toc)
    }
}

/// `name .... line` padded so the line number ends at `width`.
#[must_use]
pub fn leader_line(indent: usize, name: &str, line: u32, width: usize) -> String {
    let number = line.to_string();
    let used = indent + name.chars().count() + number.len() + 2;
    let dots = width.saturating_sub(used).max(3);
    format!(
        "{}{name} {} {number}",
        " ".repeat(indent),
        ".".repeat(dots)
    )
}

/// Print a TOC as text.
///
/// # Errors
///
/// Returns the write error from `out`.
pub fn render_toc<W: Write>(toc: &Toc, leader_width: usize, out: &mut W) -> std::io::Result<()> {
    for file in &toc.files {
        writeln!(out, "{}", file.path)?;
        if !file.imports.is_empty() {
            writeln!(out, "  imports: {}", file.imports.join(", "))?;
        }
        for category in &file.categories {
            writeln!(out, "  {}", category.context)?;
            for entry in &category.entries {
                writeln!(out, "{}", leader_line(4, &entry.name, entry.line, leader_width))?;
            }
        }
    }
    if let Some(diagnostic) = &toc.diagnostic {
        writeln!(out, "{}", diagnostic.message())?;
    } else {
        writeln!(out)?;
        writeln!(out, "{}", toc.summary())?;
    }
    Ok(())
}
