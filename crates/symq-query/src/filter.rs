//! Filter composition.
//!
//! A [`FilterSet`] is built once per query and rendered into one boolean
//! predicate. Every user value that ends up inside SQL text goes through
//! [`sql_quote`] here; search patterns are the only values bound as
//! parameters (see [`pattern_clause`]).
//!
//! Composition is a conjunction of:
//! - file patterns (OR across entries),
//! - line range,
//! - within-scope ranges (OR across ranges),
//! - context include, or context exclude when no include is given,
//! - one OR-list per filtered extensible column.
//!
//! The include list overrides the exclude list: when both are present the
//! exclude list is dropped entirely.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use symq_core::entities::normalize_dir;
use symq_core::enums::ContextKind;
use symq_core::schema::{self, ColumnDescriptor, ColumnKind, EXTENSIBLE_COLUMNS};

use crate::error::QueryError;
use crate::query_text::QueryText;

// ---------------------------------------------------------------------------
// Escaping and pattern conversion
// ---------------------------------------------------------------------------

/// Quote a literal for embedding in SQL text (single quotes doubled).
#[must_use]
pub fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Convert a glob into a `LIKE` pattern using `\` as the escape character.
///
/// `*` becomes `%`, `.` becomes `_`. Native `%` and `_` pass through as
/// wildcards. `\*` and `\.` produce the literal character; `\%`, `\_` and
/// `\\` produce an escaped literal.
#[must_use]
pub fn glob_to_like(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 4);
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(e @ ('*' | '.')) => out.push(e),
                Some(e @ ('%' | '_' | '\\')) => {
                    out.push('\\');
                    out.push(e);
                }
                Some(other) => {
                    out.push_str("\\\\");
                    push_glob_char(&mut out, other);
                }
                None => out.push_str("\\\\"),
            },
            other => push_glob_char(&mut out, other),
        }
    }
    out
}

fn push_glob_char(out: &mut String, c: char) {
    match c {
        '*' => out.push('%'),
        '.' => out.push('_'),
        other => out.push(other),
    }
}

/// Whether a pattern contains an unescaped multi-character wildcard.
#[must_use]
pub fn has_wildcard(pattern: &str) -> bool {
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '*' | '%' => return true,
            _ => {}
        }
    }
    false
}

/// Pattern text with escapes and wildcards removed, for length checks and
/// highlighting.
#[must_use]
pub fn literal_text(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '*' | '%' => {}
            other => out.push(other),
        }
    }
    out
}

/// Search pattern as bound against `search_key`: lowercased `LIKE` text.
#[must_use]
pub fn pattern_param(pattern: &str) -> String {
    glob_to_like(&pattern.to_lowercase())
}

/// `(search_key LIKE ?a ESCAPE '\' OR ...)` with placeholders starting at
/// `first_param`.
#[must_use]
pub fn pattern_clause(count: usize, first_param: usize) -> String {
    let parts: Vec<String> = (first_param..first_param + count)
        .map(|idx| format!("search_key LIKE ?{idx} ESCAPE '\\'"))
        .collect();
    format!("({})", parts.join(" OR "))
}

fn like_literal(column: &str, glob: &str) -> String {
    format!("{column} LIKE {} ESCAPE '\\'", sql_quote(&glob_to_like(glob)))
}

// ---------------------------------------------------------------------------
// Filter pieces
// ---------------------------------------------------------------------------

/// `-l N` or `-l N-M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineRange {
    Single(u32),
    Span { start: u32, end: u32 },
}

impl FromStr for LineRange {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            QueryError::InvalidInput(format!(
                "bad line range '{s}': expected N or N-M with 1 <= N <= M"
            ))
        };
        let num = |part: &str| part.trim().parse::<u32>().map_err(|_| invalid());
        let range = match s.split_once('-') {
            Some((start, end)) => Self::Span {
                start: num(start)?,
                end: num(end)?,
            },
            None => Self::Single(num(s)?),
        };
        match range {
            Self::Single(0) => Err(invalid()),
            Self::Span { start, end } if start == 0 || end < start => Err(invalid()),
            valid => Ok(valid),
        }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(line) => write!(f, "{line}"),
            Self::Span { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

/// One `-f` entry: optional directory glob plus filename glob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePattern {
    pub dir: Option<String>,
    pub file: String,
}

impl FromStr for FilePattern {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(QueryError::InvalidInput("empty file pattern".into()));
        }
        Ok(match s.rsplit_once('/') {
            Some((dir, file)) => Self {
                dir: Some(if dir.is_empty() { "/".into() } else { dir.into() }),
                file: if file.is_empty() { "*".into() } else { file.into() },
            },
            None => Self {
                dir: None,
                file: s.into(),
            },
        })
    }
}

impl FilePattern {
    fn clause(&self) -> String {
        let file = like_literal("filename", &self.file);
        let Some(dir) = &self.dir else {
            return file;
        };
        let dir = normalize_dir(dir.strip_prefix("./").unwrap_or(dir));
        let dir_clause = if dir.starts_with('/') {
            like_literal("dir", &dir)
        } else {
            format!(
                "({} OR {})",
                like_literal("dir", &dir),
                like_literal("dir", &format!("*/{dir}"))
            )
        };
        format!("({dir_clause} AND {file})")
    }
}

/// Line range enclosed by one resolved definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeRange {
    pub dir: String,
    pub filename: String,
    pub start: u32,
    pub end: u32,
}

impl ScopeRange {
    fn clause(&self) -> String {
        format!(
            "(dir = {} AND filename = {} AND line BETWEEN {} AND {})",
            sql_quote(&self.dir),
            sql_quote(&self.filename),
            self.start,
            self.end
        )
    }
}

// ---------------------------------------------------------------------------
// FilterSet
// ---------------------------------------------------------------------------

/// Every filter for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSet {
    pub include: Vec<ContextKind>,
    pub exclude: Vec<ContextKind>,
    pub files: Vec<FilePattern>,
    pub line: Option<LineRange>,
    pub within: Vec<ScopeRange>,
    /// Requested values per extensible column, keyed by registry name.
    pub columns: BTreeMap<&'static str, Vec<String>>,
}

impl FilterSet {
    /// Add filter values for an extensible column, resolved through the
    /// registry. Integer columns reject non-numeric values.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownColumn`] for names the registry does not
    /// know and [`QueryError::InvalidInput`] for bad integer values.
    pub fn add_column_values<S: AsRef<str>>(
        &mut self,
        name: &str,
        values: &[S],
    ) -> Result<(), QueryError> {
        let col = schema::lookup(name).ok_or_else(|| QueryError::UnknownColumn(name.into()))?;
        if col.kind == ColumnKind::Int {
            if let Some(bad) = values
                .iter()
                .map(AsRef::as_ref)
                .find(|v| v.trim().parse::<i64>().is_err())
            {
                return Err(QueryError::InvalidInput(format!(
                    "--{} expects integers, got '{bad}'",
                    col.name
                )));
            }
        }
        self.columns
            .entry(col.name)
            .or_default()
            .extend(values.iter().map(|v| v.as_ref().to_string()));
        Ok(())
    }

    /// Whether a column carries at least one filter value.
    #[must_use]
    pub fn has_column_filter(&self, name: &str) -> bool {
        self.columns.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Exclude list after applying include precedence.
    #[must_use]
    pub fn effective_exclude(&self) -> &[ContextKind] {
        if self.include.is_empty() {
            &self.exclude
        } else {
            &[]
        }
    }

    /// Render the predicate; empty when no filter is set.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TooLarge`] if the text exceeds the query cap.
    pub fn predicate(&self) -> Result<String, QueryError> {
        let mut clauses: Vec<String> = Vec::new();

        if !self.files.is_empty() {
            let parts: Vec<String> = self.files.iter().map(FilePattern::clause).collect();
            clauses.push(format!("({})", parts.join(" OR ")));
        }

        match self.line {
            Some(LineRange::Single(line)) => clauses.push(format!("line = {line}")),
            Some(LineRange::Span { start, end }) => {
                clauses.push(format!("line BETWEEN {start} AND {end}"));
            }
            None => {}
        }

        if !self.within.is_empty() {
            let parts: Vec<String> = self.within.iter().map(ScopeRange::clause).collect();
            clauses.push(format!("({})", parts.join(" OR ")));
        }

        if !self.include.is_empty() {
            clauses.push(format!("context IN ({})", context_list(&self.include)));
        } else if !self.exclude.is_empty() {
            clauses.push(format!("context NOT IN ({})", context_list(&self.exclude)));
        }

        for col in EXTENSIBLE_COLUMNS {
            if let Some(values) = self.columns.get(col.name).filter(|v| !v.is_empty()) {
                clauses.push(column_clause(col, values));
            }
        }

        let mut text = QueryText::new();
        text.push_joined(&clauses, " AND ")?;
        Ok(text.into_string())
    }
}

fn context_list(kinds: &[ContextKind]) -> String {
    kinds
        .iter()
        .map(|kind| sql_quote(kind.compact()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_clause(col: &ColumnDescriptor, values: &[String]) -> String {
    let parts: Vec<String> = values
        .iter()
        .map(|value| match col.kind {
            ColumnKind::Int => format!("{} = {}", col.name, value.trim()),
            ColumnKind::Text { .. } => like_literal(col.name, value),
        })
        .collect();
    format!("({})", parts.join(" OR "))
}

/// Combine pattern and filter clauses into a `WHERE` body (may be empty).
#[must_use]
pub fn combine_clauses(clauses: &[String]) -> String {
    clauses
        .iter()
        .filter(|c| !c.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("handle*", "handle%")]
    #[case("*.c", "%_c")]
    #[case("a\\*b", "a*b")]
    #[case("a\\.b", "a.b")]
    #[case("100\\%", "100\\%")]
    #[case("snake\\_case", "snake\\_case")]
    #[case("back\\\\slash", "back\\\\slash")]
    #[case("raw_%", "raw_%")]
    fn glob_conversion(#[case] glob: &str, #[case] like: &str) {
        assert_eq!(glob_to_like(glob), like);
    }

    #[test]
    fn quoting_doubles_single_quotes() {
        assert_eq!(sql_quote("it's"), "'it''s'");
    }

    #[rstest]
    #[case("handle*", true)]
    #[case("%req", true)]
    #[case("a\\*b", false)]
    #[case("plain", false)]
    #[case("a.c", false)]
    fn wildcard_detection(#[case] pattern: &str, #[case] expected: bool) {
        assert_eq!(has_wildcard(pattern), expected);
    }

    #[test]
    fn line_range_parsing() {
        assert_eq!("12".parse::<LineRange>().unwrap(), LineRange::Single(12));
        assert_eq!(
            "10-20".parse::<LineRange>().unwrap(),
            LineRange::Span { start: 10, end: 20 }
        );
        assert!("20-10".parse::<LineRange>().is_err());
        assert!("0".parse::<LineRange>().is_err());
        assert!("abc".parse::<LineRange>().is_err());
    }

    #[test]
    fn file_pattern_splits_dir() {
        let p: FilePattern = "src/net/*.c".parse().unwrap();
        assert_eq!(p.dir.as_deref(), Some("src/net"));
        assert_eq!(p.file, "*.c");
        let p: FilePattern = "main.c".parse().unwrap();
        assert_eq!(p.dir, None);
    }

    #[test]
    fn include_overrides_exclude() {
        let include_only = FilterSet {
            include: vec![ContextKind::Function],
            ..FilterSet::default()
        };
        let both = FilterSet {
            include: vec![ContextKind::Function],
            exclude: vec![ContextKind::Variable, ContextKind::Comment],
            ..FilterSet::default()
        };
        assert_eq!(both.predicate().unwrap(), include_only.predicate().unwrap());
        assert_eq!(both.predicate().unwrap(), "context IN ('func')");
        assert!(both.effective_exclude().is_empty());
    }

    #[test]
    fn exclude_applies_without_include() {
        let filters = FilterSet {
            exclude: vec![ContextKind::Comment, ContextKind::String],
            ..FilterSet::default()
        };
        assert_eq!(filters.predicate().unwrap(), "context NOT IN ('com', 'str')");
    }

    #[test]
    fn empty_filter_set_has_empty_predicate() {
        assert_eq!(FilterSet::default().predicate().unwrap(), "");
    }

    #[test]
    fn composes_every_clause() {
        let mut filters = FilterSet {
            files: vec!["*.c".parse().unwrap(), "/abs/src/util.h".parse().unwrap()],
            line: Some(LineRange::Span { start: 5, end: 9 }),
            within: vec![ScopeRange {
                dir: "src/".into(),
                filename: "o'neil.c".into(),
                start: 1,
                end: 40,
            }],
            ..FilterSet::default()
        };
        filters.add_column_values("parent", &["Serv*", "Client"]).unwrap();
        filters.add_column_values("--definition", &["1"]).unwrap();

        let predicate = filters.predicate().unwrap();
        assert_eq!(
            predicate,
            "(filename LIKE '%_c' ESCAPE '\\' OR (dir LIKE '/abs/src/' ESCAPE '\\' AND filename LIKE 'util_h' ESCAPE '\\')) \
             AND line BETWEEN 5 AND 9 \
             AND ((dir = 'src/' AND filename = 'o''neil.c' AND line BETWEEN 1 AND 40)) \
             AND (parent LIKE 'Serv%' ESCAPE '\\' OR parent LIKE 'Client' ESCAPE '\\') \
             AND (definition = 1)"
        );
    }

    #[test]
    fn relative_dir_matches_as_suffix() {
        let filters = FilterSet {
            files: vec!["src/*.c".parse().unwrap()],
            ..FilterSet::default()
        };
        assert_eq!(
            filters.predicate().unwrap(),
            "(((dir LIKE 'src/' ESCAPE '\\' OR dir LIKE '%/src/' ESCAPE '\\') AND filename LIKE '%_c' ESCAPE '\\'))"
        );
    }

    #[test]
    fn unknown_and_bad_integer_columns_are_rejected() {
        let mut filters = FilterSet::default();
        assert!(matches!(
            filters.add_column_values("colour", &["red"]),
            Err(QueryError::UnknownColumn(_))
        ));
        assert!(matches!(
            filters.add_column_values("definition", &["yes"]),
            Err(QueryError::InvalidInput(_))
        ));
        assert!(!filters.has_column_filter("definition"));
    }

    #[test]
    fn pattern_clause_numbers_placeholders() {
        assert_eq!(
            pattern_clause(2, 3),
            "(search_key LIKE ?3 ESCAPE '\\' OR search_key LIKE ?4 ESCAPE '\\')"
        );
        assert_eq!(pattern_param("Handle*"), "handle%");
    }

    #[test]
    fn literal_text_strips_wildcards() {
        assert_eq!(literal_text("*req\\*x%"), "req*x");
    }
}
