//! Column schema registry.
//!
//! One declarative table of column descriptors drives DDL generation, insert
//! parameter ordering, CLI flag generation, filter building and display. No
//! consumer keeps its own list of columns; everything iterates
//! [`EXTENSIBLE_COLUMNS`] (and [`CORE_COLUMNS`] for display).

use serde::Serialize;

/// Upper bound on the number of extensible columns. Consumers size their
/// per-column state from the registry itself, never from this constant.
pub const MAX_EXTENSIBLE_COLUMNS: usize = 32;

/// Storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ColumnKind {
    /// Free-form text, truncated to `max_len` characters on insert.
    Text { max_len: usize },
    /// Integer value (flags, counts).
    Int,
}

impl ColumnKind {
    /// SQL type used in the generated DDL.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Text { .. } => "TEXT",
            Self::Int => "INTEGER",
        }
    }

    /// Default literal for the DDL `DEFAULT` clause.
    #[must_use]
    pub const fn sql_default(self) -> &'static str {
        match self {
            Self::Text { .. } => "''",
            Self::Int => "0",
        }
    }

    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// A single column of the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// Stable column name, used verbatim in SQL.
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Long CLI flag (without dashes). `None` for core columns.
    pub flag: Option<&'static str>,
    /// Short CLI flag.
    pub short: Option<char>,
    /// Long flag that forces the column into the display without filtering.
    pub show_flag: Option<&'static str>,
    /// Header used with `--full` (the default).
    pub header: &'static str,
    /// Header used with `--compact`; also accepted as a lookup alias.
    pub compact_header: &'static str,
    /// Width used by the "all columns" display mode.
    pub width: usize,
}

impl ColumnDescriptor {
    /// Header text for the requested style.
    #[must_use]
    pub const fn header_for(&self, style: HeaderStyle) -> &'static str {
        match style {
            HeaderStyle::Full => self.header,
            HeaderStyle::Compact => self.compact_header,
        }
    }

    /// Truncate a text value to this column's maximum length.
    #[must_use]
    pub fn clamp_text<'a>(&self, value: &'a str) -> &'a str {
        match self.kind {
            ColumnKind::Text { max_len } => match value.char_indices().nth(max_len) {
                Some((idx, _)) => &value[..idx],
                None => value,
            },
            ColumnKind::Int => value,
        }
    }
}

/// Header rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderStyle {
    #[default]
    Full,
    Compact,
}

const fn core(
    name: &'static str,
    kind: ColumnKind,
    header: &'static str,
    compact_header: &'static str,
    width: usize,
) -> ColumnDescriptor {
    ColumnDescriptor {
        name,
        kind,
        flag: None,
        short: None,
        show_flag: None,
        header,
        compact_header,
        width,
    }
}

#[allow(clippy::too_many_arguments)]
const fn extensible(
    name: &'static str,
    kind: ColumnKind,
    flag: &'static str,
    short: Option<char>,
    show_flag: &'static str,
    header: &'static str,
    compact_header: &'static str,
    width: usize,
) -> ColumnDescriptor {
    ColumnDescriptor {
        name,
        kind,
        flag: Some(flag),
        short,
        show_flag: Some(show_flag),
        header,
        compact_header,
        width,
    }
}

/// Fixed core columns in table order (after the integer `id` key).
pub const CORE_COLUMNS: &[ColumnDescriptor] = &[
    core("search_key", ColumnKind::Text { max_len: 256 }, "Key", "Key", 24),
    core("symbol", ColumnKind::Text { max_len: 256 }, "Symbol", "Sym", 32),
    core("dir", ColumnKind::Text { max_len: 1024 }, "Directory", "Dir", 32),
    core("filename", ColumnKind::Text { max_len: 256 }, "File", "File", 24),
    core("line", ColumnKind::Int, "Line", "Ln", 6),
    core("context", ColumnKind::Text { max_len: 8 }, "Context", "Ctx", 8),
    core("source_location", ColumnKind::Text { max_len: 64 }, "Span", "Span", 16),
];

/// Extensible columns in registry order. This order is the DDL order, the
/// insert parameter order and the "all columns" display order.
pub const EXTENSIBLE_COLUMNS: &[ColumnDescriptor] = &[
    extensible(
        "parent",
        ColumnKind::Text { max_len: 128 },
        "parent",
        Some('p'),
        "show-parent",
        "Parent",
        "Par",
        20,
    ),
    extensible(
        "scope",
        ColumnKind::Text { max_len: 64 },
        "scope",
        Some('s'),
        "show-scope",
        "Scope",
        "Scp",
        12,
    ),
    extensible(
        "namespace",
        ColumnKind::Text { max_len: 128 },
        "namespace",
        Some('n'),
        "show-namespace",
        "Namespace",
        "NS",
        20,
    ),
    extensible(
        "modifier",
        ColumnKind::Text { max_len: 32 },
        "modifier",
        Some('m'),
        "show-modifier",
        "Modifier",
        "Mod",
        12,
    ),
    extensible(
        "clue",
        ColumnKind::Text { max_len: 64 },
        "clue",
        Some('c'),
        "show-clue",
        "Clue",
        "Clu",
        16,
    ),
    extensible(
        "type",
        ColumnKind::Text { max_len: 64 },
        "type",
        Some('t'),
        "show-type",
        "Type",
        "Typ",
        16,
    ),
    extensible(
        "definition",
        ColumnKind::Int,
        "definition",
        Some('d'),
        "show-definition",
        "Definition",
        "Def",
        4,
    ),
];

const _: () = assert!(EXTENSIBLE_COLUMNS.len() <= MAX_EXTENSIBLE_COLUMNS);

/// Name of the extensible integer column that marks definition records.
pub const DEFINITION_COLUMN: &str = "definition";

/// Resolve an extensible column by canonical name, long flag or compact
/// header, case-insensitively.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static ColumnDescriptor> {
    let name = name.trim().trim_start_matches('-');
    EXTENSIBLE_COLUMNS.iter().find(|col| matches_descriptor(col, name))
}

/// Resolve any displayable column: extensible columns first, then core
/// columns by name or header.
#[must_use]
pub fn lookup_any(name: &str) -> Option<&'static ColumnDescriptor> {
    lookup(name).or_else(|| {
        let name = name.trim();
        CORE_COLUMNS.iter().find(|col| {
            col.name.eq_ignore_ascii_case(name)
                || col.header.eq_ignore_ascii_case(name)
                || col.compact_header.eq_ignore_ascii_case(name)
        })
    })
}

/// Position of an extensible column in registry order.
#[must_use]
pub fn position(name: &str) -> Option<usize> {
    EXTENSIBLE_COLUMNS
        .iter()
        .position(|col| col.name.eq_ignore_ascii_case(name))
}

fn matches_descriptor(col: &ColumnDescriptor, name: &str) -> bool {
    col.name.eq_ignore_ascii_case(name)
        || col.flag.is_some_and(|flag| flag.eq_ignore_ascii_case(name))
        || col.compact_header.eq_ignore_ascii_case(name)
}

/// Look up a core column by name. Core names are compile-time constants, so
/// a miss is a programming error surfaced as `None`.
#[must_use]
pub fn core_column(name: &str) -> Option<&'static ColumnDescriptor> {
    CORE_COLUMNS.iter().find(|col| col.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("parent", "parent")]
    #[case("PARENT", "parent")]
    #[case("--parent", "parent")]
    #[case("Par", "parent")]
    #[case("ns", "namespace")]
    #[case("Def", "definition")]
    #[case("typ", "type")]
    fn lookup_resolves_names_flags_and_aliases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(lookup(input).map(|c| c.name), Some(expected));
    }

    #[test]
    fn lookup_rejects_unknown_and_core_names() {
        assert!(lookup("nope").is_none());
        assert!(lookup("line").is_none());
    }

    #[test]
    fn lookup_any_covers_core_columns() {
        assert_eq!(lookup_any("line").map(|c| c.name), Some("line"));
        assert_eq!(lookup_any("Symbol").map(|c| c.name), Some("symbol"));
        assert_eq!(lookup_any("key").map(|c| c.name), Some("search_key"));
        assert_eq!(lookup_any("ctx").map(|c| c.name), Some("context"));
        assert_eq!(lookup_any("parent").map(|c| c.name), Some("parent"));
    }

    #[test]
    fn names_flags_and_short_flags_are_unique() {
        let mut names: Vec<&str> = EXTENSIBLE_COLUMNS.iter().map(|c| c.name).collect();
        names.extend(CORE_COLUMNS.iter().map(|c| c.name));
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);

        let mut shorts: Vec<char> = EXTENSIBLE_COLUMNS.iter().filter_map(|c| c.short).collect();
        let total = shorts.len();
        shorts.sort_unstable();
        shorts.dedup();
        assert_eq!(shorts.len(), total);
    }

    #[test]
    fn every_extensible_column_has_cli_flags() {
        for col in EXTENSIBLE_COLUMNS {
            assert!(col.flag.is_some(), "{} needs a filter flag", col.name);
            assert!(col.show_flag.is_some(), "{} needs a show flag", col.name);
        }
    }

    #[test]
    fn clamp_text_truncates_on_char_boundary() {
        let col = lookup("modifier").unwrap();
        let long = "é".repeat(40);
        assert_eq!(col.clamp_text(&long).chars().count(), 32);
        assert_eq!(col.clamp_text("static"), "static");
    }

    #[test]
    fn position_follows_registry_order() {
        assert_eq!(position("parent"), Some(0));
        assert_eq!(position("definition"), Some(EXTENSIBLE_COLUMNS.len() - 1));
        assert_eq!(position("line"), None);
    }

    #[test]
    fn headers_by_style() {
        let col = lookup("namespace").unwrap();
        assert_eq!(col.header_for(HeaderStyle::Full), "Namespace");
        assert_eq!(col.header_for(HeaderStyle::Compact), "NS");
    }
}
