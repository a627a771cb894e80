//! Symbol records, source spans and the producer input contract.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enums::ContextKind;
use crate::errors::CoreError;
use crate::schema::{self, ColumnKind, DEFINITION_COLUMN};

/// Source span of a symbol, `startRow:startCol-endRow:endCol`, rows 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl SourceSpan {
    /// Inclusive row range covered by the span.
    #[must_use]
    pub const fn rows(&self) -> (u32, u32) {
        (self.start_row, self.end_row)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_row, self.start_col, self.end_row, self.end_col
        )
    }
}

impl FromStr for SourceSpan {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CoreError::MalformedSpan(s.to_string());
        let (start, end) = s.trim().split_once('-').ok_or_else(malformed)?;
        let (start_row, start_col) = start.split_once(':').ok_or_else(malformed)?;
        let (end_row, end_col) = end.split_once(':').ok_or_else(malformed)?;
        let num = |part: &str| part.trim().parse::<u32>().map_err(|_| malformed());

        let span = Self {
            start_row: num(start_row)?,
            start_col: num(start_col)?,
            end_row: num(end_row)?,
            end_col: num(end_col)?,
        };
        if span.end_row < span.start_row {
            return Err(malformed());
        }
        Ok(span)
    }
}

impl Serialize for SourceSpan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceSpan {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Value of an extensible attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Text(String),
}

impl AttributeValue {
    /// Default value for a column kind (empty string / zero).
    #[must_use]
    pub const fn empty_for(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Text { .. } => Self::Text(String::new()),
            ColumnKind::Int => Self::Int(0),
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Int(v) => *v == 0,
            Self::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One symbol as emitted by a language front end.
///
/// Attributes are keyed by extensible column name; absent attributes default
/// to empty string / zero when inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInput {
    /// Display key (original text, possibly language-prefixed).
    pub symbol: String,
    pub dir: String,
    pub filename: String,
    pub line: u32,
    pub context: ContextKind,
    #[serde(default)]
    pub span: Option<SourceSpan>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl SymbolInput {
    /// Validate the record against the producer contract.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a zero line, empty symbol or
    /// filename, and `CoreError::UnknownColumn` for attributes the registry
    /// does not know.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.symbol.is_empty() {
            return Err(CoreError::Validation("symbol must not be empty".into()));
        }
        if self.filename.is_empty() {
            return Err(CoreError::Validation("filename must not be empty".into()));
        }
        if self.line == 0 {
            return Err(CoreError::Validation(format!(
                "line numbers are 1-based ('{}' has line 0)",
                self.symbol
            )));
        }
        if let Some(unknown) = self
            .attributes
            .keys()
            .find(|name| schema::lookup(name).is_none())
        {
            return Err(CoreError::UnknownColumn(unknown.clone()));
        }
        Ok(())
    }

    /// Directory normalized to end with a path separator.
    #[must_use]
    pub fn normalized_dir(&self) -> String {
        normalize_dir(&self.dir)
    }

    /// Attribute values in registry order, defaulting missing ones. Keys
    /// resolve the same way [`SymbolInput::validate`] accepts them, so a
    /// flag or compact header names its column.
    #[must_use]
    pub fn attribute_values(&self) -> Vec<AttributeValue> {
        schema::EXTENSIBLE_COLUMNS
            .iter()
            .map(|col| {
                self.attributes
                    .iter()
                    .find(|(name, _)| {
                        schema::lookup(name).is_some_and(|found| found.name == col.name)
                    })
                    .map_or_else(|| AttributeValue::empty_for(col.kind), |(_, v)| v.clone())
            })
            .collect()
    }
}

/// A persisted symbol row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolRecord {
    pub id: i64,
    pub search_key: String,
    pub symbol: String,
    pub dir: String,
    pub filename: String,
    pub line: u32,
    pub context: ContextKind,
    pub span: Option<SourceSpan>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl SymbolRecord {
    /// Full path of the file (`dir` always ends in a separator).
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}{}", self.dir, self.filename)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Whether the extensible definition flag is set.
    #[must_use]
    pub fn is_definition(&self) -> bool {
        self.attribute(DEFINITION_COLUMN)
            .and_then(AttributeValue::as_int)
            .is_some_and(|v| v != 0)
    }
}

/// Append a trailing `/` unless the directory already ends with a separator.
#[must_use]
pub fn normalize_dir(dir: &str) -> String {
    if dir.is_empty() {
        return String::from("./");
    }
    if dir.ends_with('/') || dir.ends_with('\\') {
        dir.to_string()
    } else {
        format!("{dir}/")
    }
}

/// Derive the search key for a display key.
///
/// Lowercased; free-text contexts (comments, strings) are additionally
/// trimmed of leading and trailing ASCII punctuation.
#[must_use]
pub fn search_key(display: &str, context: ContextKind) -> String {
    let lowered = display.to_lowercase();
    if context.is_free_text() {
        lowered
            .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
            .to_string()
    } else {
        lowered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn span_parses_and_displays() {
        let span: SourceSpan = "12:4-30:1".parse().unwrap();
        assert_eq!(
            span,
            SourceSpan {
                start_row: 12,
                start_col: 4,
                end_row: 30,
                end_col: 1
            }
        );
        assert_eq!(span.to_string(), "12:4-30:1");
        assert_eq!(span.rows(), (12, 30));
    }

    #[rstest]
    #[case("")]
    #[case("12:4")]
    #[case("12-30")]
    #[case("a:1-2:3")]
    #[case("30:0-12:0")]
    fn span_rejects_malformed(#[case] input: &str) {
        assert!(input.parse::<SourceSpan>().is_err());
    }

    #[rstest]
    #[case("HandleRequest", ContextKind::Function, "handlerequest")]
    #[case("\"Hello,", ContextKind::String, "hello")]
    #[case("TODO:", ContextKind::Comment, "todo")]
    #[case("::std", ContextKind::Namespace, "::std")]
    fn search_key_derivation(
        #[case] display: &str,
        #[case] context: ContextKind,
        #[case] expected: &str,
    ) {
        assert_eq!(search_key(display, context), expected);
    }

    #[test]
    fn normalize_dir_appends_separator() {
        assert_eq!(normalize_dir("src"), "src/");
        assert_eq!(normalize_dir("src/"), "src/");
        assert_eq!(normalize_dir(""), "./");
    }

    #[test]
    fn input_deserializes_with_defaults() {
        let input: SymbolInput = serde_json::from_str(
            r#"{"symbol":"main","dir":"src","filename":"main.c","line":3,"context":"function",
                "span":"3:0-9:1","attributes":{"definition":1,"type":"int"}}"#,
        )
        .unwrap();
        assert_eq!(input.span.unwrap().rows(), (3, 9));
        input.validate().unwrap();

        let values = input.attribute_values();
        assert_eq!(values.len(), schema::EXTENSIBLE_COLUMNS.len());
        let type_pos = schema::position("type").unwrap();
        assert_eq!(values[type_pos], AttributeValue::Text("int".into()));
        let parent_pos = schema::position("parent").unwrap();
        assert_eq!(values[parent_pos], AttributeValue::Text(String::new()));
    }

    #[rstest]
    #[case("parent")]
    #[case("Par")]
    #[case("--parent")]
    #[case("PARENT")]
    fn aliased_attribute_keys_fill_their_column(#[case] key: &str) {
        let input = SymbolInput {
            symbol: "handle".into(),
            dir: "src".into(),
            filename: "server.c".into(),
            line: 4,
            context: ContextKind::Function,
            span: None,
            attributes: BTreeMap::from([(key.to_string(), AttributeValue::Text("Server".into()))]),
        };
        input.validate().unwrap();
        let values = input.attribute_values();
        assert_eq!(
            values[schema::position("parent").unwrap()],
            AttributeValue::Text("Server".into())
        );
    }

    #[test]
    fn input_rejects_unknown_attribute() {
        let input = SymbolInput {
            symbol: "x".into(),
            dir: "src/".into(),
            filename: "a.c".into(),
            line: 1,
            context: ContextKind::Variable,
            span: None,
            attributes: BTreeMap::from([("colour".to_string(), AttributeValue::Int(1))]),
        };
        assert!(matches!(input.validate(), Err(CoreError::UnknownColumn(name)) if name == "colour"));
    }

    #[test]
    fn definition_flag_reads_attribute() {
        let mut record = SymbolRecord {
            id: 1,
            search_key: "main".into(),
            symbol: "main".into(),
            dir: "src/".into(),
            filename: "main.c".into(),
            line: 3,
            context: ContextKind::Function,
            span: None,
            attributes: BTreeMap::new(),
        };
        assert!(!record.is_definition());
        record
            .attributes
            .insert(DEFINITION_COLUMN.into(), AttributeValue::Int(1));
        assert!(record.is_definition());
        assert_eq!(record.path(), "src/main.c");
    }
}
