//! Context categories for symbol occurrences.
//!
//! Every stored symbol carries exactly one [`ContextKind`]. The compact code
//! (`func`, `var`, ...) is the form persisted in the `context` column and the
//! form users usually type after `-i` / `-x`; the full name is what serde writes
//! and verbose output shows. Deserialization accepts either.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// ContextKind
// ---------------------------------------------------------------------------

/// Semantic role of a symbol occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum ContextKind {
    Class,
    Interface,
    Function,
    Argument,
    Variable,
    Exception,
    Type,
    Property,
    Comment,
    String,
    Filename,
    Import,
    Export,
    Call,
    Namespace,
    Enum,
    EnumCase,
    Trait,
    Lambda,
    Label,
    Goto,
}

impl ContextKind {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 21] = [
        Self::Class,
        Self::Interface,
        Self::Function,
        Self::Argument,
        Self::Variable,
        Self::Exception,
        Self::Type,
        Self::Property,
        Self::Comment,
        Self::String,
        Self::Filename,
        Self::Import,
        Self::Export,
        Self::Call,
        Self::Namespace,
        Self::Enum,
        Self::EnumCase,
        Self::Trait,
        Self::Lambda,
        Self::Label,
        Self::Goto,
    ];

    /// Full, human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Argument => "argument",
            Self::Variable => "variable",
            Self::Exception => "exception",
            Self::Type => "type",
            Self::Property => "property",
            Self::Comment => "comment",
            Self::String => "string",
            Self::Filename => "filename",
            Self::Import => "import",
            Self::Export => "export",
            Self::Call => "call",
            Self::Namespace => "namespace",
            Self::Enum => "enum",
            Self::EnumCase => "enum-case",
            Self::Trait => "trait",
            Self::Lambda => "lambda",
            Self::Label => "label",
            Self::Goto => "goto",
        }
    }

    /// Compact code stored in the `context` column.
    #[must_use]
    pub const fn compact(self) -> &'static str {
        match self {
            Self::Class => "cls",
            Self::Interface => "intf",
            Self::Function => "func",
            Self::Argument => "arg",
            Self::Variable => "var",
            Self::Exception => "exc",
            Self::Type => "type",
            Self::Property => "prop",
            Self::Comment => "com",
            Self::String => "str",
            Self::Filename => "file",
            Self::Import => "imp",
            Self::Export => "exp",
            Self::Call => "call",
            Self::Namespace => "ns",
            Self::Enum => "enum",
            Self::EnumCase => "case",
            Self::Trait => "trait",
            Self::Lambda => "lmbd",
            Self::Label => "lbl",
            Self::Goto => "goto",
        }
    }

    /// Resolve a compact code back to its category.
    #[must_use]
    pub fn from_compact(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.compact().eq_ignore_ascii_case(code))
    }

    /// Categories whose search key is punctuation-trimmed free text.
    #[must_use]
    pub const fn is_free_text(self) -> bool {
        matches!(self, Self::Comment | Self::String)
    }

    /// Categories eligible for the table-of-contents view as definitions.
    #[must_use]
    pub const fn is_toc_definition(self) -> bool {
        matches!(self, Self::Class | Self::Function | Self::Enum | Self::Type)
    }

    /// Categories the table-of-contents view always carries alongside definitions.
    #[must_use]
    pub const fn is_toc_marker(self) -> bool {
        matches!(self, Self::Import | Self::Filename)
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextKind {
    type Err = CoreError;

    /// Accepts the full name or the compact code, case-insensitively.
    /// `enum_case` and `enumcase` are accepted as aliases of `enum-case`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = trimmed.replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str().eq_ignore_ascii_case(&normalized)
                    || kind.compact().eq_ignore_ascii_case(trimmed)
                    || (*kind == Self::EnumCase && trimmed.eq_ignore_ascii_case("enumcase"))
            })
            .ok_or_else(|| CoreError::UnknownContext(trimmed.to_string()))
    }
}

impl TryFrom<String> for ContextKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn compact_roundtrip_for_every_variant() {
        for kind in ContextKind::ALL {
            assert_eq!(ContextKind::from_compact(kind.compact()), Some(kind));
        }
    }

    #[test]
    fn full_name_roundtrip_for_every_variant() {
        for kind in ContextKind::ALL {
            assert_eq!(kind.as_str().parse::<ContextKind>().unwrap(), kind);
        }
    }

    #[test]
    fn compact_codes_are_unique() {
        let mut codes: Vec<&str> = ContextKind::ALL.iter().map(|k| k.compact()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ContextKind::ALL.len());
    }

    #[rstest]
    #[case("FUNC", ContextKind::Function)]
    #[case("Function", ContextKind::Function)]
    #[case("enum_case", ContextKind::EnumCase)]
    #[case("case", ContextKind::EnumCase)]
    #[case(" var ", ContextKind::Variable)]
    #[case("ns", ContextKind::Namespace)]
    fn parses_names_and_codes(#[case] input: &str, #[case] expected: ContextKind) {
        assert_eq!(input.parse::<ContextKind>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_context() {
        let err = "method".parse::<ContextKind>().unwrap_err();
        assert!(err.to_string().contains("unknown context 'method'"));
    }

    #[test]
    fn serde_uses_kebab_case_full_names() {
        let json = serde_json::to_string(&ContextKind::EnumCase).unwrap();
        assert_eq!(json, "\"enum-case\"");
        let back: ContextKind = serde_json::from_str("\"function\"").unwrap();
        assert_eq!(back, ContextKind::Function);
    }

    #[rstest]
    #[case("\"func\"", ContextKind::Function)]
    #[case("\"FUNCTION\"", ContextKind::Function)]
    #[case("\"Cls\"", ContextKind::Class)]
    #[case("\"enum-case\"", ContextKind::EnumCase)]
    #[case("\"Arg\"", ContextKind::Argument)]
    fn deserializes_names_and_codes(#[case] json: &str, #[case] expected: ContextKind) {
        let kind: ContextKind = serde_json::from_str(json).unwrap();
        assert_eq!(kind, expected);
    }

    #[test]
    fn deserialize_rejects_unknown_context() {
        let err = serde_json::from_str::<ContextKind>("\"method\"").unwrap_err();
        assert!(err.to_string().contains("unknown context 'method'"), "{err}");
    }

    #[test]
    fn toc_eligibility() {
        assert!(ContextKind::Class.is_toc_definition());
        assert!(!ContextKind::Variable.is_toc_definition());
        assert!(ContextKind::Import.is_toc_marker());
        assert!(ContextKind::Filename.is_toc_marker());
        assert!(!ContextKind::Call.is_toc_marker());
    }
}
