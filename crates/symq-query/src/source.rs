//! Scoped source reads for context lines (`-A/-B/-C`) and definition
//! expansion (`-e`).
//!
//! The last file read is cached, since rows arrive grouped by file.

use std::path::Path;

use crate::error::QueryError;
use crate::filter::{has_wildcard, literal_text};

const HIGHLIGHT_ON: &str = "\u{1b}[1;31m";
const HIGHLIGHT_OFF: &str = "\u{1b}[0m";

/// Lines before and after a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextLines {
    pub before: u32,
    pub after: u32,
}

/// One numbered source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: u32,
    pub text: String,
}

/// Reader that keeps the most recently opened file in memory.
#[derive(Debug, Default)]
pub struct SourceReader {
    cached: Option<(String, Vec<String>)>,
}

impl SourceReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&mut self, path: &str) -> Result<&[String], QueryError> {
        let hit = self.cached.as_ref().is_some_and(|(cached, _)| cached == path);
        if !hit {
            let content = std::fs::read_to_string(Path::new(path))?;
            let lines = content.lines().map(str::to_string).collect();
            self.cached = Some((path.to_string(), lines));
        }
        Ok(self
            .cached
            .as_ref()
            .map_or(&[][..], |(_, lines)| lines.as_slice()))
    }

    /// Inclusive 1-based line range, clipped to the file.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Io`] if the file cannot be read.
    pub fn range(&mut self, path: &str, start: u32, end: u32) -> Result<Vec<SourceLine>, QueryError> {
        let lines = self.load(path)?;
        let first = start.max(1);
        Ok((first..=end)
            .filter_map(|number| {
                let idx = usize::try_from(number).ok()?.checked_sub(1)?;
                lines.get(idx).map(|text| SourceLine {
                    number,
                    text: text.clone(),
                })
            })
            .collect())
    }

    /// Lines around `line`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Io`] if the file cannot be read.
    pub fn around(
        &mut self,
        path: &str,
        line: u32,
        context: ContextLines,
    ) -> Result<Vec<SourceLine>, QueryError> {
        self.range(
            path,
            line.saturating_sub(context.before),
            line.saturating_add(context.after),
        )
    }
}

/// Literal, wildcard-free patterns usable for highlighting.
#[must_use]
pub fn highlight_terms(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .filter(|p| !has_wildcard(p))
        .map(|p| literal_text(p))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Wrap every case-insensitive occurrence of any term in ANSI bold red.
#[must_use]
pub fn highlight(text: &str, terms: &[String]) -> String {
    if terms.is_empty() {
        return text.to_string();
    }
    let lower = text.to_ascii_lowercase();
    let terms: Vec<String> = terms.iter().map(|t| t.to_ascii_lowercase()).collect();

    let mut out = String::with_capacity(text.len() + 16);
    let mut pos = 0;
    while pos < text.len() {
        let hit = terms
            .iter()
            .filter(|term| lower[pos..].starts_with(term.as_str()))
            .map(String::len)
            .max();
        match hit {
            Some(len) => {
                out.push_str(HIGHLIGHT_ON);
                out.push_str(&text[pos..pos + len]);
                out.push_str(HIGHLIGHT_OFF);
                pos += len;
            }
            None => {
                let step = text[pos..].chars().next().map_or(1, char::len_utf8);
                out.push_str(&text[pos..pos + step]);
                pos += step;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn source_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for n in 1..=10 {
            writeln!(file, "line {n}").unwrap();
        }
        file
    }

    #[test]
    fn around_clips_to_file_bounds() {
        let file = source_file();
        let path = file.path().to_str().unwrap();
        let mut reader = SourceReader::new();

        let lines = reader
            .around(path, 2, ContextLines { before: 3, after: 1 })
            .unwrap();
        let numbers: Vec<u32> = lines.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let lines = reader
            .around(path, 10, ContextLines { before: 0, after: 5 })
            .unwrap();
        assert_eq!(lines, vec![SourceLine {
            number: 10,
            text: "line 10".into()
        }]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut reader = SourceReader::new();
        assert!(matches!(
            reader.range("/nonexistent/file.c", 1, 2),
            Err(QueryError::Io(_))
        ));
    }

    #[test]
    fn highlight_is_case_insensitive() {
        let terms = vec!["request".to_string()];
        assert_eq!(
            highlight("handleRequest(req)", &terms),
            "handle\u{1b}[1;31mRequest\u{1b}[0m(req)"
        );
    }

    #[test]
    fn wildcard_patterns_are_not_highlighted() {
        let patterns = vec!["handle*".to_string(), "free".to_string(), "a\\*b".to_string()];
        assert_eq!(highlight_terms(&patterns), vec!["free", "a*b"]);
    }

    #[test]
    fn no_terms_leaves_text_alone() {
        assert_eq!(highlight("plain", &[]), "plain");
    }
}
