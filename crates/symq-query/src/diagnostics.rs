//! Explanations for empty results.
//!
//! When a query returns nothing, each pattern is counted on its own with no
//! filters. Patterns that match nothing are classified against the indexer's
//! drop rules; plain patterns that simply were not found are eligible for a
//! single retry as `*pattern*`. If every pattern matches on its own, the
//! filters are what excluded everything.

use serde::Serialize;
use symq_config::SearchConfig;
use symq_db::SYMBOLS_TABLE;

use crate::error::QueryError;
use crate::filter::{FilterSet, has_wildcard, literal_text};
use crate::search::{Searcher, Selection};

/// Why a pattern matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum PatternIssue {
    /// Shorter than the indexer's minimum symbol length.
    TooShort { min: usize },
    /// Purely numeric; the indexer skips numbers.
    Numeric,
    /// On the configured ignore list.
    Ignored,
    /// Not in the index.
    NotFound,
}

/// Standalone result for one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternDiagnostic {
    pub pattern: String,
    pub matches: u64,
    pub issue: Option<PatternIssue>,
}

/// Everything learned about an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoResults {
    pub patterns: Vec<PatternDiagnostic>,
    /// Every pattern matched alone; the filters removed all rows.
    pub filters_excluded: bool,
    /// Patterns to retry with, when at least one was widened.
    pub retry: Option<Vec<String>>,
}

/// Classify a pattern that matched nothing.
#[must_use]
pub fn classify(pattern: &str, rules: &SearchConfig) -> PatternIssue {
    let literal = literal_text(pattern);
    if literal.chars().count() < rules.min_symbol_len {
        PatternIssue::TooShort {
            min: rules.min_symbol_len,
        }
    } else if literal.chars().all(|c| c.is_ascii_digit()) {
        PatternIssue::Numeric
    } else if rules.is_ignored(&literal) {
        PatternIssue::Ignored
    } else {
        PatternIssue::NotFound
    }
}

/// Widened form used for the automatic retry.
#[must_use]
pub fn widen(pattern: &str) -> String {
    format!("*{pattern}*")
}

impl PatternDiagnostic {
    fn retryable(&self) -> bool {
        self.issue == Some(PatternIssue::NotFound) && !has_wildcard(&self.pattern)
    }

    /// One-line explanation.
    #[must_use]
    pub fn message(&self) -> String {
        let pattern = &self.pattern;
        match self.issue {
            None => format!("'{pattern}': {} matches without filters", self.matches),
            Some(PatternIssue::TooShort { min }) => format!(
                "'{pattern}': no matches; symbols shorter than {min} characters are not indexed"
            ),
            Some(PatternIssue::Numeric) => {
                format!("'{pattern}': no matches; numeric symbols are not indexed")
            }
            Some(PatternIssue::Ignored) => {
                format!("'{pattern}': no matches; it is on the ignored symbols list")
            }
            Some(PatternIssue::NotFound) => format!("'{pattern}': no matches"),
        }
    }
}

impl NoResults {
    /// Messages in display order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = self.patterns.iter().map(PatternDiagnostic::message).collect();
        if self.filters_excluded {
            messages.push(String::from(
                "every pattern matches on its own; the filters excluded all results",
            ));
        }
        messages
    }
}

impl Searcher<'_> {
    /// Count each pattern without filters and explain the empty result.
    ///
    /// # Errors
    ///
    /// Returns the engine error if a count query fails.
    pub async fn diagnose(
        &self,
        patterns: &[String],
        rules: &SearchConfig,
    ) -> Result<NoResults, QueryError> {
        let unfiltered = FilterSet::default();
        let mut diagnostics = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let single = std::slice::from_ref(pattern);
            let matches = self
                .scalar(&Selection::new(SYMBOLS_TABLE, single, &unfiltered).count()?)
                .await?;
            let issue = (matches == 0).then(|| classify(pattern, rules));
            diagnostics.push(PatternDiagnostic {
                pattern: pattern.clone(),
                matches,
                issue,
            });
        }

        let filters_excluded = !diagnostics.is_empty() && diagnostics.iter().all(|d| d.matches > 0);
        let retry = diagnostics
            .iter()
            .any(PatternDiagnostic::retryable)
            .then(|| {
                diagnostics
                    .iter()
                    .map(|d| {
                        if d.retryable() {
                            widen(&d.pattern)
                        } else {
                            d.pattern.clone()
                        }
                    })
                    .collect()
            });

        tracing::debug!(?diagnostics, filters_excluded, "diagnosed empty result");
        Ok(NoResults {
            patterns: diagnostics,
            filters_excluded,
            retry,
        })
    }
}
