//! Search heuristics shared with the indexing front ends.
//!
//! The front ends drop symbols that are too short, purely numeric, or on the
//! ignore list. The query tool mirrors those rules so it can explain why a
//! pattern found nothing.

use serde::{Deserialize, Serialize};

const fn default_min_symbol_len() -> usize {
    2
}

const fn default_toc_leader_width() -> usize {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Shortest symbol the indexer keeps.
    #[serde(default = "default_min_symbol_len")]
    pub min_symbol_len: usize,

    /// Symbols the indexer filters out (compared case-insensitively).
    #[serde(default)]
    pub ignored_symbols: Vec<String>,

    /// Column at which TOC line numbers are right-aligned.
    #[serde(default = "default_toc_leader_width")]
    pub toc_leader_width: usize,
}

impl SearchConfig {
    /// Whether `symbol` is on the indexer's ignore list.
    #[must_use]
    pub fn is_ignored(&self, symbol: &str) -> bool {
        self.ignored_symbols
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(symbol))
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_symbol_len: default_min_symbol_len(),
            ignored_symbols: Vec::new(),
            toc_leader_width: default_toc_leader_width(),
        }
    }
}
