//! Multi-pattern proximity search (`--and N`).
//!
//! Three phases per query:
//!
//! 1. **Anchor**: every row matching the first pattern (with all filters),
//!    in file/line order.
//! 2. **Verify**: for each anchor, count distinct search keys matching any
//!    secondary pattern in the same file within
//!    `[max(1, line - range), line + range]`. The anchor is complete when the
//!    count equals the number of secondary patterns.
//! 3. **Collect**: complete anchors and every secondary match in their window
//!    are copied into the connection-scoped `proximity_matches` table.
//!
//! The distinct-key check is approximate: two secondary patterns matching
//! the same text count once, and a wildcard pattern can cover another.
//! Any failure clears the scratch table so no partial result is shown.

use serde::Serialize;
use symq_db::SYMBOLS_TABLE;

use crate::error::QueryError;
use crate::filter::{FilterSet, sql_quote};
use crate::search::{Searcher, Selection};

/// Scratch table holding the result of the last proximity query.
pub const PROXIMITY_TABLE: &str = "proximity_matches";

/// Validated proximity parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProximityRequest {
    patterns: Vec<String>,
    range: u32,
}

impl ProximityRequest {
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for fewer than two patterns.
    pub fn new(patterns: Vec<String>, range: u32) -> Result<Self, QueryError> {
        if patterns.len() < 2 {
            return Err(QueryError::InvalidInput(format!(
                "--and needs at least two patterns (got {}); e.g. `symq malloc free --and 5`",
                patterns.len()
            )));
        }
        Ok(Self { patterns, range })
    }

    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    #[must_use]
    pub const fn range(&self) -> u32 {
        self.range
    }

    /// Inclusive window around an anchor line, clamped at line 1.
    #[must_use]
    pub const fn window(&self, line: u32) -> (u32, u32) {
        let start = line.saturating_sub(self.range);
        let start = if start < 1 { 1 } else { start };
        (start, line.saturating_add(self.range))
    }
}

/// Counters from one proximity run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProximityOutcome {
    pub anchors: usize,
    pub complete: usize,
    pub collected: u64,
}

impl Searcher<'_> {
    /// Run a proximity search, leaving its rows in [`PROXIMITY_TABLE`].
    ///
    /// # Errors
    ///
    /// Any query failure aborts the search; the scratch table is emptied
    /// before the error is returned.
    pub async fn proximity(
        &self,
        request: &ProximityRequest,
        filters: &FilterSet,
    ) -> Result<ProximityOutcome, QueryError> {
        self.db().recreate_temp_table(PROXIMITY_TABLE).await?;
        match self.collect_proximity(request, filters).await {
            Ok(outcome) => {
                tracing::debug!(?outcome, range = request.range, "proximity search done");
                Ok(outcome)
            }
            Err(error) => {
                if let Err(clear) = self.db().recreate_temp_table(PROXIMITY_TABLE).await {
                    tracing::warn!(%clear, "failed to clear proximity results");
                }
                Err(error)
            }
        }
    }

    async fn collect_proximity(
        &self,
        request: &ProximityRequest,
        filters: &FilterSet,
    ) -> Result<ProximityOutcome, QueryError> {
        let (anchor_pattern, secondary) = request.patterns.split_at(1);
        let anchors = self
            .records(&Selection::new(SYMBOLS_TABLE, anchor_pattern, filters).records()?)
            .await?;

        let needed = secondary.len() as u64;
        let mut outcome = ProximityOutcome {
            anchors: anchors.len(),
            ..ProximityOutcome::default()
        };

        for anchor in &anchors {
            let (start, end) = request.window(anchor.line);
            let window = Selection::new(SYMBOLS_TABLE, secondary, filters).and(format!(
                "dir = {} AND filename = {} AND line BETWEEN {start} AND {end}",
                sql_quote(&anchor.dir),
                sql_quote(&anchor.filename)
            ));

            let distinct = self.scalar(&window.distinct_keys()?).await?;
            if distinct != needed {
                continue;
            }
            outcome.complete += 1;

            let anchor_only = Selection::new(SYMBOLS_TABLE, &[], filters)
                .and(format!("id = {}", anchor.id));
            outcome.collected += self.execute(&anchor_only.copy_into(PROXIMITY_TABLE)?).await?;
            outcome.collected += self.execute(&window.copy_into(PROXIMITY_TABLE)?).await?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{SymbolFixture, seeded_db};

    async fn proximity_lines(
        db: &symq_db::SymbolDb,
        patterns: &[&str],
        range: u32,
    ) -> Vec<u32> {
        let searcher = Searcher::new(db, false);
        let request =
            ProximityRequest::new(patterns.iter().map(ToString::to_string).collect(), range)
                .unwrap();
        let filters = FilterSet::default();
        searcher.proximity(&request, &filters).await.unwrap();
        let empty = FilterSet::default();
        searcher
            .records(&Selection::new(PROXIMITY_TABLE, &[], &empty).records().unwrap())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.line)
            .collect()
    }

    #[test]
    fn needs_two_patterns() {
        assert!(matches!(
            ProximityRequest::new(vec!["malloc".into()], 5),
            Err(QueryError::InvalidInput(_))
        ));
    }

    #[test]
    fn window_is_clamped_at_line_one() {
        let request = ProximityRequest::new(vec!["a".into(), "b".into()], 5).unwrap();
        assert_eq!(request.window(3), (1, 8));
        assert_eq!(request.window(10), (5, 15));
    }

    #[tokio::test]
    async fn same_symbol_within_range_groups_both_rows() {
        let db = seeded_db(&[
            SymbolFixture::new("handleRequest", 10, "func"),
            SymbolFixture::new("handleRequest", 12, "var"),
        ])
        .await;
        let lines = proximity_lines(&db, &["handleRequest", "handleRequest"], 5).await;
        assert_eq!(lines, vec![10, 12]);
    }

    #[tokio::test]
    async fn range_zero_requires_same_line() {
        let db = seeded_db(&[
            SymbolFixture::new("malloc", 5, "call"),
            SymbolFixture::new("free", 7, "call"),
        ])
        .await;
        assert!(proximity_lines(&db, &["malloc", "free"], 0).await.is_empty());

        let db = seeded_db(&[
            SymbolFixture::new("malloc", 5, "call"),
            SymbolFixture::new("free", 5, "call"),
        ])
        .await;
        assert_eq!(proximity_lines(&db, &["malloc", "free"], 0).await, vec![5, 5]);
    }

    #[tokio::test]
    async fn incomplete_anchors_contribute_nothing() {
        let db = seeded_db(&[
            SymbolFixture::new("open", 1, "call"),
            SymbolFixture::new("read", 2, "call"),
            SymbolFixture::new("open", 50, "call"),
            SymbolFixture::new("read", 51, "call"),
            SymbolFixture::new("close", 52, "call"),
        ])
        .await;
        let lines = proximity_lines(&db, &["open", "read", "close"], 3).await;
        assert_eq!(lines, vec![50, 51, 52]);
    }

    #[tokio::test]
    async fn enlarging_range_only_adds_matches() {
        let db = seeded_db(&[
            SymbolFixture::new("lock", 10, "call"),
            SymbolFixture::new("unlock", 12, "call"),
            SymbolFixture::new("unlock", 30, "call"),
        ])
        .await;
        let narrow = proximity_lines(&db, &["lock", "unlock"], 2).await;
        let wide = proximity_lines(&db, &["lock", "unlock"], 25).await;
        assert_eq!(narrow, vec![10, 12]);
        assert!(narrow.iter().all(|line| wide.contains(line)));
        assert_eq!(wide, vec![10, 12, 30]);
    }

    #[tokio::test]
    async fn other_files_are_ignored() {
        let db = seeded_db(&[
            SymbolFixture::new("malloc", 5, "call"),
            SymbolFixture::new("free", 5, "call").in_file("src/", "b.c"),
        ])
        .await;
        assert!(proximity_lines(&db, &["malloc", "free"], 10).await.is_empty());
    }

    #[tokio::test]
    async fn each_query_starts_from_an_empty_table() {
        let db = seeded_db(&[
            SymbolFixture::new("malloc", 5, "call"),
            SymbolFixture::new("free", 6, "call"),
        ])
        .await;
        assert_eq!(proximity_lines(&db, &["malloc", "free"], 1).await, vec![5, 6]);
        assert!(proximity_lines(&db, &["malloc", "free"], 0).await.is_empty());
    }
}
