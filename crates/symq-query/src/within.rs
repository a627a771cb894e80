//! Within-scope resolution for `-w/--within`.
//!
//! Each requested symbol is resolved to the spans of its definition records
//! (display key match, definition flag set). A symbol with no definition
//! fails the whole query.

use symq_core::schema::DEFINITION_COLUMN;
use symq_db::helpers::parse_span;

use crate::error::QueryError;
use crate::filter::ScopeRange;
use crate::search::Searcher;

impl Searcher<'_> {
    /// Resolve every symbol to the line ranges its definitions enclose.
    ///
    /// Definitions without a stored span scope to their own line.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingDefinition`] naming the first symbol with
    /// no definition record, or a database error.
    pub async fn resolve_within(&self, symbols: &[String]) -> Result<Vec<ScopeRange>, QueryError> {
        let sql = format!(
            "SELECT dir, filename, line, source_location FROM symbols \
             WHERE symbol = ?1 AND {DEFINITION_COLUMN} != 0 \
             ORDER BY dir, filename, line"
        );
        let mut ranges = Vec::new();

        for symbol in symbols {
            self.echo(&sql);
            let mut rows = self.db().conn().query(&sql, [symbol.as_str()]).await?;
            let before = ranges.len();
            while let Some(row) = rows.next().await? {
                let line = u32::try_from(row.get::<i64>(2)?).unwrap_or(0);
                let (start, end) = parse_span(&row.get::<String>(3)?)
                    .map_or((line, line), |span| span.rows());
                ranges.push(ScopeRange {
                    dir: row.get::<String>(0)?,
                    filename: row.get::<String>(1)?,
                    start,
                    end,
                });
            }
            if ranges.len() == before {
                return Err(QueryError::MissingDefinition(symbol.clone()));
            }
            tracing::debug!(
                symbol,
                scopes = ranges.len() - before,
                "resolved within scope"
            );
        }
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{SymbolFixture, seeded_db};

    #[tokio::test]
    async fn resolves_definition_spans() {
        let db = seeded_db(&[
            SymbolFixture::def("Server", 10, "cls", "10:0-40:1"),
            SymbolFixture::new("Server", 55, "var"),
        ])
        .await;
        let searcher = Searcher::new(&db, false);
        let ranges = searcher.resolve_within(&["Server".into()]).await.unwrap();
        assert_eq!(
            ranges,
            vec![ScopeRange {
                dir: "src/".into(),
                filename: "a.c".into(),
                start: 10,
                end: 40,
            }]
        );
    }

    #[tokio::test]
    async fn any_unresolved_symbol_fails() {
        let db = seeded_db(&[SymbolFixture::def("Server", 10, "cls", "10:0-40:1")]).await;
        let searcher = Searcher::new(&db, false);
        let err = searcher
            .resolve_within(&["Server".into(), "Missing".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::MissingDefinition(ref s) if s == "Missing"));
    }
}
