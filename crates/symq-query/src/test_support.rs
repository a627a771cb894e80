//! Shared fixtures for symq-query unit tests.

use std::collections::BTreeMap;

use symq_core::entities::{AttributeValue, SymbolInput};
use symq_core::enums::ContextKind;
use symq_db::{DbOptions, SymbolDb};

/// Compact description of one seeded symbol.
pub struct SymbolFixture {
    symbol: &'static str,
    line: u32,
    context: &'static str,
    dir: &'static str,
    filename: &'static str,
    span: Option<&'static str>,
    attributes: Vec<(&'static str, AttributeValue)>,
}

impl SymbolFixture {
    /// A plain occurrence in `src/a.c`.
    pub const fn new(symbol: &'static str, line: u32, context: &'static str) -> Self {
        Self {
            symbol,
            line,
            context,
            dir: "src/",
            filename: "a.c",
            span: None,
            attributes: Vec::new(),
        }
    }

    /// A definition with a span in `src/a.c`.
    pub fn def(symbol: &'static str, line: u32, context: &'static str, span: &'static str) -> Self {
        let mut fixture = Self::new(symbol, line, context);
        fixture.span = Some(span);
        fixture.attributes.push(("definition", AttributeValue::Int(1)));
        fixture
    }

    pub fn in_file(mut self, dir: &'static str, filename: &'static str) -> Self {
        self.dir = dir;
        self.filename = filename;
        self
    }

    pub fn with(mut self, column: &'static str, value: &str) -> Self {
        self.attributes
            .push((column, AttributeValue::Text(value.to_string())));
        self
    }

    fn input(&self) -> SymbolInput {
        SymbolInput {
            symbol: self.symbol.to_string(),
            dir: self.dir.to_string(),
            filename: self.filename.to_string(),
            line: self.line,
            context: self.context.parse::<ContextKind>().unwrap(),
            span: self.span.map(|s| s.parse().unwrap()),
            attributes: self
                .attributes
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }
}

/// In-memory database holding exactly the given symbols.
pub async fn seeded_db(fixtures: &[SymbolFixture]) -> SymbolDb {
    let db = SymbolDb::open_local(":memory:", DbOptions::default())
        .await
        .unwrap();
    let mut writer = db.writer().await.unwrap();
    for fixture in fixtures {
        writer.insert(&fixture.input()).await.unwrap();
    }
    db
}
