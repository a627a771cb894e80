use std::io::Write;
use std::path::Path;

use anyhow::Context;
use symq_config::SymqConfig;
use symq_db::SymbolDb;

use crate::cli::OutputFormat;
use crate::cli::load::LoadCli;
use crate::output::{LoadOutput, LoadedInput, write_json, write_load};

const STDIN: &str = "-";

/// Run one `symq-load` invocation.
///
/// # Errors
///
/// Open, parse and insert errors. Each input is its own transaction, so
/// inputs before the failing one stay loaded.
pub async fn handle(cli: &LoadCli, config: &SymqConfig) -> anyhow::Result<()> {
    let path = cli.db.as_deref().unwrap_or(&config.general.database);
    let db = super::open_or_create(path, &config.general).await?;
    let load = load_inputs(&db, path, &cli.inputs).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Text => write_load(&load, &mut out)?,
        OutputFormat::Json => write_json(&load, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

async fn load_inputs<P: AsRef<Path>>(
    db: &SymbolDb,
    database: &str,
    inputs: &[P],
) -> anyhow::Result<LoadOutput> {
    let mut loaded = Vec::with_capacity(inputs.len());
    for input in inputs {
        let input = input.as_ref();
        let name = input.display().to_string();
        let stats = if name == STDIN {
            db.ingest_reader(std::io::stdin().lock()).await
        } else {
            db.ingest_jsonl(input).await
        }
        .with_context(|| format!("failed to load '{name}'"))?;
        tracing::info!(input = %name, records = stats.records, files = stats.files, "loaded");
        loaded.push(LoadedInput { input: name, stats });
    }
    Ok(LoadOutput {
        database: database.to_string(),
        inputs: loaded,
        symbols: db.count().await?,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use symq_db::DbOptions;

    use super::*;

    const RECORDS: &str = concat!(
        r#"{"symbol":"main","dir":"src","filename":"a.c","line":3,"context":"function"}"#,
        "\n",
        r#"{"symbol":"argc","dir":"src","filename":"a.c","line":3,"context":"arg"}"#,
        "\n",
    );

    #[tokio::test]
    async fn loads_every_input_and_reports_totals() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.jsonl");
        let second = dir.path().join("b.jsonl");
        std::fs::write(&first, RECORDS).unwrap();
        std::fs::write(
            &second,
            r#"{"symbol":"helper","dir":"lib","filename":"b.c","line":1,"context":"func"}"#,
        )
        .unwrap();

        let db = SymbolDb::open_local(":memory:", DbOptions::default())
            .await
            .unwrap();
        let load = load_inputs(&db, "mem", &[&first, &second]).await.unwrap();
        assert_eq!(load.symbols, 3);
        assert_eq!(load.inputs.len(), 2);
        assert_eq!(load.inputs[0].stats.records, 2);
    }

    #[tokio::test]
    async fn failing_input_is_named() {
        let db = SymbolDb::open_local(":memory:", DbOptions::default())
            .await
            .unwrap();
        let err = load_inputs(&db, "mem", &["/nonexistent/input.jsonl"])
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to load '/nonexistent/input.jsonl'"));
    }
}
