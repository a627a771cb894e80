use std::io::Write;

use serde::Serialize;
use symq_db::ingest::IngestStats;
use symq_query::diagnostics::NoResults;
use symq_query::presenter::QueryReport;
use symq_query::search::FileCount;

/// Pretty JSON on its own line.
///
/// # Errors
///
/// Returns serialization or write errors.
pub fn write_json<T: Serialize, W: Write>(value: &T, out: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// JSON shape of a search.
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    #[serde(flatten)]
    pub report: QueryReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retried_with: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_results: Option<NoResults>,
}

/// `--files` listing: count right-aligned, then the path.
///
/// # Errors
///
/// Returns the write error from `out`.
pub fn write_files<W: Write>(files: &[FileCount], out: &mut W) -> std::io::Result<()> {
    for file in files {
        writeln!(out, "{:>6}  {}", file.count, file.path)?;
    }
    writeln!(out)?;
    let noun = if files.len() == 1 { "file" } else { "files" };
    writeln!(out, "{} {noun}", files.len())
}

/// Per-input result of a load.
#[derive(Debug, Serialize)]
pub struct LoadedInput {
    pub input: String,
    #[serde(flatten)]
    pub stats: IngestStats,
}

/// JSON shape of a load.
#[derive(Debug, Serialize)]
pub struct LoadOutput {
    pub database: String,
    pub inputs: Vec<LoadedInput>,
    /// Rows in the index after loading.
    pub symbols: u64,
}

/// Text summary of a load.
///
/// # Errors
///
/// Returns the write error from `out`.
pub fn write_load<W: Write>(load: &LoadOutput, out: &mut W) -> std::io::Result<()> {
    for loaded in &load.inputs {
        writeln!(
            out,
            "{}: {} records in {} files ({} replaced)",
            loaded.input, loaded.stats.records, loaded.stats.files, loaded.stats.deleted
        )?;
    }
    writeln!(out, "{} symbols in {}", load.symbols, load.database)
}
