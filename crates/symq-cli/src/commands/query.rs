use std::io::{BufWriter, Write};

use symq_config::SymqConfig;
use symq_db::{SYMBOLS_TABLE, SymbolDb};
use symq_query::presenter::{ActiveColumns, DisplayOptions, Presenter, QueryReport};
use symq_query::toc::{TocOptions, render_toc};
use symq_query::{FilterSet, PROXIMITY_TABLE, ProximityRequest, Searcher, Selection};

use crate::cli::{Cli, ColumnArgs, OutputFormat};
use crate::output::{SearchOutput, write_files, write_json};
use crate::ui;

/// Run one `symq` invocation against the configured database.
///
/// # Errors
///
/// Validation, database and query errors.
pub async fn handle(cli: &Cli, columns: &ColumnArgs, config: &SymqConfig) -> anyhow::Result<()> {
    cli.validate()?;
    let path = cli.db.as_deref().unwrap_or(&config.general.database);
    let db = super::open_existing(path, &config.general).await?;

    let color = ui::color_enabled(cli.color, cli.format);
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let stderr = std::io::stderr();
    let mut notes = stderr.lock();
    execute(cli, columns, config, &db, color, &mut out, &mut notes).await?;
    out.flush()?;
    Ok(())
}

/// Everything after opening the database. Results go to `out`; no-result
/// explanations in text mode go to `notes`.
///
/// # Errors
///
/// Validation and query errors.
pub async fn execute<W: Write, N: Write>(
    cli: &Cli,
    columns: &ColumnArgs,
    config: &SymqConfig,
    db: &SymbolDb,
    color: bool,
    out: &mut W,
    notes: &mut N,
) -> anyhow::Result<()> {
    let searcher = Searcher::new(db, cli.debug);
    let mut filters = cli.filter_set(columns)?;
    if !cli.within.is_empty() {
        filters.within = searcher.resolve_within(&cli.within).await?;
    }

    if cli.toc {
        return toc(cli, config, searcher, &filters, out).await;
    }
    if cli.files {
        let files = searcher
            .files(&Selection::new(SYMBOLS_TABLE, &cli.patterns, &filters))
            .await?;
        return match cli.format {
            OutputFormat::Text => Ok(write_files(&files, out)?),
            OutputFormat::Json => write_json(&files, out),
        };
    }

    let options = cli.display_options(columns, config, color)?;
    let active = ActiveColumns::select(&options, &filters)?;
    let run = SearchRun {
        cli,
        searcher,
        filters: &filters,
        options: &options,
        active: &active,
    };

    let mut retried_with = None;
    let mut no_results = None;
    let mut outcome = run.once(&cli.patterns, out).await?;
    if outcome.total == 0 {
        let report = searcher.diagnose(&cli.patterns, &config.search).await?;
        if cli.format == OutputFormat::Text {
            for message in report.messages() {
                writeln!(notes, "{message}")?;
            }
        }
        if let Some(retry) = report.retry.clone() {
            if cli.format == OutputFormat::Text {
                writeln!(notes, "retrying with {}", retry.join(" "))?;
            }
            outcome = run.once(&retry, out).await?;
            retried_with = Some(retry);
        }
        if outcome.total == 0 && cli.format == OutputFormat::Text {
            writeln!(notes, "no matches")?;
        }
        no_results = Some(report);
    }

    if let Some(report) = outcome.report {
        write_json(
            &SearchOutput {
                report,
                retried_with,
                no_results,
            },
            out,
        )?;
    }
    Ok(())
}

struct Outcome {
    total: u64,
    /// Collected rows in JSON mode.
    report: Option<QueryReport>,
}

struct SearchRun<'a> {
    cli: &'a Cli,
    searcher: Searcher<'a>,
    filters: &'a FilterSet,
    options: &'a DisplayOptions,
    active: &'a ActiveColumns,
}

impl SearchRun<'_> {
    /// Plain or proximity search for `patterns`. Text output is written as
    /// it streams; nothing is written when no row matches. Source lines
    /// highlight the patterns as typed, also on a widened retry.
    async fn once<W: Write>(&self, patterns: &[String], out: &mut W) -> anyhow::Result<Outcome> {
        let unfiltered = FilterSet::default();
        let selection = match self.cli.and {
            Some(range) => {
                let request = ProximityRequest::new(patterns.to_vec(), range)?;
                let outcome = self.searcher.proximity(&request, self.filters).await?;
                tracing::debug!(?outcome, "proximity search");
                Selection::new(PROXIMITY_TABLE, &[], &unfiltered)
            }
            None => Selection::new(SYMBOLS_TABLE, patterns, self.filters),
        };

        let presenter = Presenter::new(self.searcher, self.options, &self.cli.patterns);
        match self.cli.format {
            OutputFormat::Text => {
                let summary = presenter.render(&selection, self.active, out).await?;
                Ok(Outcome {
                    total: summary.total,
                    report: None,
                })
            }
            OutputFormat::Json => {
                let report = presenter.collect(&selection, self.active).await?;
                Ok(Outcome {
                    total: report.total,
                    report: Some(report),
                })
            }
        }
    }
}

async fn toc<W: Write>(
    cli: &Cli,
    config: &SymqConfig,
    searcher: Searcher<'_>,
    filters: &FilterSet,
    out: &mut W,
) -> anyhow::Result<()> {
    let options = TocOptions {
        limit: cli.effective_limit(config),
        limit_per_file: cli.limit_per_file.filter(|limit| *limit > 0),
        leader_width: config.search.toc_leader_width,
    };
    let toc = searcher.toc(filters, options).await?;
    match cli.format {
        OutputFormat::Text => Ok(render_toc(&toc, options.leader_width, out)?),
        OutputFormat::Json => write_json(&toc, out),
    }
}
