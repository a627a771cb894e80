use anyhow::bail;
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum};
use symq_config::{FlagAliases, SymqConfig};
use symq_core::enums::ContextKind;
use symq_core::schema::HeaderStyle;
use symq_query::filter::{FilePattern, LineRange};
use symq_query::presenter::{ColumnChoice, DisplayOptions};
use symq_query::source::ContextLines;
use symq_query::{FilterSet, QueryError};

pub mod columns;
pub mod load;

pub use columns::ColumnArgs;

/// Output mode shared by both tools.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// When to emit ANSI highlighting.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Top-level parser for the `symq` binary.
///
/// Column filter and `--show-*` flags are not declared here; they are added
/// from the schema registry by [`Cli::command_with_columns`].
#[derive(Debug, Parser)]
#[command(
    name = "symq",
    version,
    about = "Search a source-code symbol index",
    after_help = "Multi-value flags consume every following value. Put patterns first or after `--`."
)]
pub struct Cli {
    /// Search patterns: `*` any run, `.` one character (`%`/`_` also accepted)
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Symbol database (defaults to `general.database`)
    #[arg(long, value_name = "PATH")]
    pub db: Option<String>,

    /// Only these context categories
    #[arg(short = 'i', long, num_args = 1.., value_name = "CTX", value_parser = parse_context)]
    pub include: Vec<ContextKind>,

    /// Drop these context categories (ignored when --include is given)
    #[arg(short = 'x', long, num_args = 1.., value_name = "CTX", value_parser = parse_context)]
    pub exclude: Vec<ContextKind>,

    /// File globs, `[dir/]file`
    #[arg(short = 'f', long, num_args = 1.., value_name = "GLOB", value_parser = parse_file_pattern)]
    pub file: Vec<FilePattern>,

    /// Line number or inclusive range
    #[arg(short = 'l', long, value_name = "N|N-M", value_parser = parse_line_range)]
    pub line: Option<LineRange>,

    /// Restrict to the definition spans of these symbols
    #[arg(short = 'w', long, num_args = 1.., value_name = "SYMBOL")]
    pub within: Vec<String>,

    /// Proximity mode: all patterns within N lines of the first
    #[arg(long = "and", value_name = "N", num_args = 0..=1, default_missing_value = "5")]
    pub and: Option<u32>,

    /// Source lines after each match
    #[arg(short = 'A', long, value_name = "N", num_args = 0..=1, default_missing_value = "3")]
    pub after: Option<u32>,

    /// Source lines before each match
    #[arg(short = 'B', long, value_name = "N", num_args = 0..=1, default_missing_value = "3")]
    pub before: Option<u32>,

    /// Source lines around each match
    #[arg(short = 'C', long, value_name = "N", num_args = 0..=1, default_missing_value = "3")]
    pub context: Option<u32>,

    /// Print the full span of matching definitions
    #[arg(short = 'e', long)]
    pub expand: bool,

    /// Columns to display, in order (`all` for every column)
    #[arg(long, num_args = 1.., value_name = "NAME")]
    pub columns: Vec<String>,

    /// Display every extensible column
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Short column headers
    #[arg(long, conflicts_with = "full")]
    pub compact: bool,

    /// Full column headers (default)
    #[arg(long)]
    pub full: bool,

    /// Maximum rows to display
    #[arg(long, value_name = "N")]
    pub limit: Option<u64>,

    /// Maximum rows to display per file
    #[arg(long, value_name = "N")]
    pub limit_per_file: Option<u64>,

    /// List matching files with their match counts
    #[arg(long)]
    pub files: bool,

    /// Table of contents for the files matched by -f
    #[arg(long)]
    pub toc: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Highlight matches in source lines
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorMode,

    /// Echo every generated query to stderr
    #[arg(long)]
    pub debug: bool,

    /// Only log errors
    #[arg(long, conflicts_with = "verbose_log")]
    pub quiet: bool,

    /// Debug logging
    #[arg(long)]
    pub verbose_log: bool,
}

fn parse_context(value: &str) -> Result<ContextKind, String> {
    value.parse().map_err(|e: symq_core::errors::CoreError| e.to_string())
}

fn parse_file_pattern(value: &str) -> Result<FilePattern, String> {
    value.parse().map_err(|e: QueryError| e.to_string())
}

fn parse_line_range(value: &str) -> Result<LineRange, String> {
    value.parse().map_err(|e: QueryError| e.to_string())
}

impl Cli {
    /// The derived command plus one filter flag and one `--show-*` flag per
    /// extensible column.
    #[must_use]
    pub fn command_with_columns() -> clap::Command {
        columns::augment(Self::command())
    }

    /// Parse an owned argument vector (program name first).
    ///
    /// # Errors
    ///
    /// Returns the clap error for unknown flags or bad values.
    pub fn try_parse_args<I, T>(args: I) -> Result<(Self, ColumnArgs), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command_with_columns().try_get_matches_from(args)?;
        let cli = Self::from_arg_matches(&matches)?;
        Ok((cli, ColumnArgs::from_matches(&matches)))
    }

    /// Flag combinations that cannot run.
    ///
    /// # Errors
    ///
    /// Returns a message telling the user what to change.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.toc && self.files {
            bail!("--toc and --files cannot be combined; pick one listing");
        }
        if self.toc && self.file.is_empty() {
            bail!("--toc requires at least one -f file pattern, e.g. --toc -f 'src/*.c'");
        }
        if self.and.is_some() {
            if self.toc || self.files {
                bail!("--and cannot be combined with --toc or --files");
            }
            if self.patterns.len() < 2 {
                bail!(
                    "--and needs two or more patterns, got {}; pass the anchor pattern first",
                    self.patterns.len()
                );
            }
        }
        if self.patterns.is_empty() && !self.toc && !self.files {
            bail!("no search pattern given; pass a PATTERN or use --files / --toc");
        }
        Ok(())
    }

    /// Filters from the flags. Within-scopes are resolved later against the
    /// database.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] for bad column filter values.
    pub fn filter_set(&self, columns: &ColumnArgs) -> Result<FilterSet, QueryError> {
        let mut filters = FilterSet {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            files: self.file.clone(),
            line: self.line,
            ..FilterSet::default()
        };
        for (name, values) in &columns.filters {
            filters.add_column_values(name, values)?;
        }
        Ok(filters)
    }

    /// `-C` sets both sides; `-A`/`-B` override one side.
    #[must_use]
    pub fn context_lines(&self) -> Option<ContextLines> {
        if self.after.is_none() && self.before.is_none() && self.context.is_none() {
            return None;
        }
        let around = self.context.unwrap_or(0);
        Some(ContextLines {
            before: self.before.unwrap_or(around),
            after: self.after.unwrap_or(around),
        })
    }

    /// Effective row limit; `general.default_limit` applies when `--limit`
    /// is absent. Zero means unlimited either way.
    #[must_use]
    pub fn effective_limit(&self, config: &SymqConfig) -> Option<u64> {
        self.limit
            .or(Some(u64::from(config.general.default_limit)))
            .filter(|limit| *limit > 0)
    }

    /// Display settings for one query.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownColumn`] for bad `--columns` names.
    pub fn display_options(
        &self,
        columns: &ColumnArgs,
        config: &SymqConfig,
        color: bool,
    ) -> Result<DisplayOptions, QueryError> {
        Ok(DisplayOptions {
            verbose: self.verbose,
            columns: ColumnChoice::parse(&self.columns)?,
            show: columns.show.clone(),
            header_style: if self.compact {
                HeaderStyle::Compact
            } else {
                HeaderStyle::Full
            },
            limit: self.effective_limit(config),
            limit_per_file: self.limit_per_file.filter(|limit| *limit > 0),
            context: self.context_lines(),
            expand: self.expand,
            color,
        })
    }
}

/// Exit for a parse failure: help and version go to stdout with status 0,
/// everything else is a user error with status 1.
pub fn exit_on_parse_error(error: &clap::Error) -> ! {
    if matches!(
        error.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    ) {
        error.exit()
    }
    let _ = error.print();
    std::process::exit(1);
}

/// Short to long flag map of `command`, used to match config flag lines
/// against the command line whichever spelling either side uses.
#[must_use]
pub fn flag_aliases(command: &clap::Command) -> FlagAliases {
    FlagAliases::new(
        command
            .get_arguments()
            .filter_map(|arg| Some((arg.get_short()?, arg.get_long()?.to_string()))),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn parse(args: &[&str]) -> (Cli, ColumnArgs) {
        Cli::try_parse_args(args.iter().copied()).expect("cli should parse")
    }

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command_with_columns().debug_assert();
    }

    #[test]
    fn defaults() {
        let (cli, columns) = parse(&["symq", "main"]);
        assert_eq!(cli.patterns, vec!["main"]);
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.color, ColorMode::Auto);
        assert_eq!(cli.and, None);
        assert_eq!(cli.context_lines(), None);
        assert_eq!(columns, ColumnArgs::default());
    }

    #[test]
    fn and_without_value_defaults_to_five() {
        let (cli, _) = parse(&["symq", "handleRequest", "process", "--and"]);
        assert_eq!(cli.and, Some(5));
        let (cli, _) = parse(&["symq", "--and", "0", "malloc", "free"]);
        assert_eq!(cli.and, Some(0));
        assert_eq!(cli.patterns, vec!["malloc", "free"]);
    }

    #[test]
    fn context_flags_combine() {
        let (cli, _) = parse(&["symq", "main", "-C"]);
        assert_eq!(cli.context_lines(), Some(ContextLines { before: 3, after: 3 }));
        let (cli, _) = parse(&["symq", "main", "-C", "2", "-A", "5"]);
        assert_eq!(cli.context_lines(), Some(ContextLines { before: 2, after: 5 }));
        let (cli, _) = parse(&["symq", "main", "-B", "1"]);
        assert_eq!(cli.context_lines(), Some(ContextLines { before: 1, after: 0 }));
    }

    #[test]
    fn contexts_accept_full_and_compact_names() {
        let (cli, _) = parse(&["symq", "main", "-i", "function", "cls", "-x", "com"]);
        assert_eq!(cli.include, vec![ContextKind::Function, ContextKind::Class]);
        assert_eq!(cli.exclude, vec![ContextKind::Comment]);
    }

    #[rstest]
    #[case(&["symq", "main", "-C", "2"], &["--context 10"])]
    #[case(&["symq", "main", "--context", "2"], &["-C 10"])]
    #[case(&["symq", "main", "-p", "Server"], &["--parent Client"])]
    fn config_lines_defer_to_either_spelling(#[case] args: &[&str], #[case] config: &[&str]) {
        let config: Vec<String> = config.iter().map(|line| (*line).to_string()).collect();
        let merged = symq_config::merge_flag_lines(
            args,
            &config,
            &flag_aliases(&Cli::command_with_columns()),
        )
        .unwrap();
        assert_eq!(merged, args);
        assert!(Cli::try_parse_args(merged).is_ok());
    }

    #[test]
    fn config_exclusions_do_not_extend_explicit_ones() {
        let merged = symq_config::merge_flag_lines(
            &["symq", "main", "-x", "com"],
            &["--exclude str".to_string(), "--limit 5".to_string()],
            &flag_aliases(&Cli::command_with_columns()),
        )
        .unwrap();
        let (cli, _) = Cli::try_parse_args(merged).unwrap();
        assert_eq!(cli.exclude, vec![ContextKind::Comment]);
        assert_eq!(cli.limit, Some(5));
    }

    #[test]
    fn aliases_cover_derived_and_registry_flags() {
        let aliases = flag_aliases(&Cli::command_with_columns());
        let merged = symq_config::merge_flag_lines(
            &["symq", "-i", "func"],
            &["--include var".to_string()],
            &aliases,
        )
        .unwrap();
        assert_eq!(merged, vec!["symq", "-i", "func"]);
        let merged = symq_config::merge_flag_lines(
            &["symq", "-t", "int"],
            &["--type char".to_string()],
            &aliases,
        )
        .unwrap();
        assert_eq!(merged, vec!["symq", "-t", "int"]);
    }

    #[rstest]
    #[case(&["symq", "main", "-i", "closure"])]
    #[case(&["symq", "main", "-l", "0"])]
    #[case(&["symq", "main", "-l", "9-3"])]
    #[case(&["symq", "main", "--format", "xml"])]
    #[case(&["symq", "main", "--compact", "--full"])]
    fn rejects_bad_values(#[case] args: &[&str]) {
        assert!(Cli::try_parse_args(args.iter().copied()).is_err());
    }

    #[test]
    fn registry_flags_are_generated() {
        let (cli, columns) = parse(&[
            "symq",
            "port",
            "--parent",
            "Server",
            "Client",
            "-d",
            "1",
            "--show-type",
        ]);
        assert_eq!(
            columns.filters,
            vec![
                ("parent", vec!["Server".to_string(), "Client".to_string()]),
                ("definition", vec!["1".to_string()]),
            ]
        );
        assert_eq!(columns.show, vec!["type"]);

        let filters = cli.filter_set(&columns).unwrap();
        assert!(filters.has_column_filter("parent"));
        assert!(filters.has_column_filter("definition"));
    }

    #[test]
    fn non_numeric_definition_filter_is_rejected() {
        let (cli, columns) = parse(&["symq", "port", "--definition", "yes"]);
        assert!(matches!(
            cli.filter_set(&columns),
            Err(QueryError::InvalidInput(_))
        ));
    }

    #[rstest]
    #[case(&["symq", "--toc"], "requires at least one -f")]
    #[case(&["symq", "--toc", "--files", "-f", "a.c"], "cannot be combined")]
    #[case(&["symq", "handleRequest", "--and"], "two or more patterns")]
    #[case(&["symq", "a", "b", "--and", "--files"], "cannot be combined")]
    #[case(&["symq"], "no search pattern")]
    fn validation_failures(#[case] args: &[&str], #[case] message: &str) {
        let (cli, _) = parse(args);
        let err = cli.validate().unwrap_err();
        assert!(
            err.to_string().contains(message),
            "expected '{message}' in '{err}'"
        );
    }

    #[rstest]
    #[case(&["symq", "--toc", "-f", "a.c"])]
    #[case(&["symq", "--files"])]
    #[case(&["symq", "malloc", "free", "--and", "0"])]
    #[case(&["symq", "main", "-e", "-C", "2"])]
    fn validation_passes(#[case] args: &[&str]) {
        let (cli, _) = parse(args);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn limit_falls_back_to_config() {
        let mut config = SymqConfig::default();
        config.general.default_limit = 20;
        let (cli, _) = parse(&["symq", "main"]);
        assert_eq!(cli.effective_limit(&config), Some(20));
        let (cli, _) = parse(&["symq", "main", "--limit", "0"]);
        assert_eq!(cli.effective_limit(&config), None);
        let (cli, _) = parse(&["symq", "main", "--limit", "3"]);
        assert_eq!(cli.effective_limit(&config), Some(3));
    }

    #[test]
    fn display_options_follow_flags() {
        let (cli, columns) = parse(&["symq", "main", "--compact", "--columns", "line", "sym"]);
        let options = cli
            .display_options(&columns, &SymqConfig::default(), false)
            .unwrap();
        assert_eq!(options.header_style, HeaderStyle::Compact);
        assert!(matches!(options.columns, ColumnChoice::Explicit(ref cols) if cols.len() == 2));
    }
}
