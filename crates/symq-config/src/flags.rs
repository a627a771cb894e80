//! Default flags from the config file, merged into the command line.
//!
//! The `[flags]` section holds one list per tool. Each entry is a line of the
//! form `FLAG [VALUE...]`:
//!
//! ```toml
//! [flags]
//! query = ["--limit 50", "-x comment string"]
//! ```
//!
//! Lines are appended after the command-line arguments. A line whose flag
//! already appears on the command line is skipped, so explicit arguments
//! always win. Short and long spellings of one flag count as the same flag
//! when the caller supplies [`FlagAliases`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FlagDefaults {
    /// Default lines for the `symq` query tool.
    #[serde(default)]
    pub query: Vec<String>,

    /// Default lines for the `symq-load` ingest tool.
    #[serde(default)]
    pub load: Vec<String>,
}

/// Short flag to long flag map, e.g. `-C` → `--context`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagAliases {
    long_for_short: HashMap<char, String>,
}

impl FlagAliases {
    /// Build from `(short, long)` pairs; longs are given without dashes.
    pub fn new<I, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (char, L)>,
        L: Into<String>,
    {
        Self {
            long_for_short: pairs
                .into_iter()
                .map(|(short, long)| (short, long.into()))
                .collect(),
        }
    }

    /// The long spelling of `flag` if it is a known short flag, else `flag`.
    fn canonical(&self, flag: String) -> String {
        let mut chars = flag.strip_prefix('-').unwrap_or_default().chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) => self
                .long_for_short
                .get(&short)
                .map_or(flag, |long| format!("--{long}")),
            _ => flag,
        }
    }
}

/// Build one owned argument vector: the command line (program name first)
/// followed by every config line whose flag the command line does not
/// already carry. Lines are inserted before a `--` terminator if present.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if a non-empty, non-comment line does
/// not start with a flag.
pub fn merge_flag_lines<S: AsRef<str>>(
    cli_args: &[S],
    lines: &[String],
    aliases: &FlagAliases,
) -> Result<Vec<String>, ConfigError> {
    let mut merged: Vec<String> = cli_args.iter().map(|a| a.as_ref().to_string()).collect();
    let terminator = merged.iter().position(|arg| arg == "--");
    let present: HashSet<String> = merged
        .iter()
        .skip(1)
        .take(terminator.map_or(usize::MAX, |idx| idx.saturating_sub(1)))
        .filter_map(|arg| flag_name(arg))
        .map(|flag| aliases.canonical(flag))
        .collect();

    let mut extra = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(flag) = tokens.next().and_then(flag_name) else {
            return Err(ConfigError::InvalidValue {
                field: String::from("flags"),
                reason: format!("line '{line}' does not start with a flag"),
            });
        };
        let flag = aliases.canonical(flag);
        if present.contains(&flag) {
            tracing::debug!(%flag, "config flag overridden on command line");
            continue;
        }
        extra.extend(line.split_whitespace().map(str::to_string));
    }

    match terminator {
        Some(idx) => {
            merged.splice(idx..idx, extra);
        }
        None => merged.extend(extra),
    }
    Ok(merged)
}

/// Normalize an argument to the flag it names, if it is one.
///
/// `--limit=5` → `--limit`, `-C3` → `-C`, `-5` (a negative number) → `None`.
fn flag_name(arg: &str) -> Option<String> {
    if let Some(long) = arg.strip_prefix("--") {
        if long.is_empty() {
            return None;
        }
        let name = long.split_once('=').map_or(long, |(name, _)| name);
        return Some(format!("--{name}"));
    }
    let short = arg.strip_prefix('-')?;
    let first = short.chars().next()?;
    if first.is_ascii_digit() {
        return None;
    }
    Some(format!("-{first}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    fn merge<S: AsRef<str>>(cli_args: &[S], raw: &[&str]) -> Vec<String> {
        merge_flag_lines(cli_args, &lines(raw), &FlagAliases::default()).unwrap()
    }

    fn query_aliases() -> FlagAliases {
        FlagAliases::new([('C', "context"), ('x', "exclude"), ('i', "include")])
    }

    #[test]
    fn appends_lines_after_cli_args() {
        let merged = merge(&["symq", "main"], &["--limit 50", "-x com str"]);
        assert_eq!(
            merged,
            vec!["symq", "main", "--limit", "50", "-x", "com", "str"]
        );
    }

    #[test]
    fn skips_flags_present_on_cli() {
        let merged = merge(
            &["symq", "--limit=5", "main", "-C3"],
            &["--limit 50", "-C 10", "--compact"],
        );
        assert_eq!(merged, vec!["symq", "--limit=5", "main", "-C3", "--compact"]);
    }

    #[test]
    fn inserts_before_terminator() {
        let merged = merge(&["symq", "--", "-weird"], &["--verbose"]);
        assert_eq!(merged, vec!["symq", "--verbose", "--", "-weird"]);
    }

    #[test]
    fn ignores_blank_and_comment_lines() {
        let merged = merge(&["symq"], &["", "   ", "# note"]);
        assert_eq!(merged, vec!["symq"]);
    }

    #[test]
    fn rejects_lines_without_flag() {
        let err = merge_flag_lines(&["symq"], &lines(&["limit 5"]), &FlagAliases::default())
            .unwrap_err();
        assert!(err.to_string().contains("does not start with a flag"));
    }

    #[test]
    fn original_args_are_untouched() {
        let original = vec![String::from("symq"), String::from("main")];
        let merged = merge(&original, &["--files"]);
        assert_eq!(original.len(), 2);
        assert_eq!(merged.len(), 3);
    }

    #[rstest]
    #[case(&["symq", "main", "-C", "2"], "--context 10")]
    #[case(&["symq", "main", "--context=2"], "-C 10")]
    #[case(&["symq", "main", "-x", "com"], "--exclude str")]
    #[case(&["symq", "main", "--exclude", "com"], "-x str")]
    #[case(&["symq", "-C2", "main"], "--context")]
    fn short_and_long_spellings_are_one_flag(#[case] cli: &[&str], #[case] line: &str) {
        let merged = merge_flag_lines(cli, &lines(&[line]), &query_aliases()).unwrap();
        assert_eq!(merged, cli);
    }

    #[test]
    fn unrelated_aliased_flags_still_merge() {
        let merged = merge_flag_lines(
            &["symq", "main", "-C", "2"],
            &lines(&["--include func", "-x str"]),
            &query_aliases(),
        )
        .unwrap();
        assert_eq!(
            merged,
            vec!["symq", "main", "-C", "2", "--include", "func", "-x", "str"]
        );
    }

    #[test]
    fn unknown_short_flags_keep_their_spelling() {
        let aliases = query_aliases();
        assert_eq!(aliases.canonical("-z".into()), "-z");
        assert_eq!(aliases.canonical("-C".into()), "--context");
        assert_eq!(aliases.canonical("--limit".into()), "--limit");
    }

    #[rstest]
    #[case("--limit", Some("--limit"))]
    #[case("--limit=5", Some("--limit"))]
    #[case("-C3", Some("-C"))]
    #[case("-i", Some("-i"))]
    #[case("-5", None)]
    #[case("--", None)]
    #[case("main", None)]
    fn flag_names(#[case] arg: &str, #[case] expected: Option<&str>) {
        assert_eq!(flag_name(arg).as_deref(), expected);
    }
}
