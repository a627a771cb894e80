//! Column flags generated from the schema registry.

use clap::{Arg, ArgAction, ArgMatches, Command};
use symq_core::schema::EXTENSIBLE_COLUMNS;

/// Column filter values and `--show-*` requests, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnArgs {
    pub filters: Vec<(&'static str, Vec<String>)>,
    pub show: Vec<&'static str>,
}

/// Add one filter flag and one show flag per extensible column.
#[must_use]
pub fn augment(mut command: Command) -> Command {
    for column in EXTENSIBLE_COLUMNS {
        let label = column.header.to_lowercase();
        if let Some(flag) = column.flag {
            let mut arg = Arg::new(column.name)
                .long(flag)
                .num_args(1..)
                .action(ArgAction::Append)
                .value_name("VALUE")
                .help(format!("Filter by {label}; values are OR'd, wildcards allowed"))
                .help_heading("Column filters");
            if let Some(short) = column.short {
                arg = arg.short(short);
            }
            command = command.arg(arg);
        }
        if let Some(show) = column.show_flag {
            command = command.arg(
                Arg::new(show)
                    .long(show)
                    .action(ArgAction::SetTrue)
                    .help(format!("Display the {label} column"))
                    .help_heading("Column display"),
            );
        }
    }
    command
}

impl ColumnArgs {
    /// Read the generated flags back out of parsed matches.
    #[must_use]
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let mut args = Self::default();
        for column in EXTENSIBLE_COLUMNS {
            if column.flag.is_some()
                && let Some(values) = matches.get_many::<String>(column.name)
            {
                args.filters.push((column.name, values.cloned().collect()));
            }
            if let Some(show) = column.show_flag
                && matches.get_flag(show)
            {
                args.show.push(column.name);
            }
        }
        args
    }
}
