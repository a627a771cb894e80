//! # symq-cli
//!
//! Command-line front ends for the symq symbol index:
//! - `symq`: search, proximity search, file listing and table of contents
//! - `symq-load`: load front-end symbol records (JSON Lines) into the index
//!
//! Both binaries read `[flags]` defaults from the config file, merge them into
//! an owned argument vector, parse it with clap, and report failures as
//! `<tool> error: ...` with exit code 1.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;
pub mod ui;
