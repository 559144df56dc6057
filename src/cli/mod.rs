//! Command-line interface for lex-forge.
//!
//! Provides the `select` and `metrics` commands.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, MetricsArgs, SelectArgs};
