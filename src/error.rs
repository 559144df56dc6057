//! Error types for lex-forge operations.
//!
//! The selection engine itself never fails: it coerces bad configuration
//! and short-circuits degenerate input. Errors come from the edges:
//! - Lexicon TSV reading and writing
//! - Training-log metric extraction
//! - Configuration parsing (environment, mode names)

use thiserror::Error;

/// Errors that can occur while reading or writing lexicon files.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("Invalid TSV row at line {line} (expected 2 or 3 columns, got {columns}): {content:?}")]
    InvalidRow {
        line: usize,
        columns: usize,
        content: String,
    },

    #[error("Record {index} has a {field} field containing a tab or line break: {value:?}")]
    InvalidField {
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("Failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while extracting metrics from training logs.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Invalid {kind} '{value}' at line {line}")]
    InvalidNumber {
        line: usize,
        kind: &'static str,
        value: String,
    },

    #[error("Invalid {name} regex: {source}")]
    Regex {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown {kind} mode '{value}'")]
    UnknownMode { kind: &'static str, value: String },
}
