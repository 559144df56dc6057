//! Metric extraction from trainer logs.
//!
//! Pulls `key=value` metrics out of free-form log lines, attributes each one
//! to an epoch, a split (`train` / `eval`) and optionally a language, and
//! writes them as a sorted CSV table:
//!
//! ```rust
//! use std::io::Cursor;
//! use lex_forge::logmetrics::{sort_records, Parser, ParserOptions};
//!
//! let mut parser = Parser::new(ParserOptions::new()?);
//! let mut records = parser.parse(Cursor::new("epoch 1 eval loss=0.5\nepoch 1 train loss=0.7"))?;
//! sort_records(&mut records);
//! assert_eq!(records[0].split, "eval");
//! # Ok::<(), lex_forge::error::MetricsError>(())
//! ```

pub mod output;
pub mod parser;

pub use output::{format_value, sort_records, write_csv, write_csv_path, CSV_HEADER};
pub use parser::{MetricRecord, Parser, ParserOptions};
