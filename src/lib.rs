//! lex-forge: diverse lexicon selection for pronunciation model training.
//!
//! This library selects compact, representative, near-duplicate-free
//! subsets of word/pronunciation lexicons, reads and writes lexicon TSV
//! files, and extracts per-epoch metrics from trainer logs.

pub mod cli;
pub mod diversity;
pub mod error;
pub mod lexicon;
pub mod logmetrics;

// Re-export commonly used error types
pub use error::{ConfigError, LexiconError, MetricsError};
