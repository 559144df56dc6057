//! Core data types for lexicon selection.
//!
//! A [`Record`] is one lexicon row. During a selection run every record is
//! wrapped in a [`Candidate`] carrying its position, its tie-break key and a
//! lazily computed feature cache. The outcome of a run is a [`Selection`].

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::features::{FeatureExtractor, FeatureSet};

/// A lexicon row: a word, its pronunciation and opaque metadata.
///
/// The metadata column is carried through selection untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Primary text (typically the written word).
    pub primary: String,

    /// Secondary text (typically the pronunciation).
    pub secondary: String,

    /// Opaque metadata such as a tag column. Empty when absent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extra: String,
}

impl Record {
    /// Creates a record without metadata.
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
            extra: String::new(),
        }
    }

    /// Attaches metadata to the record.
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Returns true when the record carries a metadata column.
    pub fn has_extra(&self) -> bool {
        !self.extra.is_empty()
    }
}

/// A record decorated with deterministic ordering metadata for one run.
///
/// Candidates are immutable once built apart from the feature cache, which
/// is filled at most once and is safe to read from several threads.
#[derive(Debug)]
pub struct Candidate {
    /// The wrapped input record.
    pub record: Record,

    /// Position of the record in the input. Unique within a run.
    pub index: usize,

    /// Primary tie-break key. Equals `index` for unseeded runs.
    pub tie_break: u64,

    features: OnceLock<FeatureSet>,
}

impl Candidate {
    /// Wraps a record at `index` with the given tie-break key.
    pub fn new(record: Record, index: usize, tie_break: u64) -> Self {
        Self {
            record,
            index,
            tie_break,
            features: OnceLock::new(),
        }
    }

    /// Returns the cached features, extracting them on first use.
    pub fn features(&self, extractor: &FeatureExtractor) -> &FeatureSet {
        self.features.get_or_init(|| extractor.extract(&self.record))
    }

    /// Returns true if `self` wins an equal-gain tie against `other`.
    ///
    /// Smaller tie-break key wins; equal keys fall back to the smaller index.
    pub fn precedes(&self, other: &Candidate) -> bool {
        (self.tie_break, self.index) < (other.tie_break, other.index)
    }
}

/// The best-scoring subset found by a selection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected records in pick order.
    pub entries: Vec<Record>,

    /// Final value of the utility tracker.
    pub utility: f64,

    /// Minimum pairwise distance among `entries` (0 with fewer than two).
    pub min_distance: f64,

    /// Threshold whose greedy run produced this subset.
    pub threshold: f64,

    /// `utility + lambda * min_distance`.
    pub score: f64,
}

impl Selection {
    /// Number of selected records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
