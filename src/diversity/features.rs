//! Character n-gram feature extraction for coverage scoring.

use std::collections::BTreeMap;

use super::types::Record;

/// Key prefix for n-grams taken from the primary text.
const PRIMARY_PREFIX: &str = "w:";

/// Key prefix for n-grams taken from the secondary text.
const SECONDARY_PREFIX: &str = "i:";

/// Weighted features of one record, keyed by field-tagged n-gram.
///
/// Ordered so that gain sums are accumulated in the same order every run.
pub type FeatureSet = BTreeMap<String, f64>;

/// Extracts overlapping character n-grams from both text fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureExtractor {
    ngram_min: usize,
    ngram_max: usize,
    primary_weight: f64,
    secondary_weight: f64,
}

impl FeatureExtractor {
    /// Creates an extractor for n-grams of length `ngram_min..=ngram_max`.
    ///
    /// A minimum below 1 is raised to 1 and a maximum below the minimum is
    /// raised to the minimum.
    pub fn new(
        ngram_min: usize,
        ngram_max: usize,
        primary_weight: f64,
        secondary_weight: f64,
    ) -> Self {
        let ngram_min = ngram_min.max(1);
        Self {
            ngram_min,
            ngram_max: ngram_max.max(ngram_min),
            primary_weight,
            secondary_weight,
        }
    }

    /// Returns the inclusive n-gram length range.
    pub fn ngram_range(&self) -> (usize, usize) {
        (self.ngram_min, self.ngram_max)
    }

    /// Builds the coverage set for a record.
    ///
    /// Fields with a non-positive weight contribute nothing. Repeated n-grams
    /// within a field keep a single entry.
    pub fn extract(&self, record: &Record) -> FeatureSet {
        let mut features = FeatureSet::new();
        self.add_ngrams(&mut features, PRIMARY_PREFIX, &record.primary, self.primary_weight);
        self.add_ngrams(&mut features, SECONDARY_PREFIX, &record.secondary, self.secondary_weight);
        features
    }

    fn add_ngrams(&self, features: &mut FeatureSet, prefix: &str, text: &str, weight: f64) {
        if weight <= 0.0 || text.is_empty() {
            return;
        }
        let chars: Vec<char> = text.chars().collect();
        for n in self.ngram_min..=self.ngram_max.min(chars.len()) {
            for window in chars.windows(n) {
                let mut key = String::with_capacity(prefix.len() + n * 4);
                key.push_str(prefix);
                key.extend(window.iter());
                features.entry(key).or_insert(weight);
            }
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(2, 3, 1.0, 1.0)
    }
}
