//! Monotone utility objectives scored during greedy selection.
//!
//! A [`UtilityFactory`] creates a fresh [`UtilityTracker`] for every
//! threshold run. Trackers must be monotone: `gain` is never negative and
//! `add` never lowers `value`.

use std::collections::HashSet;

use super::config::SelectConfig;
use super::features::FeatureExtractor;
use super::types::Candidate;

/// Stateful objective for one selection run.
pub trait UtilityTracker {
    /// Marginal value of adding `candidate` to the current selection.
    fn gain(&self, candidate: &Candidate) -> f64;

    /// Records `candidate` as selected.
    fn add(&mut self, candidate: &Candidate);

    /// Current accumulated value.
    fn value(&self) -> f64;
}

/// Creates trackers. Shared across threads when the sweep runs in parallel.
pub trait UtilityFactory: Send + Sync {
    /// Creates an empty tracker for a run over `candidates`.
    fn init(&self, config: &SelectConfig, candidates: &[Candidate]) -> Box<dyn UtilityTracker>;
}

/// Weighted set coverage over character n-gram features.
///
/// This is the default objective: a record is worth the total weight of the
/// n-grams it adds that no selected record already covers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageUtility;

impl UtilityFactory for CoverageUtility {
    fn init(&self, config: &SelectConfig, _candidates: &[Candidate]) -> Box<dyn UtilityTracker> {
        Box::new(CoverageTracker::new(config.feature_extractor()))
    }
}

/// Tracker state for [`CoverageUtility`].
#[derive(Debug, Clone)]
pub struct CoverageTracker {
    extractor: FeatureExtractor,
    covered: HashSet<String>,
    value: f64,
}

impl CoverageTracker {
    /// Creates an empty tracker extracting features with `extractor`.
    pub fn new(extractor: FeatureExtractor) -> Self {
        Self {
            extractor,
            covered: HashSet::new(),
            value: 0.0,
        }
    }

    /// Number of distinct features covered so far.
    pub fn covered_count(&self) -> usize {
        self.covered.len()
    }
}

impl UtilityTracker for CoverageTracker {
    fn gain(&self, candidate: &Candidate) -> f64 {
        candidate
            .features(&self.extractor)
            .iter()
            .filter(|(feature, _)| !self.covered.contains(feature.as_str()))
            .map(|(_, weight)| weight)
            .sum()
    }

    fn add(&mut self, candidate: &Candidate) {
        for (feature, weight) in candidate.features(&self.extractor) {
            if self.covered.insert(feature.clone()) {
                self.value += weight;
            }
        }
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// Counts selected records: every candidate is worth exactly one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformUtility;

impl UtilityFactory for UniformUtility {
    fn init(&self, _config: &SelectConfig, _candidates: &[Candidate]) -> Box<dyn UtilityTracker> {
        Box::new(UniformTracker::default())
    }
}

/// Tracker state for [`UniformUtility`].
#[derive(Debug, Clone, Default)]
pub struct UniformTracker {
    count: usize,
}

impl UtilityTracker for UniformTracker {
    fn gain(&self, _candidate: &Candidate) -> f64 {
        1.0
    }

    fn add(&mut self, _candidate: &Candidate) {
        self.count += 1;
    }

    fn value(&self) -> f64 {
        self.count as f64
    }
}
