//! GIST-style diverse subset selection for lexicons.
//!
//! This module shrinks a large word/pronunciation lexicon into a compact,
//! representative sample without near-duplicates.
//!
//! # Overview
//!
//! The selector maximizes
//!
//! ```text
//! f(S) = g(S) + lambda * min_dist(S)
//! ```
//!
//! where `g` is a monotone submodular utility (by default, weighted coverage
//! of character n-grams) and `min_dist` is the minimum pairwise distance
//! inside the subset. It sweeps a list of distance thresholds; for each one
//! it greedily builds a subset whose members are all at least that far
//! apart, and it returns the best-scoring subset.
//!
//! The pieces, leaf first:
//!
//! 1. **Distance** - [`DistanceMetric`] and the [`EditDistance`] built-ins
//! 2. **Features** - [`FeatureExtractor`] turning records into n-gram sets
//! 3. **Utility** - [`UtilityFactory`] / [`UtilityTracker`], [`CoverageUtility`]
//! 4. **Thresholds** - [`derive_thresholds`] from sampled pairwise distances
//! 5. **Selector** - [`GistSelector`] running the greedy pass and the sweep
//! 6. **Report** - [`SelectionReport`] summarizing a run
//!
//! # Usage
//!
//! ```rust
//! use lex_forge::diversity::{select, EditDistance, Record, SelectConfig, UtilityMode};
//!
//! let lexicon = vec![
//!     Record::new("cat", "kæt"),
//!     Record::new("bat", "bæt"),
//!     Record::new("phoneme", "ˈfoʊniːm"),
//! ];
//!
//! let config = SelectConfig::new()
//!     .with_k(2)
//!     .with_lambda(0.5)
//!     .with_distance(EditDistance::Joint)
//!     .with_utility_mode(UtilityMode::Joint)
//!     .with_seed(42);
//!
//! let selection = select(&lexicon, &config);
//! assert_eq!(selection.entries.len(), 2);
//! ```

pub mod config;
pub mod distance;
pub mod features;
pub mod report;
pub mod selector;
pub mod thresholds;
pub mod types;
pub mod utility;

// Re-export main types for convenience
pub use config::{SelectConfig, UtilityMode};
pub use distance::{levenshtein, normalized_levenshtein, DistanceMetric, EditDistance};
pub use features::{FeatureExtractor, FeatureSet};
pub use report::{SelectionReport, StageTimings};
pub use selector::{select, GistSelector, SweepOutcome, ThresholdOutcome};
pub use thresholds::derive_thresholds;
pub use types::{Candidate, Record, Selection};
pub use utility::{CoverageUtility, UniformUtility, UtilityFactory, UtilityTracker};
