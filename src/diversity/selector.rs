//! GIST selection: greedy independent sets swept over distance thresholds.
//!
//! For every candidate threshold `t` the selector greedily builds a subset
//! in which all pairs are at least `t` apart, always taking the candidate
//! with the largest marginal utility gain. Each subset is scored as
//! `utility + lambda * min_pairwise_distance` and the best one wins.
//!
//! # Determinism
//!
//! Gains within `epsilon` of each other are ties. Ties go to the smaller
//! tie-break key, then the smaller input index. Without a seed the key is
//! the input index, so results follow input order. With a seed the keys are
//! drawn once per candidate from a ChaCha stream, so a given seed always
//! yields the same selection.
//!
//! # Complexity
//!
//! Threshold discovery costs at most `max_candidate_pairs` distance calls.
//! Each threshold costs `O(k * n)` gain evaluations and `O(k * n)` distance
//! calls: after every pick only the distance to the new pick is checked.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::config::SelectConfig;
use super::distance::DistanceMetric;
use super::thresholds::resolve_thresholds;
use super::types::{Candidate, Record, Selection};

/// Result of the greedy pass for a single threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdOutcome {
    /// Threshold enforced during this pass.
    pub threshold: f64,
    /// Input indices of the picked records, in pick order.
    pub picks: Vec<usize>,
    /// Final utility value.
    pub utility: f64,
    /// Minimum pairwise distance among the picks.
    pub min_distance: f64,
    /// `utility + lambda * min_distance`.
    pub score: f64,
}

/// Everything a sweep produced: the winner and each per-threshold outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepOutcome {
    /// Best-scoring subset.
    pub selection: Selection,
    /// Outcomes in the order thresholds were swept.
    pub evaluated: Vec<ThresholdOutcome>,
}

/// Selects a compact, diverse subset of records.
///
/// # Example
///
/// ```
/// use lex_forge::diversity::{GistSelector, Record, SelectConfig};
///
/// let records = vec![Record::new("ab", ""), Record::new("bc", "")];
/// let config = SelectConfig::new()
///     .with_k(2)
///     .with_lambda(0.0)
///     .with_thresholds(vec![0.0])
///     .with_ngram_range(1, 1);
///
/// let selection = GistSelector::new(config).select(&records);
/// assert_eq!(selection.entries.len(), 2);
/// assert_eq!(selection.utility, 3.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GistSelector {
    config: SelectConfig,
}

impl GistSelector {
    /// Creates a selector for `config`.
    pub fn new(config: SelectConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration as given (before coercion).
    pub fn config(&self) -> &SelectConfig {
        &self.config
    }

    /// Runs the sweep and returns the best-scoring subset.
    pub fn select(&self, records: &[Record]) -> Selection {
        self.evaluate(records).selection
    }

    /// Runs the sweep and returns the winner plus every threshold outcome.
    pub fn evaluate(&self, records: &[Record]) -> SweepOutcome {
        let config = self.config.normalized(records.len());
        if records.is_empty() || config.k == 0 {
            return SweepOutcome::default();
        }

        let candidates = make_candidates(records, config.seed);
        let thresholds = resolve_thresholds(&config, &candidates);

        let evaluated: Vec<ThresholdOutcome> = if config.parallel {
            thresholds
                .par_iter()
                .map(|&threshold| evaluate_threshold(&candidates, &config, threshold))
                .collect()
        } else {
            thresholds
                .iter()
                .map(|&threshold| evaluate_threshold(&candidates, &config, threshold))
                .collect()
        };

        let mut best: Option<&ThresholdOutcome> = None;
        for outcome in &evaluated {
            let replace = match best {
                None => true,
                Some(current) => is_better(outcome, current, config.epsilon),
            };
            if replace {
                best = Some(outcome);
            }
        }

        let selection = best
            .map(|outcome| Selection {
                entries: outcome
                    .picks
                    .iter()
                    .map(|&i| candidates[i].record.clone())
                    .collect(),
                utility: outcome.utility,
                min_distance: outcome.min_distance,
                threshold: outcome.threshold,
                score: outcome.score,
            })
            .unwrap_or_default();

        debug!(
            thresholds = evaluated.len(),
            selected = selection.entries.len(),
            threshold = selection.threshold,
            score = selection.score,
            "Sweep finished"
        );

        SweepOutcome {
            selection,
            evaluated,
        }
    }
}

/// Runs GIST selection over `records` with `config`.
pub fn select(records: &[Record], config: &SelectConfig) -> Selection {
    GistSelector::new(config.clone()).select(records)
}

/// Wraps records into candidates with their tie-break keys.
///
/// Seed 0 uses the input index as key; any other seed draws one key per
/// candidate, in input order, from a ChaCha stream seeded once.
pub fn make_candidates(records: &[Record], seed: u64) -> Vec<Candidate> {
    if seed == 0 {
        return records
            .iter()
            .enumerate()
            .map(|(i, record)| Candidate::new(record.clone(), i, i as u64))
            .collect();
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    records
        .iter()
        .enumerate()
        .map(|(i, record)| Candidate::new(record.clone(), i, rng.next_u64()))
        .collect()
}

/// Greedy pass plus scoring for one threshold.
pub fn evaluate_threshold(
    candidates: &[Candidate],
    config: &SelectConfig,
    threshold: f64,
) -> ThresholdOutcome {
    let (picks, utility) = greedy_independent_set(candidates, config, threshold);
    let min_distance = min_pairwise_distance(candidates, &picks, config.distance.as_ref());
    let score = utility + config.lambda * min_distance;

    debug!(
        threshold,
        selected = picks.len(),
        utility,
        min_distance,
        score,
        "Evaluated threshold"
    );

    ThresholdOutcome {
        threshold,
        picks,
        utility,
        min_distance,
        score,
    }
}

/// Builds the max-gain independent set for `threshold`.
///
/// Returns the picked indices in pick order and the final utility value.
/// Stops early once no eligible candidate has a positive gain.
pub fn greedy_independent_set(
    candidates: &[Candidate],
    config: &SelectConfig,
    threshold: f64,
) -> (Vec<usize>, f64) {
    let mut tracker = config.utility.init(config, candidates);
    let mut picks: Vec<usize> = Vec::with_capacity(config.k.min(candidates.len()));
    // true once a candidate is picked or sits too close to a pick
    let mut unavailable = vec![false; candidates.len()];
    let constrained = threshold > 0.0;

    while picks.len() < config.k {
        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            if unavailable[i] {
                continue;
            }
            let gain = tracker.gain(candidate);
            let better = match best {
                None => true,
                Some((best_idx, best_gain)) => {
                    gain > best_gain + config.epsilon
                        || ((gain - best_gain).abs() <= config.epsilon
                            && candidate.precedes(&candidates[best_idx]))
                }
            };
            if better {
                best = Some((i, gain));
            }
        }

        let Some((pick, gain)) = best else {
            break;
        };
        if gain <= 0.0 {
            break;
        }

        unavailable[pick] = true;
        tracker.add(&candidates[pick]);
        picks.push(pick);

        if constrained && picks.len() < config.k {
            let picked = &candidates[pick].record;
            for (i, candidate) in candidates.iter().enumerate() {
                if !unavailable[i]
                    && config.distance.distance(&candidate.record, picked) < threshold
                {
                    unavailable[i] = true;
                }
            }
        }
    }

    (picks, tracker.value())
}

/// Smallest distance between any two picked candidates, 0 with fewer than two.
pub fn min_pairwise_distance(
    candidates: &[Candidate],
    picks: &[usize],
    distance: &dyn DistanceMetric,
) -> f64 {
    if picks.len() < 2 {
        return 0.0;
    }
    let mut min = f64::INFINITY;
    for (n, &i) in picks.iter().enumerate() {
        for &j in &picks[n + 1..] {
            let d = distance.distance(&candidates[i].record, &candidates[j].record);
            if d < min {
                min = d;
            }
        }
    }
    if min.is_infinite() {
        0.0
    } else {
        min
    }
}

/// Ordered comparison between sweep outcomes.
///
/// Higher score wins; scores within `epsilon` fall back to higher utility,
/// then to the smaller threshold.
fn is_better(candidate: &ThresholdOutcome, best: &ThresholdOutcome, epsilon: f64) -> bool {
    if candidate.score > best.score + epsilon {
        return true;
    }
    if (candidate.score - best.score).abs() > epsilon {
        return false;
    }
    if candidate.utility > best.utility + epsilon {
        return true;
    }
    if (candidate.utility - best.utility).abs() > epsilon {
        return false;
    }
    candidate.threshold < best.threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diversity::distance::EditDistance;
    use crate::diversity::utility::{UniformUtility, UtilityFactory, UtilityTracker};

    fn words(list: &[&str]) -> Vec<Record> {
        list.iter().map(|w| Record::new(*w, "")).collect()
    }

    fn abc_distance(a: &Record, b: &Record) -> f64 {
        if a.primary == b.primary {
            return 0.0;
        }
        match (a.primary.as_str(), b.primary.as_str()) {
            ("a", "b") | ("b", "a") => 0.2,
            ("a", "c") | ("c", "a") | ("b", "c") | ("c", "b") => 0.9,
            _ => 1.0,
        }
    }

    #[test]
    fn test_select_coverage_utility() {
        let config = SelectConfig::new()
            .with_k(2)
            .with_thresholds(vec![0.0])
            .with_ngram_range(1, 1)
            .with_lambda(0.0);
        let selection = select(&words(&["ab", "bc"]), &config);

        assert_eq!(selection.entries.len(), 2);
        assert_eq!(selection.utility, 3.0);
    }

    #[test]
    fn test_stable_tie_break_prefers_first() {
        let records = vec![
            Record::new("aa", "").with_extra("first"),
            Record::new("aa", "").with_extra("second"),
        ];
        let config = SelectConfig::new()
            .with_k(1)
            .with_thresholds(vec![0.0])
            .with_ngram_range(1, 1)
            .with_lambda(0.0);
        let selection = select(&records, &config);
        assert_eq!(selection.entries.len(), 1);
        assert_eq!(selection.entries[0].extra, "first");
    }

    /// Gain of `1 + index * step` for every unpicked candidate.
    struct IndexBiasUtility {
        step: f64,
    }

    struct IndexBiasTracker {
        step: f64,
        picked: Vec<usize>,
    }

    impl UtilityFactory for IndexBiasUtility {
        fn init(
            &self,
            _config: &SelectConfig,
            _candidates: &[Candidate],
        ) -> Box<dyn UtilityTracker> {
            Box::new(IndexBiasTracker {
                step: self.step,
                picked: Vec::new(),
            })
        }
    }

    impl UtilityTracker for IndexBiasTracker {
        fn gain(&self, candidate: &Candidate) -> f64 {
            if self.picked.contains(&candidate.index) {
                0.0
            } else {
                1.0 + candidate.index as f64 * self.step
            }
        }

        fn add(&mut self, candidate: &Candidate) {
            self.picked.push(candidate.index);
        }

        fn value(&self) -> f64 {
            self.picked.iter().map(|&i| 1.0 + i as f64 * self.step).sum()
        }
    }

    fn near_tie_config(step: f64) -> SelectConfig {
        SelectConfig::new()
            .with_k(1)
            .with_thresholds(vec![0.0])
            .with_epsilon(1e-6)
            .with_lambda(0.0)
            .with_utility(IndexBiasUtility { step })
    }

    #[test]
    fn test_gains_within_epsilon_tie_to_smaller_index() {
        let records = words(&["a", "b", "c"]);

        let selection = select(&records, &near_tie_config(1e-9));
        assert_eq!(selection.entries.len(), 1);
        assert_eq!(selection.entries[0].primary, "a");

        let selection = select(&records, &near_tie_config(1e-3));
        assert_eq!(selection.entries[0].primary, "c");
    }

    #[test]
    fn test_seed_changes_which_duplicate_wins() {
        let records = vec![
            Record::new("aa", "").with_extra("first"),
            Record::new("aa", "").with_extra("second"),
        ];
        let config = SelectConfig::new()
            .with_k(1)
            .with_thresholds(vec![0.0])
            .with_ngram_range(1, 1)
            .with_lambda(0.0);

        let unseeded = select(&records, &config);
        assert_eq!(unseeded.entries[0].extra, "first");

        let seed = (1..=64u64)
            .find(|&seed| {
                let candidates = make_candidates(&records, seed);
                candidates[1].tie_break < candidates[0].tie_break
            })
            .expect("some seed should order the second record first");
        let seeded = select(&records, &config.with_seed(seed));
        assert_eq!(seeded.entries.len(), 1);
        assert_eq!(seeded.entries[0].extra, "second");
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let records = vec![
            Record::new("aa", "").with_extra("first"),
            Record::new("aa", "").with_extra("second"),
        ];
        let config = SelectConfig::new()
            .with_k(1)
            .with_thresholds(vec![0.0])
            .with_ngram_range(1, 1)
            .with_lambda(0.0)
            .with_seed(42);
        let first = select(&records, &config);
        let second = select(&records, &config);
        assert_eq!(first.entries, second.entries);
    }

    #[test]
    fn test_seeded_keys_are_not_index_order() {
        let records = words(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let candidates = make_candidates(&records, 7);
        let keys: Vec<u64> = candidates.iter().map(|c| c.tie_break).collect();
        assert_ne!(keys, (0..8).collect::<Vec<u64>>());
        let keys_for = |seed| {
            make_candidates(&records, seed)
                .iter()
                .map(|c| c.tie_break)
                .collect::<Vec<_>>()
        };
        assert_eq!(keys, keys_for(7));
        assert_ne!(keys, keys_for(8));
    }

    #[test]
    fn test_unseeded_keys_follow_index() {
        let candidates = make_candidates(&words(&["x", "y", "z"]), 0);
        for (i, candidate) in candidates.iter().enumerate() {
            assert_eq!(candidate.index, i);
            assert_eq!(candidate.tie_break, i as u64);
        }
    }

    #[test]
    fn test_threshold_constraint() {
        let config = SelectConfig::new()
            .with_k(2)
            .with_thresholds(vec![0.5])
            .with_lambda(0.0)
            .with_distance(abc_distance)
            .with_utility(UniformUtility);
        let selection = select(&words(&["a", "b", "c"]), &config);

        let picked: Vec<&str> = selection.entries.iter().map(|r| r.primary.as_str()).collect();
        assert_eq!(picked, vec!["a", "c"]);
        assert!((selection.min_distance - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_infinite_threshold_keeps_one_record() {
        let config = SelectConfig::new()
            .with_k(3)
            .with_thresholds(vec![f64::INFINITY])
            .with_utility(UniformUtility);
        let selection = select(&words(&["alpha", "beta", "gamma"]), &config);
        assert_eq!(selection.entries.len(), 1);
        assert_eq!(selection.threshold, f64::INFINITY);
    }

    #[test]
    fn test_no_eligible_candidate_halts() {
        // all pairs are at 0.2, threshold 0.5 leaves room for one pick only
        let config = SelectConfig::new()
            .with_k(3)
            .with_thresholds(vec![0.5])
            .with_distance(|a: &Record, b: &Record| if a == b { 0.0 } else { 0.2 })
            .with_utility(UniformUtility);
        let selection = select(&words(&["a", "b", "c"]), &config);
        assert_eq!(selection.entries.len(), 1);
        assert_eq!(selection.min_distance, 0.0);
    }

    #[test]
    fn test_all_duplicates_have_no_gain_after_first() {
        let config = SelectConfig::new()
            .with_k(3)
            .with_thresholds(vec![0.0])
            .with_ngram_range(1, 1);
        let selection = select(&words(&["aa", "aa", "aa"]), &config);
        assert_eq!(selection.entries.len(), 1);
    }

    #[test]
    fn test_empty_text_has_no_gain() {
        let config = SelectConfig::new().with_thresholds(vec![0.0]);
        let selection = select(&[Record::default(), Record::default()], &config);
        assert!(selection.is_empty());
        assert_eq!(selection.utility, 0.0);
    }

    #[test]
    fn test_empty_input_returns_empty() {
        let selection = select(&[], &SelectConfig::default());
        assert_eq!(selection, Selection::default());

        let outcome = GistSelector::default().evaluate(&[]);
        assert!(outcome.evaluated.is_empty());
    }

    #[test]
    fn test_k_larger_than_input() {
        let config = SelectConfig::new().with_k(10).with_thresholds(vec![0.0]);
        let selection = select(&words(&["alpha", "beta", "gamma"]), &config);
        assert_eq!(selection.entries.len(), 3);
    }

    #[test]
    fn test_k_zero_selects_up_to_all() {
        let config = SelectConfig::new().with_k(0).with_thresholds(vec![0.0]);
        let selection = select(&words(&["alpha", "beta", "gamma"]), &config);
        assert_eq!(selection.entries.len(), 3);
    }

    #[test]
    fn test_min_pairwise_distance() {
        let candidates = make_candidates(&words(&["a", "b", "c"]), 0);
        let metric = abc_distance;
        assert_eq!(min_pairwise_distance(&candidates, &[0], &metric), 0.0);
        assert!((min_pairwise_distance(&candidates, &[0, 1, 2], &metric) - 0.2).abs() < 1e-12);
        assert!((min_pairwise_distance(&candidates, &[0, 2], &metric) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_is_better_ordering() {
        let outcome = |threshold: f64, utility: f64, score: f64| ThresholdOutcome {
            threshold,
            picks: Vec::new(),
            utility,
            min_distance: 0.0,
            score,
        };
        let eps = 1e-6;
        assert!(is_better(&outcome(0.5, 1.0, 2.0), &outcome(0.0, 1.0, 1.0), eps));
        assert!(!is_better(&outcome(0.0, 1.0, 1.0), &outcome(0.5, 1.0, 2.0), eps));
        // equal score, higher utility wins
        assert!(is_better(&outcome(0.5, 2.0, 2.0), &outcome(0.0, 1.0, 2.0), eps));
        // equal score and utility, smaller threshold wins
        assert!(is_better(&outcome(0.1, 1.0, 2.0), &outcome(0.5, 1.0, 2.0), eps));
        assert!(!is_better(&outcome(0.5, 1.0, 2.0), &outcome(0.1, 1.0, 2.0), eps));
    }

    #[test]
    fn test_sweep_prefers_diverse_set_when_lambda_positive() {
        // "a" and "b" are close; a single utility point is worth less than the spread
        let config = SelectConfig::new()
            .with_k(2)
            .with_thresholds(vec![0.0, 0.5])
            .with_lambda(10.0)
            .with_distance(abc_distance)
            .with_utility(UniformUtility);
        let outcome = GistSelector::new(config).evaluate(&words(&["a", "b", "c"]));

        assert_eq!(outcome.evaluated.len(), 2);
        assert_eq!(outcome.selection.threshold, 0.5);
        assert!((outcome.selection.score - (2.0 + 10.0 * 0.9)).abs() < 1e-9);
    }

    #[test]
    fn test_equal_scores_prefer_smaller_threshold() {
        let config = SelectConfig::new()
            .with_k(2)
            .with_thresholds(vec![0.5, 0.1])
            .with_lambda(0.0)
            .with_distance(abc_distance)
            .with_utility(UniformUtility);
        let selection = select(&words(&["a", "b", "c"]), &config);
        assert_eq!(selection.threshold, 0.1);
    }

    #[test]
    fn test_derived_thresholds_selection_is_independent() {
        let records = words(&["cat", "bat", "rat", "dog", "fog", "log", "zebra"]);
        let config = SelectConfig::new()
            .with_k(4)
            .with_distance(EditDistance::Primary);
        let selection = select(&records, &config);
        assert!(!selection.is_empty());
        assert!(selection.entries.len() <= 4);

        for (i, a) in selection.entries.iter().enumerate() {
            for b in &selection.entries[i + 1..] {
                assert!(
                    EditDistance::Primary.distance(a, b) >= selection.threshold,
                    "{} and {} violate threshold {}",
                    a.primary,
                    b.primary,
                    selection.threshold
                );
            }
        }
    }

    #[test]
    fn test_parallel_sweep_matches_sequential() {
        let records = words(&[
            "cat", "bat", "rat", "dog", "fog", "log", "zebra", "zebu", "lexicon", "lexical",
        ]);
        let config = SelectConfig::new().with_k(5).with_seed(3);
        let sequential = GistSelector::new(config.clone()).evaluate(&records);
        let parallel = GistSelector::new(config.with_parallel(true)).evaluate(&records);

        assert_eq!(sequential.selection, parallel.selection);
        assert_eq!(sequential.evaluated, parallel.evaluated);
    }
}
