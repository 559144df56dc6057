//! Candidate threshold discovery.
//!
//! The best minimum-distance threshold is not known up front, so the sweep
//! tries observed pairwise distances. Pairs are visited in index order
//! `(i, j)` with `i < j` and sampling stops at the pair cap, which keeps
//! discovery reproducible on large inputs at the cost of only seeing
//! early-index pairs.

use tracing::{debug, warn};

use super::config::SelectConfig;
use super::distance::DistanceMetric;
use super::types::Candidate;

/// Returns the sorted, deduplicated thresholds for a sweep.
///
/// Always contains 0. Values within `epsilon` of the previously kept value
/// collapse into it.
pub fn derive_thresholds(
    candidates: &[Candidate],
    distance: &dyn DistanceMetric,
    max_pairs: usize,
    epsilon: f64,
) -> Vec<f64> {
    if candidates.len() < 2 || max_pairs == 0 {
        return vec![0.0];
    }

    let total_pairs = candidates.len() * (candidates.len() - 1) / 2;
    let cap = max_pairs.min(total_pairs);

    let mut distances = Vec::with_capacity(cap + 1);
    distances.push(0.0);
    'outer: for (i, left) in candidates.iter().enumerate() {
        for right in &candidates[i + 1..] {
            distances.push(distance.distance(&left.record, &right.record));
            if distances.len() > cap {
                break 'outer;
            }
        }
    }

    if cap < total_pairs {
        warn!(
            sampled = cap,
            total = total_pairs,
            "Pair cap reached; thresholds derived from leading pairs only"
        );
    }

    distances.sort_by(|a, b| a.total_cmp(b));
    let thresholds = collapse_within(distances, epsilon);

    debug!(
        pairs = cap,
        thresholds = thresholds.len(),
        "Derived candidate thresholds"
    );

    if thresholds.is_empty() {
        vec![0.0]
    } else {
        thresholds
    }
}

/// Thresholds for a run: the explicit list if present, else derived ones.
pub fn resolve_thresholds(config: &SelectConfig, candidates: &[Candidate]) -> Vec<f64> {
    match &config.thresholds {
        Some(explicit) if !explicit.is_empty() => explicit.clone(),
        _ => derive_thresholds(
            candidates,
            config.distance.as_ref(),
            config.max_candidate_pairs,
            config.epsilon,
        ),
    }
}

/// Drops every value within `epsilon` of the last kept one. Input must be sorted.
fn collapse_within(sorted: Vec<f64>, epsilon: f64) -> Vec<f64> {
    let mut unique: Vec<f64> = Vec::with_capacity(sorted.len());
    for value in sorted {
        match unique.last() {
            Some(last) if (value - last).abs() <= epsilon || value.is_nan() => {}
            _ => unique.push(value),
        }
    }
    unique
}
