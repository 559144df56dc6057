//! Distance metrics between lexicon records.
//!
//! All built-in metrics are edit distances normalized by the length of the
//! longer compared string, counted in characters so multi-byte scripts
//! such as IPA are measured correctly. Results lie in `[0, 1]`.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

use super::types::Record;

/// Separator placed between primary and secondary text for joint comparison.
const JOINT_SEPARATOR: char = '|';

/// A symmetric, side-effect free dissimilarity between two records.
///
/// Implementations must return a value `>= 0`, with `0` meaning the records
/// are identical under the compared fields. Metrics are shared read-only
/// across threads when a sweep runs in parallel.
pub trait DistanceMetric: Send + Sync {
    /// Computes the distance between `a` and `b`.
    fn distance(&self, a: &Record, b: &Record) -> f64;
}

impl<F> DistanceMetric for F
where
    F: Fn(&Record, &Record) -> f64 + Send + Sync,
{
    fn distance(&self, a: &Record, b: &Record) -> f64 {
        self(a, b)
    }
}

/// Built-in normalized edit distances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditDistance {
    /// Compare primary text only.
    Primary,
    /// Compare secondary text only.
    Secondary,
    /// Compare `primary|secondary`.
    #[default]
    Joint,
}

impl DistanceMetric for EditDistance {
    fn distance(&self, a: &Record, b: &Record) -> f64 {
        match self {
            EditDistance::Primary => normalized_levenshtein(&a.primary, &b.primary),
            EditDistance::Secondary => normalized_levenshtein(&a.secondary, &b.secondary),
            EditDistance::Joint => normalized_levenshtein(&joint_key(a), &joint_key(b)),
        }
    }
}

impl fmt::Display for EditDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditDistance::Primary => "word-levenshtein",
            EditDistance::Secondary => "ipa-levenshtein",
            EditDistance::Joint => "joint",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for EditDistance {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_mode(s).as_str() {
            "word" | "wordlevenshtein" | "primary" => Ok(EditDistance::Primary),
            "ipa" | "ipalevenshtein" | "secondary" => Ok(EditDistance::Secondary),
            "joint" => Ok(EditDistance::Joint),
            _ => Err(ConfigError::UnknownMode {
                kind: "distance",
                value: s.to_string(),
            }),
        }
    }
}

/// Lower-cases a mode name and strips `-` and `_`.
pub(crate) fn normalize_mode(mode: &str) -> String {
    mode.to_lowercase()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect()
}

fn joint_key(record: &Record) -> String {
    let mut key = String::with_capacity(record.primary.len() + record.secondary.len() + 1);
    key.push_str(&record.primary);
    key.push(JOINT_SEPARATOR);
    key.push_str(&record.secondary);
    key
}

/// Levenshtein distance divided by the longer string's character count.
///
/// Two empty strings are at distance 0.
pub fn normalized_levenshtein(left: &str, right: &str) -> f64 {
    if left == right {
        return 0.0;
    }
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();
    let longest = left.len().max(right.len());
    if longest == 0 {
        return 0.0;
    }
    levenshtein(&left, &right) as f64 / longest as f64
}

/// Character-level Levenshtein distance using two rolling rows.
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    // Keep the shorter sequence in the rows.
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return long.len();
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        current[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let cost = usize::from(lc != sc);
            current[j + 1] = (current[j] + 1)
                .min(previous[j + 1] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}
