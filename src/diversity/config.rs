//! Selection configuration.
//!
//! [`SelectConfig`] is a plain value object. Out-of-range numeric fields are
//! never rejected: [`SelectConfig::normalized`] coerces them to safe defaults
//! right before a run.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConfigError;

use super::distance::{normalize_mode, DistanceMetric, EditDistance};
use super::features::FeatureExtractor;
use super::utility::{CoverageUtility, UniformUtility, UtilityFactory};

/// Default tolerance for gain ties, score ties and threshold deduplication.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Default cap on pairs sampled while deriving thresholds.
pub const DEFAULT_MAX_CANDIDATE_PAIRS: usize = 10_000;

/// Default shortest n-gram length.
pub const DEFAULT_NGRAM_MIN: usize = 2;

/// Default longest n-gram length.
pub const DEFAULT_NGRAM_MAX: usize = 3;

/// Default per-field feature weight.
pub const DEFAULT_FIELD_WEIGHT: f64 = 1.0;

/// Default weight of the minimum-distance term in the score.
pub const DEFAULT_LAMBDA: f64 = 1.0;

/// Configuration for one selection run.
#[derive(Clone)]
pub struct SelectConfig {
    /// Target subset size. 0 selects up to the whole input.
    pub k: usize,
    /// Weight of the minimum pairwise distance in the score.
    pub lambda: f64,
    /// Numeric tolerance. Non-positive values fall back to [`DEFAULT_EPSILON`].
    pub epsilon: f64,
    /// Explicit thresholds to sweep. Derived from the data when `None`.
    pub thresholds: Option<Vec<f64>>,
    /// Tie-break seed. 0 keeps input order.
    pub seed: u64,
    /// Distance between records.
    pub distance: Arc<dyn DistanceMetric>,
    /// Objective maximized by the greedy pass.
    pub utility: Arc<dyn UtilityFactory>,
    /// Pair cap for threshold derivation. 0 means the default.
    pub max_candidate_pairs: usize,
    /// Shortest feature n-gram.
    pub ngram_min: usize,
    /// Longest feature n-gram.
    pub ngram_max: usize,
    /// Feature weight for primary-text n-grams.
    pub primary_weight: f64,
    /// Feature weight for secondary-text n-grams.
    pub secondary_weight: f64,
    /// Evaluate thresholds concurrently.
    pub parallel: bool,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            k: 0,
            lambda: DEFAULT_LAMBDA,
            epsilon: DEFAULT_EPSILON,
            thresholds: None,
            seed: 0,
            distance: Arc::new(EditDistance::Joint),
            utility: Arc::new(CoverageUtility),
            max_candidate_pairs: DEFAULT_MAX_CANDIDATE_PAIRS,
            ngram_min: DEFAULT_NGRAM_MIN,
            ngram_max: DEFAULT_NGRAM_MAX,
            primary_weight: DEFAULT_FIELD_WEIGHT,
            secondary_weight: DEFAULT_FIELD_WEIGHT,
            parallel: false,
        }
    }
}

impl fmt::Debug for SelectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectConfig")
            .field("k", &self.k)
            .field("lambda", &self.lambda)
            .field("epsilon", &self.epsilon)
            .field("thresholds", &self.thresholds)
            .field("seed", &self.seed)
            .field("max_candidate_pairs", &self.max_candidate_pairs)
            .field("ngram_min", &self.ngram_min)
            .field("ngram_max", &self.ngram_max)
            .field("primary_weight", &self.primary_weight)
            .field("secondary_weight", &self.secondary_weight)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}

impl SelectConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GIST_K`: target subset size (default: 0, whole input)
    /// - `GIST_LAMBDA`: min-distance weight (default: 1.0)
    /// - `GIST_EPSILON`: numeric tolerance (default: 1e-6)
    /// - `GIST_SEED`: tie-break seed (default: 0)
    /// - `GIST_MAX_CANDIDATE_PAIRS`: derivation pair cap (default: 10000)
    /// - `GIST_NGRAM_MIN` / `GIST_NGRAM_MAX`: n-gram range (default: 2..3)
    /// - `GIST_THRESHOLDS`: comma-separated explicit thresholds
    /// - `GIST_PARALLEL`: evaluate thresholds concurrently (default: false)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("GIST_K") {
            config.k = parse_env_value(&val, "GIST_K")?;
        }
        if let Some(val) = lookup("GIST_LAMBDA") {
            config.lambda = parse_env_value(&val, "GIST_LAMBDA")?;
        }
        if let Some(val) = lookup("GIST_EPSILON") {
            config.epsilon = parse_env_value(&val, "GIST_EPSILON")?;
        }
        if let Some(val) = lookup("GIST_SEED") {
            config.seed = parse_env_value(&val, "GIST_SEED")?;
        }
        if let Some(val) = lookup("GIST_MAX_CANDIDATE_PAIRS") {
            config.max_candidate_pairs = parse_env_value(&val, "GIST_MAX_CANDIDATE_PAIRS")?;
        }
        if let Some(val) = lookup("GIST_NGRAM_MIN") {
            config.ngram_min = parse_env_value(&val, "GIST_NGRAM_MIN")?;
        }
        if let Some(val) = lookup("GIST_NGRAM_MAX") {
            config.ngram_max = parse_env_value(&val, "GIST_NGRAM_MAX")?;
        }
        if let Some(val) = lookup("GIST_THRESHOLDS") {
            let thresholds = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_env_value(s, "GIST_THRESHOLDS"))
                .collect::<Result<Vec<f64>, _>>()?;
            config.thresholds = Some(thresholds);
        }
        if let Some(val) = lookup("GIST_PARALLEL") {
            config.parallel = parse_env_bool(&val, "GIST_PARALLEL")?;
        }

        Ok(config)
    }

    /// Returns a copy with every field coerced into its valid range.
    ///
    /// `entry_count` is the input size used when `k` is 0.
    pub fn normalized(&self, entry_count: usize) -> Self {
        let mut config = self.clone();

        if config.k == 0 {
            config.k = entry_count;
        }
        // NaN falls back too
        if config.epsilon.is_nan() || config.epsilon <= 0.0 {
            config.epsilon = DEFAULT_EPSILON;
        }
        if !config.lambda.is_finite() {
            config.lambda = 0.0;
        }
        if config.max_candidate_pairs == 0 {
            config.max_candidate_pairs = DEFAULT_MAX_CANDIDATE_PAIRS;
        }
        if config.ngram_min == 0 {
            config.ngram_min = DEFAULT_NGRAM_MIN;
        }
        if config.ngram_max == 0 {
            config.ngram_max = DEFAULT_NGRAM_MAX;
        }
        if config.ngram_max < config.ngram_min {
            config.ngram_max = config.ngram_min;
        }
        if config.primary_weight == 0.0 && config.secondary_weight == 0.0 {
            config.primary_weight = DEFAULT_FIELD_WEIGHT;
            config.secondary_weight = DEFAULT_FIELD_WEIGHT;
        } else {
            if config.primary_weight.is_nan() || config.primary_weight < 0.0 {
                config.primary_weight = DEFAULT_FIELD_WEIGHT;
            }
            if config.secondary_weight.is_nan() || config.secondary_weight < 0.0 {
                config.secondary_weight = DEFAULT_FIELD_WEIGHT;
            }
        }
        config.thresholds = config
            .thresholds
            .take()
            .map(|list| list.into_iter().filter(|t| !t.is_nan()).collect::<Vec<_>>())
            .filter(|list| !list.is_empty());

        config
    }

    /// Feature extractor matching this configuration's n-gram settings.
    pub fn feature_extractor(&self) -> FeatureExtractor {
        FeatureExtractor::new(
            self.ngram_min,
            self.ngram_max,
            self.primary_weight,
            self.secondary_weight,
        )
    }

    /// Builder method to set the target subset size.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Builder method to set the min-distance weight.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Builder method to set the numeric tolerance.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Builder method to set explicit thresholds.
    pub fn with_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Builder method to set the tie-break seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the distance metric.
    pub fn with_distance(mut self, distance: impl DistanceMetric + 'static) -> Self {
        self.distance = Arc::new(distance);
        self
    }

    /// Builder method to set the utility objective.
    pub fn with_utility(mut self, utility: impl UtilityFactory + 'static) -> Self {
        self.utility = Arc::new(utility);
        self
    }

    /// Builder method to set the derivation pair cap.
    pub fn with_max_candidate_pairs(mut self, pairs: usize) -> Self {
        self.max_candidate_pairs = pairs;
        self
    }

    /// Builder method to set the n-gram length range.
    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        self.ngram_min = min;
        self.ngram_max = max;
        self
    }

    /// Builder method to set per-field feature weights.
    pub fn with_field_weights(mut self, primary: f64, secondary: f64) -> Self {
        self.primary_weight = primary;
        self.secondary_weight = secondary;
        self
    }

    /// Builder method to toggle the parallel sweep.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Applies a utility preset.
    pub fn with_utility_mode(mut self, mode: UtilityMode) -> Self {
        mode.apply(&mut self);
        self
    }
}

/// Named utility presets accepted on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UtilityMode {
    /// Primary-text trigrams only.
    WordTrigram,
    /// Secondary-text 2..3-grams only.
    IpaNgram,
    /// 2..3-grams from both fields.
    #[default]
    Joint,
    /// Plain record count.
    Uniform,
}

impl UtilityMode {
    /// Writes the preset's objective and feature settings into `config`.
    pub fn apply(self, config: &mut SelectConfig) {
        let utility: Arc<dyn UtilityFactory> = match self {
            UtilityMode::Uniform => Arc::new(UniformUtility),
            _ => Arc::new(CoverageUtility),
        };
        let (min, max, primary, secondary) = match self {
            UtilityMode::WordTrigram => (3, 3, 1.0, 0.0),
            UtilityMode::IpaNgram => (2, 3, 0.0, 1.0),
            UtilityMode::Joint | UtilityMode::Uniform => (2, 3, 1.0, 1.0),
        };
        config.utility = utility;
        config.ngram_min = min;
        config.ngram_max = max;
        config.primary_weight = primary;
        config.secondary_weight = secondary;
    }
}

impl fmt::Display for UtilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UtilityMode::WordTrigram => "word-trigram",
            UtilityMode::IpaNgram => "ipa-ngram",
            UtilityMode::Joint => "joint",
            UtilityMode::Uniform => "uniform",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for UtilityMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_mode(s).as_str() {
            "wordtrigram" => Ok(UtilityMode::WordTrigram),
            "ipangram" => Ok(UtilityMode::IpaNgram),
            "joint" => Ok(UtilityMode::Joint),
            "uniform" | "count" => Ok(UtilityMode::Uniform),
            _ => Err(ConfigError::UnknownMode {
                kind: "utility",
                value: s.to_string(),
            }),
        }
    }
}

/// Parse an environment variable value.
fn parse_env_value<T: FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}
