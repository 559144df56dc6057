//! Training-pair loader.
//!
//! Turns a lexicon file into `(word, pronunciation)` pairs ready for a
//! training loop, optionally thinning it with GIST selection first and
//! sampling a random subset afterwards.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::diversity::{select, EditDistance, Record, SelectConfig, UtilityMode};
use crate::error::LexiconError;

use super::tsv::read_tsv_path;

/// A `(word, pronunciation)` training pair.
pub type Pair = (String, String);

/// GIST selection applied while loading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GistFilter {
    /// Target subset size.
    pub k: usize,
    /// Diversity weight.
    pub lambda: f64,
}

impl GistFilter {
    /// Selection config using joint edit distance and joint coverage.
    pub fn config(&self) -> SelectConfig {
        SelectConfig::new()
            .with_k(self.k)
            .with_lambda(self.lambda)
            .with_distance(EditDistance::Joint)
            .with_utility_mode(UtilityMode::Joint)
    }
}

/// Options for [`load_pairs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Diverse selection to run before sampling.
    pub gist: Option<GistFilter>,
    /// Keep a random sample of at most this many pairs.
    pub top: Option<usize>,
    /// Seed for the sampling shuffle; `None` draws from the thread RNG.
    pub shuffle_seed: Option<u64>,
}

impl LoadOptions {
    pub fn with_gist(mut self, k: usize, lambda: f64) -> Self {
        self.gist = Some(GistFilter { k, lambda });
        self
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }
}

/// Reads a lexicon from `path` and prepares training pairs.
pub fn load_pairs(path: &str, options: &LoadOptions) -> Result<Vec<Pair>, LexiconError> {
    let records = read_tsv_path(path)?;
    info!(path, entries = records.len(), "Loaded lexicon");
    Ok(prepare_pairs(records, options))
}

/// Applies the GIST filter and sampling of `options` to parsed records.
pub fn prepare_pairs(records: Vec<Record>, options: &LoadOptions) -> Vec<Pair> {
    let records = match options.gist {
        Some(filter) => {
            let before = records.len();
            let selection = select(&records, &filter.config());
            debug!(
                before,
                after = selection.len(),
                threshold = selection.threshold,
                score = selection.score,
                "Applied GIST filter"
            );
            selection.entries
        }
        None => records,
    };

    let mut pairs: Vec<Pair> = records
        .into_iter()
        .map(|record| (record.primary, record.secondary))
        .collect();

    if let Some(top) = options.top {
        let mut rng = create_rng(options.shuffle_seed);
        pairs.shuffle(&mut rng);
        pairs.truncate(top);
    }

    pairs
}

/// Calls `f` on every pair, in parallel batches of at least `chunk` pairs.
///
/// A `chunk` of 0 is treated as 1.
pub fn for_each_pair<F>(pairs: &[Pair], chunk: usize, f: F)
where
    F: Fn(&str, &str) + Sync + Send,
{
    pairs
        .par_iter()
        .with_min_len(chunk.max(1))
        .for_each(|(word, pronunciation)| f(word, pronunciation));
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}
