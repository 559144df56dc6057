//! CLI command definitions for lex-forge.
//!
//! `select` shrinks a lexicon TSV to a diverse subset; `metrics` turns a
//! trainer log into a per-epoch CSV table.

use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use crate::diversity::config::{DEFAULT_EPSILON, DEFAULT_LAMBDA, DEFAULT_MAX_CANDIDATE_PAIRS};
use crate::diversity::{
    EditDistance, GistSelector, SelectConfig, SelectionReport, StageTimings, UtilityMode,
};
use crate::lexicon::{open_input, open_output, read_tsv_path, write_tsv_path};
use crate::logmetrics::{sort_records, write_csv, Parser as LogParser, ParserOptions};

/// Diverse lexicon selection and training-log tooling.
#[derive(Parser)]
#[command(name = "lex-forge")]
#[command(about = "Select diverse lexicon subsets and extract training metrics")]
#[command(version)]
#[command(
    long_about = "lex-forge shrinks word/pronunciation lexicons into compact, diverse samples and extracts per-epoch metrics from trainer logs.\n\nExample usage:\n  lex-forge select --in dicts/en/lexicon.tsv --out dicts/en/lexicon.gist.tsv --k 200 --distance word-levenshtein --utility word-trigram\n  lex-forge select --in dicts/en/learn.tsv --out dicts/en/learn.gist.tsv --k 500 --lambda 0.5\n  lex-forge metrics --log train.log --out metrics.csv --language english"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Select a diverse, high-coverage subset of a lexicon TSV.
    #[command(alias = "gist")]
    Select(SelectArgs),

    /// Extract epoch/split/metric rows from a trainer log into CSV.
    #[command(alias = "metrics-extract")]
    Metrics(MetricsArgs),
}

/// Arguments for `lex-forge select`.
#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Input TSV (word<TAB>pronunciation[<TAB>tag]), or '-' for stdin.
    #[arg(short = 'i', long = "in", value_name = "PATH")]
    pub input: String,

    /// Output TSV path, or '-' for stdout.
    #[arg(short = 'o', long = "out", value_name = "PATH")]
    pub output: String,

    /// Number of entries to select (0 = all).
    #[arg(short, long, default_value_t = 0, env = "GIST_K")]
    pub k: usize,

    /// Weight of the minimum pairwise distance in the score.
    #[arg(long, default_value_t = DEFAULT_LAMBDA, env = "GIST_LAMBDA")]
    pub lambda: f64,

    /// Tolerance for gain ties, score ties and threshold deduplication.
    #[arg(long, default_value_t = DEFAULT_EPSILON, env = "GIST_EPSILON")]
    pub epsilon: f64,

    /// Distance mode: word-levenshtein, ipa-levenshtein, joint.
    #[arg(long, default_value = "joint")]
    pub distance: EditDistance,

    /// Utility mode: word-trigram, ipa-ngram, joint, uniform.
    #[arg(long, default_value = "joint")]
    pub utility: UtilityMode,

    /// Only consider the first N input rows (0 = no limit).
    #[arg(long, alias = "max_candidates", default_value_t = 0)]
    pub max_candidates: usize,

    /// Tie-break seed (0 = stable input order).
    #[arg(long, default_value_t = 0, env = "GIST_SEED")]
    pub seed: u64,

    /// Explicit distance threshold to sweep (repeatable or comma-separated).
    #[arg(long = "threshold", value_delimiter = ',', env = "GIST_THRESHOLDS")]
    pub thresholds: Vec<f64>,

    /// Cap on pairs sampled while deriving thresholds.
    #[arg(long, default_value_t = DEFAULT_MAX_CANDIDATE_PAIRS, env = "GIST_MAX_CANDIDATE_PAIRS")]
    pub max_candidate_pairs: usize,

    /// Evaluate thresholds concurrently.
    #[arg(long, env = "GIST_PARALLEL")]
    pub parallel: bool,

    /// Print the run summary as JSON on stderr.
    #[arg(short = 'j', long)]
    pub json: bool,
}

impl SelectArgs {
    /// Selection configuration described by these arguments.
    pub fn to_config(&self) -> SelectConfig {
        let mut config = SelectConfig::new()
            .with_k(self.k)
            .with_lambda(self.lambda)
            .with_epsilon(self.epsilon)
            .with_seed(self.seed)
            .with_distance(self.distance)
            .with_utility_mode(self.utility)
            .with_max_candidate_pairs(self.max_candidate_pairs)
            .with_parallel(self.parallel);
        if !self.thresholds.is_empty() {
            config = config.with_thresholds(self.thresholds.clone());
        }
        config
    }
}

/// Arguments for `lex-forge metrics`.
#[derive(Parser, Debug)]
pub struct MetricsArgs {
    /// Trainer log file, or '-' for stdin.
    #[arg(long, value_name = "PATH")]
    pub log: String,

    /// Output CSV path, or '-' for stdout.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub out: String,

    /// Language for every row instead of detecting it per line.
    #[arg(long)]
    pub language: Option<String>,

    /// Override the epoch regex (capture group 1 is the epoch).
    #[arg(long)]
    pub epoch_regex: Option<String>,

    /// Override the split regex.
    #[arg(long)]
    pub split_regex: Option<String>,

    /// Override the key/value regex (groups 1 and 2 are key and value).
    #[arg(long)]
    pub kv_regex: Option<String>,

    /// Override the language regex.
    #[arg(long)]
    pub language_regex: Option<String>,
}

impl MetricsArgs {
    /// Parser options with any overrides applied.
    pub fn to_options(&self) -> anyhow::Result<ParserOptions> {
        let mut options = ParserOptions::new()?;
        if let Some(pattern) = &self.epoch_regex {
            options = options.with_epoch_pattern(pattern)?;
        }
        if let Some(pattern) = &self.split_regex {
            options = options.with_split_pattern(pattern)?;
        }
        if let Some(pattern) = &self.kv_regex {
            options = options.with_key_value_pattern(pattern)?;
        }
        if let Some(pattern) = &self.language_regex {
            options = options.with_language_pattern(pattern)?;
        }
        if let Some(language) = &self.language {
            options = options.with_default_language(language.as_str());
        }
        Ok(options)
    }
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses arguments and executes the command.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the CLI with the parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Select(args) => run_select_command(args),
        Commands::Metrics(args) => run_metrics_command(args),
    }
}

fn run_select_command(args: SelectArgs) -> anyhow::Result<()> {
    let read_start = Instant::now();
    let mut records = read_tsv_path(&args.input)
        .with_context(|| format!("Failed to read lexicon from {}", args.input))?;
    if args.max_candidates > 0 && records.len() > args.max_candidates {
        debug!(
            total = records.len(),
            kept = args.max_candidates,
            "Truncating input to max candidates"
        );
        records.truncate(args.max_candidates);
    }
    let read = read_start.elapsed();

    let config = args.to_config();
    info!(
        entries = records.len(),
        k = config.k,
        lambda = config.lambda,
        distance = %args.distance,
        utility = %args.utility,
        "Selecting diverse subset"
    );

    let select_start = Instant::now();
    let outcome = GistSelector::new(config).evaluate(&records);
    let select = select_start.elapsed();

    let write_start = Instant::now();
    write_tsv_path(&args.output, &outcome.selection.entries)
        .with_context(|| format!("Failed to write selection to {}", args.output))?;
    let write = write_start.elapsed();

    let report = SelectionReport::from_outcome(records.len(), &outcome)
        .with_timings(StageTimings { read, select, write });

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| anyhow::anyhow!("Failed to serialize summary JSON: {}", e))?;
        eprintln!("{}", json);
    } else {
        info!("{}", report);
    }

    Ok(())
}

fn run_metrics_command(args: MetricsArgs) -> anyhow::Result<()> {
    let options = args.to_options()?;
    let reader = open_input(&args.log)?;

    let mut parser = LogParser::new(options);
    let mut records = parser
        .parse(reader)
        .with_context(|| format!("Failed to parse log {}", args.log))?;
    sort_records(&mut records);

    let writer = open_output(&args.out)?;
    write_csv(writer, &records)
        .with_context(|| format!("Failed to write metrics to {}", args.out))?;

    info!(
        records = records.len(),
        last_epoch = parser.auto_epoch(),
        output = %args.out,
        "Extracted metrics"
    );
    Ok(())
}
