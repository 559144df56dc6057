//! Line-oriented metric extraction from training logs.

use std::io::BufRead;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

pub const DEFAULT_EPOCH_PATTERN: &str = r"(?i)\bepoch\b\s*[:=]?\s*(\d+)";
pub const DEFAULT_SPLIT_PATTERN: &str = r"(?i)\b(train|eval|validation|valid|dev|test)\b";
pub const DEFAULT_KEY_VALUE_PATTERN: &str =
    r"(?i)([a-z][a-z0-9_.-]*)\s*[:=]\s*([0-9]+(?:\.[0-9]+)?)%?";
pub const DEFAULT_LANGUAGE_PATTERN: &str =
    r"(?i)(?:\blang(?:uage)?\b\s*[:=]\s*([a-z0-9_-]+)|\bfor\s+([a-z0-9_-]+))";

/// Split names recognized as key prefixes, in match order.
const SPLIT_PREFIXES: [&str; 6] = ["train", "eval", "validation", "valid", "dev", "test"];

/// One metric value pulled out of a log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub epoch: u64,
    pub metric: String,
    pub value: f64,
    /// `train` or `eval` with the built-in split pattern.
    pub split: String,
    /// Empty when no language is known.
    pub language: String,
}

/// Patterns and fixed values driving a [`Parser`].
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Capture group 1 holds the epoch number.
    pub epoch: Regex,
    /// Whole match is a split name.
    pub split: Regex,
    /// Capture groups 1 and 2 hold the metric key and value.
    pub key_value: Regex,
    /// First non-empty capture group holds the language.
    pub language: Regex,
    /// Language used for every record instead of the language regex.
    pub default_language: Option<String>,
}

impl ParserOptions {
    /// Options with the built-in patterns.
    pub fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            epoch: compile("epoch", DEFAULT_EPOCH_PATTERN)?,
            split: compile("split", DEFAULT_SPLIT_PATTERN)?,
            key_value: compile("key/value", DEFAULT_KEY_VALUE_PATTERN)?,
            language: compile("language", DEFAULT_LANGUAGE_PATTERN)?,
            default_language: None,
        })
    }

    pub fn with_epoch_pattern(mut self, pattern: &str) -> Result<Self, MetricsError> {
        self.epoch = compile("epoch", pattern)?;
        Ok(self)
    }

    pub fn with_split_pattern(mut self, pattern: &str) -> Result<Self, MetricsError> {
        self.split = compile("split", pattern)?;
        Ok(self)
    }

    pub fn with_key_value_pattern(mut self, pattern: &str) -> Result<Self, MetricsError> {
        self.key_value = compile("key/value", pattern)?;
        Ok(self)
    }

    pub fn with_language_pattern(mut self, pattern: &str) -> Result<Self, MetricsError> {
        self.language = compile("language", pattern)?;
        Ok(self)
    }

    /// Fixes the language of every record. An empty string clears it.
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        self.default_language = if language.is_empty() { None } else { Some(language) };
        self
    }
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex, MetricsError> {
    Regex::new(pattern).map_err(|source| MetricsError::Regex { name, source })
}

/// Stateful log parser.
///
/// Lines without an explicit epoch are numbered from a running counter that
/// explicit epochs push forward, so a log mixing both stays monotone.
#[derive(Debug, Clone)]
pub struct Parser {
    options: ParserOptions,
    auto_epoch: u64,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            auto_epoch: 0,
        }
    }

    /// Current value of the running epoch counter.
    pub fn auto_epoch(&self) -> u64 {
        self.auto_epoch
    }

    /// Parses every line of `reader`.
    ///
    /// The first unparsable epoch or value aborts the parse.
    pub fn parse<R: BufRead>(&mut self, reader: R) -> Result<Vec<MetricRecord>, MetricsError> {
        let mut records = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            records.extend(self.parse_line(&line, n + 1)?);
        }
        Ok(records)
    }

    /// Parses a single line. `line_number` is only used in errors.
    pub fn parse_line(
        &mut self,
        line: &str,
        line_number: usize,
    ) -> Result<Vec<MetricRecord>, MetricsError> {
        let mut epoch = None;
        if let Some(text) = self.options.epoch.captures(line).and_then(|caps| caps.get(1)) {
            let parsed: u64 = text.as_str().parse().map_err(|_| MetricsError::InvalidNumber {
                line: line_number,
                kind: "epoch",
                value: text.as_str().to_string(),
            })?;
            self.auto_epoch = self.auto_epoch.max(parsed);
            epoch = Some(parsed);
        }

        let split_tokens = self.split_tokens(line);
        let language = match &self.options.default_language {
            Some(language) => language.clone(),
            None => self.extract_language(line),
        };

        let mut records = Vec::new();
        for caps in self.options.key_value.captures_iter(line) {
            let (Some(whole), Some(key), Some(value_text)) =
                (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let key = key.as_str().to_lowercase();
            let value: f64 = value_text.as_str().parse().map_err(|_| MetricsError::InvalidNumber {
                line: line_number,
                kind: "value",
                value: value_text.as_str().to_string(),
            })?;

            let (split, metric) = match split_from_key(&key) {
                Some(split) => (split, trim_split_prefix(&key, split)),
                None => match split_at(whole.start(), &split_tokens) {
                    Some(split) => (split, key.as_str()),
                    None => continue,
                },
            };

            let metric = metric.trim_matches(|c: char| matches!(c, '_' | '.' | '-'));
            let metric = if metric.is_empty() || metric == split { "value" } else { metric };

            let epoch = match epoch {
                Some(epoch) => epoch,
                None => {
                    let next = self.auto_epoch.checked_add(1).ok_or_else(|| {
                        MetricsError::InvalidNumber {
                            line: line_number,
                            kind: "epoch",
                            value: format!("{} + 1", self.auto_epoch),
                        }
                    })?;
                    self.auto_epoch = next;
                    epoch = Some(next);
                    next
                }
            };

            records.push(MetricRecord {
                epoch,
                metric: metric.to_string(),
                value,
                split: split.to_string(),
                language: language.clone(),
            });
        }

        Ok(records)
    }

    fn split_tokens(&self, line: &str) -> Vec<(usize, String)> {
        self.options
            .split
            .find_iter(line)
            .map(|m| (m.start(), normalize_split(&m.as_str().to_lowercase()).to_string()))
            .collect()
    }

    fn extract_language(&self, line: &str) -> String {
        self.options
            .language
            .captures(line)
            .and_then(|caps| caps.iter().skip(1).flatten().find(|m| !m.as_str().is_empty()))
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default()
    }
}

/// Held-out synonyms become `eval`; anything else is kept as is.
fn normalize_split(split: &str) -> &str {
    match split {
        "validation" | "valid" | "dev" | "test" => "eval",
        other => other,
    }
}

fn split_from_key(key: &str) -> Option<&'static str> {
    SPLIT_PREFIXES.iter().find_map(|&prefix| {
        let rest = key.strip_prefix(prefix)?;
        if rest.is_empty() || rest.starts_with(['_', '-', '.']) {
            Some(normalize_split(prefix))
        } else {
            None
        }
    })
}

/// Removes a `<split><sep>` prefix. Keys written with a synonym such as
/// `valid_loss` keep their prefix here and fall through to trimming.
fn trim_split_prefix<'a>(key: &'a str, split: &str) -> &'a str {
    key.strip_prefix(split)
        .and_then(|rest| rest.strip_prefix(['_', '-', '.']))
        .unwrap_or(key)
}

/// Last split token starting at or before `position`.
fn split_at(position: usize, tokens: &[(usize, String)]) -> Option<&str> {
    tokens
        .iter()
        .take_while(|(start, _)| *start <= position)
        .last()
        .map(|(_, split)| split.as_str())
}
