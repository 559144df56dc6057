//! End-to-end selection over lexicon files.

use std::fs;

use lex_forge::diversity::{
    EditDistance, GistSelector, Record, SelectConfig, SelectionReport, UtilityMode,
};
use lex_forge::lexicon::{read_tsv_path, write_tsv_path};
use tempfile::TempDir;

const LEXICON: &str = "\
cat\tkæt\tnoun
cats\tkæts\tnoun
catalog\tˈkætəlɔg
dog\tdɔg\tnoun
dogs\tdɔgz
banana\tbəˈnænə\tnoun
bandana\tbænˈdænə
phoneme\tˈfoʊnim\tnoun
telephone\tˈtɛləfoʊn
xylophone\tˈzaɪləfoʊn\tnoun
run\trʌn\tverb
running\tˈrʌnɪŋ\tverb
";

fn write_lexicon(dir: &TempDir) -> String {
    let path = dir.path().join("lexicon.tsv");
    fs::write(&path, LEXICON).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_select_and_write_subset() {
    let dir = TempDir::new().unwrap();
    let records = read_tsv_path(&write_lexicon(&dir)).unwrap();
    assert_eq!(records.len(), 12);

    let config = SelectConfig::new()
        .with_k(5)
        .with_lambda(0.5)
        .with_distance(EditDistance::Joint)
        .with_utility_mode(UtilityMode::Joint);
    let selection = GistSelector::new(config).select(&records);
    assert!(!selection.is_empty());
    assert!(selection.len() <= 5);

    let out = dir.path().join("subset.tsv");
    let out = out.to_str().unwrap();
    write_tsv_path(out, &selection.entries).unwrap();

    let reread = read_tsv_path(out).unwrap();
    assert_eq!(reread, selection.entries);
    // tags survive the round trip untouched
    for record in &reread {
        assert!(records.contains(record));
    }
}

#[test]
fn test_seeded_runs_are_identical() {
    let dir = TempDir::new().unwrap();
    let records = read_tsv_path(&write_lexicon(&dir)).unwrap();

    let config = SelectConfig::new().with_k(4).with_seed(1234);
    let first = GistSelector::new(config.clone()).select(&records);
    let second = GistSelector::new(config).select(&records);
    assert_eq!(first, second);
}

#[test]
fn test_parallel_sweep_matches_sequential() {
    let dir = TempDir::new().unwrap();
    let records = read_tsv_path(&write_lexicon(&dir)).unwrap();

    let sequential = SelectConfig::new().with_k(6).with_lambda(2.0);
    let parallel = sequential.clone().with_parallel(true);

    let a = GistSelector::new(sequential).evaluate(&records);
    let b = GistSelector::new(parallel).evaluate(&records);
    assert_eq!(a, b);
}

#[test]
fn test_word_trigram_mode_ignores_pronunciations() {
    let records = vec![
        Record::new("abc", "zzzzzz"),
        Record::new("abc", "yyyyyy"),
        Record::new("xyz", "zzzzzz"),
    ];
    let config = SelectConfig::new()
        .with_k(3)
        .with_lambda(0.0)
        .with_thresholds(vec![0.0])
        .with_utility_mode(UtilityMode::WordTrigram);
    let selection = GistSelector::new(config).select(&records);

    // the second "abc" adds no new word trigram
    let words: Vec<&str> = selection.entries.iter().map(|r| r.primary.as_str()).collect();
    assert_eq!(words, vec!["abc", "xyz"]);
    assert_eq!(selection.utility, 2.0);
}

#[test]
fn test_report_summarizes_run() {
    let dir = TempDir::new().unwrap();
    let records = read_tsv_path(&write_lexicon(&dir)).unwrap();

    let outcome = GistSelector::new(SelectConfig::new().with_k(4)).evaluate(&records);
    let report = SelectionReport::from_outcome(records.len(), &outcome);

    assert_eq!(report.input_count, 12);
    assert_eq!(report.output_count, outcome.selection.len());
    assert_eq!(report.thresholds_evaluated, outcome.evaluated.len());
    assert!(report.thresholds_evaluated >= 1);
    assert!(report.to_string().starts_with("gistselect summary: input=12"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["input_count"], 12);
    let expected = report.output_count as f64 / 12.0;
    assert!((json["retention_ratio"].as_f64().unwrap() - expected).abs() < 1e-12);
}

#[test]
fn test_explicit_thresholds_are_reported_in_order() {
    let records = vec![Record::new("aa", ""), Record::new("ab", ""), Record::new("zz", "")];
    let config = SelectConfig::new()
        .with_k(3)
        .with_thresholds(vec![0.9, f64::NAN, 0.0, 0.4]);
    let outcome = GistSelector::new(config).evaluate(&records);

    let thresholds: Vec<f64> = outcome.evaluated.iter().map(|o| o.threshold).collect();
    assert_eq!(thresholds, vec![0.9, 0.0, 0.4]);
}
