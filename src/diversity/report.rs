//! Run summaries for selection jobs.
//!
//! A [`SelectionReport`] captures what a selection run kept, how its score
//! decomposes and where the time went.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::selector::SweepOutcome;

/// Wall-clock time spent in each stage of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTimings {
    /// Reading and parsing input.
    #[serde(serialize_with = "serialize_millis")]
    pub read: Duration,
    /// Running the selection sweep.
    #[serde(serialize_with = "serialize_millis")]
    pub select: Duration,
    /// Writing output.
    #[serde(serialize_with = "serialize_millis")]
    pub write: Duration,
}

impl StageTimings {
    /// Sum of all stages.
    pub fn total(&self) -> Duration {
        self.read + self.select + self.write
    }
}

/// Summary of one selection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionReport {
    /// Records offered to the selector.
    pub input_count: usize,
    /// Records kept.
    pub output_count: usize,
    /// Threshold of the winning pass.
    pub threshold: f64,
    /// Minimum pairwise distance among kept records.
    pub min_distance: f64,
    /// Utility value of the kept records.
    pub utility: f64,
    /// Final score.
    pub score: f64,
    /// Number of thresholds swept.
    pub thresholds_evaluated: usize,
    /// Fraction of input records kept; 1.0 for empty input.
    pub retention_ratio: f64,
    /// Stage timings.
    pub timings: StageTimings,
}

impl SelectionReport {
    /// Builds a report from a finished sweep.
    pub fn from_outcome(input_count: usize, outcome: &SweepOutcome) -> Self {
        let selection = &outcome.selection;
        let retention_ratio = if input_count == 0 {
            1.0
        } else {
            selection.entries.len() as f64 / input_count as f64
        };

        Self {
            input_count,
            output_count: selection.entries.len(),
            threshold: selection.threshold,
            min_distance: selection.min_distance,
            utility: selection.utility,
            score: selection.score,
            thresholds_evaluated: outcome.evaluated.len(),
            retention_ratio,
            timings: StageTimings::default(),
        }
    }

    /// Attaches stage timings.
    pub fn with_timings(mut self, timings: StageTimings) -> Self {
        self.timings = timings;
        self
    }
}

impl fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gistselect summary: input={} output={} threshold={:.6} min_distance={:.6} utility={:.6} score={:.6} timings(read={:?} select={:?} write={:?} total={:?})",
            self.input_count,
            self.output_count,
            self.threshold,
            self.min_distance,
            self.utility,
            self.score,
            self.timings.read,
            self.timings.select,
            self.timings.write,
            self.timings.total()
        )
    }
}

fn serialize_millis<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diversity::selector::ThresholdOutcome;
    use crate::diversity::types::{Record, Selection};

    fn outcome() -> SweepOutcome {
        SweepOutcome {
            selection: Selection {
                entries: vec![
                    Record::new("a", "a").with_extra("noun"),
                    Record::new("b", "b").with_extra("verb"),
                    Record::new("c", "c"),
                ],
                utility: 6.0,
                min_distance: 0.5,
                threshold: 0.25,
                score: 6.5,
            },
            evaluated: vec![
                ThresholdOutcome {
                    threshold: 0.0,
                    picks: vec![0, 1],
                    utility: 4.0,
                    min_distance: 0.1,
                    score: 4.1,
                },
                ThresholdOutcome {
                    threshold: 0.25,
                    picks: vec![0, 1, 2],
                    utility: 6.0,
                    min_distance: 0.5,
                    score: 6.5,
                },
            ],
        }
    }

    #[test]
    fn test_from_outcome() {
        let report = SelectionReport::from_outcome(10, &outcome());
        assert_eq!(report.input_count, 10);
        assert_eq!(report.output_count, 3);
        assert_eq!(report.thresholds_evaluated, 2);
        assert!((report.retention_ratio - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_empty_report() {
        let report = SelectionReport::from_outcome(0, &SweepOutcome::default());
        assert_eq!(report.output_count, 0);
        assert_eq!(report.retention_ratio, 1.0);
    }

    #[test]
    fn test_display_summary_line() {
        let report = SelectionReport::from_outcome(10, &outcome()).with_timings(StageTimings {
            read: Duration::from_millis(2),
            select: Duration::from_millis(5),
            write: Duration::from_millis(1),
        });
        let line = report.to_string();
        assert!(line.starts_with("gistselect summary: input=10 output=3"));
        assert!(line.contains("threshold=0.250000"));
        assert!(line.contains("total=8ms"));
    }

    #[test]
    fn test_json_timings_in_millis() {
        let report =
            SelectionReport::from_outcome(4, &outcome()).with_timings(StageTimings {
                read: Duration::from_millis(3),
                ..StageTimings::default()
            });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["timings"]["read"], serde_json::json!(3.0));
        assert_eq!(json["input_count"], serde_json::json!(4));
        assert_eq!(json["retention_ratio"], serde_json::json!(0.75));
    }
}
