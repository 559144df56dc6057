//! CSV output for extracted metrics.

use std::cmp::Ordering;
use std::fs::File;
use std::io::Write;

use crate::error::MetricsError;

use super::parser::MetricRecord;

/// Column order of the metrics CSV.
pub const CSV_HEADER: [&str; 5] = ["epoch", "metric", "value", "split", "language"];

/// Sorts by epoch, then split, metric and value.
pub fn sort_records(records: &mut [MetricRecord]) {
    records.sort_by(|a, b| {
        a.epoch
            .cmp(&b.epoch)
            .then_with(|| a.split.cmp(&b.split))
            .then_with(|| a.metric.cmp(&b.metric))
            .then_with(|| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
    });
}

/// Writes the header and one row per record.
pub fn write_csv<W: Write>(writer: W, records: &[MetricRecord]) -> Result<(), MetricsError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([
            record.epoch.to_string(),
            record.metric.clone(),
            format_value(record.value),
            record.split.clone(),
            record.language.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates `path` and writes `records` to it.
pub fn write_csv_path(path: &str, records: &[MetricRecord]) -> Result<(), MetricsError> {
    write_csv(File::create(path)?, records)
}

/// Shortest decimal form, switching to `1.5e+06` style outside `[1e-4, 1e6)`.
pub fn format_value(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..6).contains(&exponent) {
        value.to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}
