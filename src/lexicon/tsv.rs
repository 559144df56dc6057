//! Tab-separated lexicon files.
//!
//! Each non-blank line is `word<TAB>pronunciation[<TAB>tag]`. Fields are
//! not escaped, so they may not contain tabs or line breaks. Any malformed
//! row fails the whole read; nothing is silently dropped.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use crate::diversity::Record;
use crate::error::LexiconError;

/// Path that stands for stdin or stdout.
pub const STDIO_PATH: &str = "-";

/// Parses lexicon rows from `reader`.
///
/// Blank and whitespace-only lines without a tab are skipped. A line with a
/// tab is always a row, even if every field is blank, so anything
/// [`write_tsv`] emits reads back unchanged. Line numbers in errors are
/// 1-based.
pub fn read_tsv<R: BufRead>(reader: R) -> Result<Vec<Record>, LexiconError> {
    let mut records = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.contains('\t') && line.trim().is_empty() {
            continue;
        }
        records.push(parse_row(&line, n + 1)?);
    }
    Ok(records)
}

fn parse_row(line: &str, line_number: usize) -> Result<Record, LexiconError> {
    let columns: Vec<&str> = line.split('\t').collect();
    match columns.as_slice() {
        [word, pronunciation] => Ok(Record::new(*word, *pronunciation)),
        [word, pronunciation, tag] => Ok(Record::new(*word, *pronunciation).with_extra(*tag)),
        _ => Err(LexiconError::InvalidRow {
            line: line_number,
            columns: columns.len(),
            content: line.to_string(),
        }),
    }
}

/// Checks that every field can be written without escaping.
pub fn validate_records(records: &[Record]) -> Result<(), LexiconError> {
    for (index, record) in records.iter().enumerate() {
        for (field, value) in [
            ("word", &record.primary),
            ("pronunciation", &record.secondary),
            ("tag", &record.extra),
        ] {
            if value.contains(['\t', '\n', '\r']) {
                return Err(LexiconError::InvalidField {
                    index,
                    field,
                    value: value.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Writes `records` as TSV rows.
///
/// The tag column is emitted only for records that have one. All records
/// are validated before the first byte is written.
pub fn write_tsv<W: Write>(writer: W, records: &[Record]) -> Result<(), LexiconError> {
    validate_records(records)?;

    let mut writer = BufWriter::new(writer);
    for record in records {
        if record.has_extra() {
            writeln!(writer, "{}\t{}\t{}", record.primary, record.secondary, record.extra)?;
        } else {
            writeln!(writer, "{}\t{}", record.primary, record.secondary)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Opens `path` for buffered reading, or stdin for `-`.
pub fn open_input(path: &str) -> Result<Box<dyn BufRead>, LexiconError> {
    if path == STDIO_PATH {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).map_err(|source| LexiconError::Open {
        path: path.to_string(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Creates `path` for writing, or stdout for `-`.
pub fn open_output(path: &str) -> Result<Box<dyn Write>, LexiconError> {
    if path == STDIO_PATH {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path).map_err(|source| LexiconError::Open {
        path: path.to_string(),
        source,
    })?;
    Ok(Box::new(file))
}

/// Reads a lexicon from a path (`-` for stdin).
pub fn read_tsv_path(path: &str) -> Result<Vec<Record>, LexiconError> {
    read_tsv(open_input(path)?)
}

/// Writes a lexicon to a path (`-` for stdout).
///
/// Validation happens before the output file is created.
pub fn write_tsv_path(path: &str, records: &[Record]) -> Result<(), LexiconError> {
    validate_records(records)?;
    write_tsv(open_output(path)?, records)
}
