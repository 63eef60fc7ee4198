// ── Delimited text files ──
//
// Reading: header row required, ragged rows tolerated, `.tsv` uses tabs.
// Writing: UTF-8 with a byte-order mark so spreadsheet tools pick the
// right encoding.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;

use crate::coerce::is_blank;
use crate::error::CoreError;
use crate::mapper::normalize_header;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One data row keyed by normalized header, blanks removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number in the source file.
    pub line: u64,
    pub fields: IndexMap<String, String>,
}

fn delimiter_for(path: &Path) -> u8 {
    let is_tsv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    if is_tsv { b'\t' } else { b',' }
}

/// A record that could not be decoded (invalid UTF-8, broken quoting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadRecord {
    pub line: u64,
    pub reason: String,
}

/// Read every non-blank row of a CSV or TSV file.
///
/// Only a file that cannot be opened or has an unreadable header fails
/// as a whole. A bad record is returned in place of its row so the rows
/// around it still import.
pub fn read_rows(path: &Path) -> Result<Vec<Result<Row, BadRecord>>, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter_for(path))
        .from_path(path)
        .map_err(|e| CoreError::csv(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CoreError::csv(path, e))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(CoreError::csv(path, err)),
            Err(err) => {
                let line = err.position().map_or(0, csv::Position::line);
                rows.push(Err(BadRecord {
                    line,
                    reason: err.to_string(),
                }));
                continue;
            }
        };
        let line = record.position().map_or(0, csv::Position::line);

        let record = match csv::StringRecord::from_byte_record(record) {
            Ok(record) => record,
            Err(err) => {
                rows.push(Err(BadRecord {
                    line,
                    reason: format!("invalid UTF-8 in field {}", err.utf8_error().field() + 1),
                }));
                continue;
            }
        };

        let fields: IndexMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, value)| !header.is_empty() && !is_blank(value))
            .map(|(header, value)| (header.clone(), value.trim().to_owned()))
            .collect();

        if !fields.is_empty() {
            rows.push(Ok(Row { line, fields }));
        }
    }

    Ok(rows)
}

/// Write a header row and data rows, replacing any existing file.
pub fn write_rows<S: AsRef<str>>(
    path: &Path,
    headers: &[&str],
    rows: &[Vec<S>],
) -> Result<(), CoreError> {
    let mut file = File::create(path).map_err(|e| CoreError::io(path, e))?;
    file.write_all(UTF8_BOM).map_err(|e| CoreError::io(path, e))?;

    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(headers)
        .map_err(|e| CoreError::csv(path, e))?;
    for row in rows {
        writer
            .write_record(row.iter().map(|cell| -> &str { cell.as_ref() }))
            .map_err(|e| CoreError::csv(path, e))?;
    }
    writer.flush().map_err(|e| CoreError::io(path, e))
}
