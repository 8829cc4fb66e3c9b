// Delimited text import and CSV export

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::row::{Cell, RawRow};

/// Parse delimited text with a header row into rows.
///
/// The delimiter is sniffed, cells are type-inferred and fully blank lines are skipped.
pub fn parse(file: &str, bytes: &[u8]) -> Result<Vec<RawRow>, ParseError> {
    let content = decode_utf8(bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = sniff_delimiter(content);
    parse_with_delimiter(file, content, delimiter)
}

pub fn parse_with_delimiter(file: &str, content: &str, delimiter: u8) -> Result<Vec<RawRow>, ParseError> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    read_rows(file, reader, delimiter)
}

/// Parse text written by [`to_csv`].
///
/// Quoted cells carry JSON escapes, so `\"` and `\\` inside quotes are unescaped.
/// Control-character escapes such as `\n` come back without their backslash.
pub fn parse_export(file: &str, content: &str) -> Result<Vec<RawRow>, ParseError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .escape(Some(b'\\'))
        .from_reader(content.as_bytes());
    read_rows(file, reader, b',')
}

fn read_rows(file: &str, mut reader: csv::Reader<&[u8]>, delimiter: u8) -> Result<Vec<RawRow>, ParseError> {
    let mut records = reader
        .records()
        .enumerate()
        .map(|(idx, result)| {
            result.map_err(|e| ParseError::new(file, format!("record {}: {e}", idx + 1)))
        })
        .filter(|result| match result {
            Ok(record) => !record.iter().all(|field| field.trim().is_empty()),
            Err(_) => true,
        });

    let columns = match records.next() {
        Some(header) => header_names(&header?),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        let mut row = RawRow::new();
        for (name, field) in columns.iter().zip(record.iter()) {
            if let Some(name) = name {
                row.insert(name.clone(), Cell::infer(field));
            }
        }
        rows.push(row);
    }

    log::debug!(
        "{file}: {} row(s), delimiter {:?}",
        rows.len(),
        delimiter as char
    );
    Ok(rows)
}

/// Trimmed header names. Blank headers become `__EMPTY`, `__EMPTY_1`, ...;
/// a repeated name is dropped (`None`) so the first column keeps it.
fn header_names(record: &csv::StringRecord) -> Vec<Option<String>> {
    let mut seen: Vec<String> = Vec::new();
    let mut blank_count = 0usize;
    record
        .iter()
        .map(|raw| {
            let mut name = raw.trim().to_string();
            if name.is_empty() {
                name = if blank_count == 0 {
                    "__EMPTY".to_string()
                } else {
                    format!("__EMPTY_{blank_count}")
                };
                blank_count += 1;
            }
            if seen.contains(&name) {
                None
            } else {
                seen.push(name.clone());
                Some(name)
            }
        })
        .collect()
}

/// Pick the delimiter among tab, semicolon, comma and pipe.
///
/// Each candidate is scored over the first ten non-blank lines as
/// `lines agreeing with the first line's width * that width`. A candidate that leaves the
/// first line as one field is out. Comma when nothing qualifies.
pub fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .collect();

    let mut best = (b',', 0usize);
    for delimiter in [b'\t', b';', b',', b'|'] {
        let widths: Vec<usize> = sample.iter().map(|line| field_count(line, delimiter)).collect();
        let Some(&width) = widths.first() else { break };
        if width < 2 {
            continue;
        }
        let score = widths.iter().filter(|&&w| w == width).count() * width;
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    best.0
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

/// Decode bytes as UTF-8, falling back to Windows-1252 (common for Excel-exported CSVs).
pub fn decode_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Serialize rows to CSV text.
///
/// The header comes from the first row's keys. Every cell is JSON-stringified, so text
/// is double-quoted and numbers are bare; missing and null cells become `""`.
/// Lines are joined with `\n` and there is no trailing newline.
pub fn to_csv(rows: &[Map<String, Value>]) -> String {
    let headers: Vec<&String> = rows.first().map(|r| r.keys().collect()).unwrap_or_default();
    let empty = Value::String(String::new());

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| h.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| match row.get(h.as_str()) {
                None | Some(Value::Null) => empty.to_string(),
                Some(v) => v.to_string(),
            })
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}
