//! Column normalization and the canonical-schema precheck.
//!
//! Source files spell their headers in many ways (`OBS_VALUE`, `Value`, `Time Period`,
//! `Country Name`, ...). Headers are compared after lowercasing and dropping whitespace
//! and the `_`, `-`, `.` separators, then mapped onto the five canonical columns
//! through a fixed alias table.

use cotrend_io::{Cell, RawRow};

use crate::model::{Canonical, Record};

/// Normalized header → canonical column.
const ALIASES: &[(&str, Canonical)] = &[
    ("value", Canonical::Value),
    ("obsvalue", Canonical::Value),
    ("timeperiod", Canonical::Period),
    ("year", Canonical::Period),
    ("time", Canonical::Period),
    ("refarealabel", Canonical::AreaLabel),
    ("country", Canonical::AreaLabel),
    ("countryname", Canonical::AreaLabel),
    ("refarea", Canonical::AreaCode),
    ("countrycode", Canonical::AreaCode),
    ("iso3", Canonical::AreaCode),
    ("indicator", Canonical::Indicator),
    ("indicatorcode", Canonical::Indicator),
];

pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn canonical_for(key: &str) -> Option<Canonical> {
    let normalized = normalize_key(key);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, column)| *column)
}

/// Map one raw row onto the canonical record. When several columns alias the same
/// field, the rightmost one wins.
pub fn normalize_row(row: &RawRow) -> Record {
    let mut record = Record::default();
    for (key, cell) in row.iter() {
        match canonical_for(key) {
            Some(column) => {
                let value = match column {
                    Canonical::AreaLabel | Canonical::AreaCode => trim_text(cell),
                    _ => cell.clone(),
                };
                *record.slot_mut(column) = Some(value);
            }
            None => record.extra.push((key.to_string(), cell.clone())),
        }
    }
    record
}

pub fn normalize_rows(rows: &[RawRow]) -> Vec<Record> {
    rows.iter().map(normalize_row).collect()
}

fn trim_text(cell: &Cell) -> Cell {
    match cell {
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(trimmed.to_string())
            }
        }
        other => other.clone(),
    }
}

/// True when the set is non-empty and its first record carries every canonical column.
pub fn validate_schema(records: &[Record]) -> bool {
    !records.is_empty() && missing_columns(records).is_empty()
}

/// Canonical columns absent from the first record (all of them for an empty set).
pub fn missing_columns(records: &[Record]) -> Vec<&'static str> {
    let Some(first) = records.first() else {
        return Canonical::ALL.iter().map(Canonical::name).collect();
    };
    Canonical::ALL
        .iter()
        .filter(|column| first.get(**column).is_none())
        .map(Canonical::name)
        .collect()
}
