// Untyped row model shared by the delimited and spreadsheet readers

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A single untyped cell scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Infer a typed cell from raw text: blank → Empty, finite decimal → Number, else Text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match parse_decimal(trimmed) {
            Some(n) => Cell::Number(n),
            None => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Numeric view of the cell. Text is accepted when it holds a decimal literal.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) => None,
            Cell::Text(s) => parse_decimal(s.trim()),
            Cell::Empty => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integers without decimals
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Empty => Ok(()),
        }
    }
}

/// Parse a plain decimal literal (`-12`, `3.5`, `.5`, `1e6`).
///
/// Rejects the words `f64::from_str` would otherwise accept (`inf`, `NaN`, `infinity`).
fn parse_decimal(s: &str) -> Option<f64> {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let starts_numeric = body
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '.')
        .unwrap_or(false);
    if !starts_numeric {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// One input record: column name → cell, in source column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: Vec<(String, Cell)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a column value, keeping the original column position.
    pub fn insert(&mut self, key: impl Into<String>, value: Cell) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Cell)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, Cell)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_numbers_and_text() {
        assert_eq!(Cell::infer("2020"), Cell::Number(2020.0));
        assert_eq!(Cell::infer(" -3.25 "), Cell::Number(-3.25));
        assert_eq!(Cell::infer(".5"), Cell::Number(0.5));
        assert_eq!(Cell::infer("1e3"), Cell::Number(1000.0));
        assert_eq!(Cell::infer(""), Cell::Empty);
        assert_eq!(Cell::infer("   "), Cell::Empty);
        assert_eq!(Cell::infer("South Africa"), Cell::Text("South Africa".into()));
        assert_eq!(Cell::infer("2020-Q1"), Cell::Text("2020-Q1".into()));
    }

    #[test]
    fn infer_rejects_special_floats() {
        assert_eq!(Cell::infer("inf"), Cell::Text("inf".into()));
        assert_eq!(Cell::infer("NaN"), Cell::Text("NaN".into()));
        assert_eq!(Cell::infer("-infinity"), Cell::Text("-infinity".into()));
    }

    #[test]
    fn numeric_view_of_text() {
        assert_eq!(Cell::Text(" 42 ".into()).as_number(), Some(42.0));
        assert_eq!(Cell::Text("n/a".into()).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
        assert_eq!(Cell::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn display_integers_without_decimals() {
        assert_eq!(Cell::Number(2020.0).to_string(), "2020");
        assert_eq!(Cell::Number(1.5).to_string(), "1.5");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn insert_keeps_column_position() {
        let mut row = RawRow::new();
        row.insert("a", Cell::Number(1.0));
        row.insert("b", Cell::Number(2.0));
        row.insert("a", Cell::Number(3.0));
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Cell::Number(3.0)));
    }

    #[test]
    fn serializes_as_ordered_object() {
        let row: RawRow = vec![
            ("year", Cell::Number(2020.0)),
            ("country", Cell::Text("Kenya".into())),
            ("note", Cell::Empty),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"year":2020.0,"country":"Kenya","note":null}"#);
    }
}
