//! `cotrend-io`: file parsing and export.
//!
//! Turns uploaded file bytes into untyped [`RawRow`]s and serializes result rows back
//! to CSV text. Pure transforms over bytes; no filesystem access.

pub mod csv;
pub mod error;
pub mod row;
pub mod xlsx;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use error::ParseError;
pub use row::{Cell, RawRow};

/// Extensions read through the spreadsheet reader.
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

const SPREADSHEET_MIME_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.oasis.opendocument.spreadsheet",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Delimited,
    Spreadsheet,
}

impl FileFormat {
    /// Detect the format from a file name (and optional MIME type). Defaults to delimited.
    pub fn detect(name: &str, mime: Option<&str>) -> Self {
        if let Some(mime) = mime {
            if SPREADSHEET_MIME_TYPES.contains(&mime) {
                return FileFormat::Spreadsheet;
            }
        }
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            FileFormat::Spreadsheet
        } else {
            FileFormat::Delimited
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delimited => write!(f, "delimited"),
            Self::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

/// One uploaded file: name, raw bytes and declared format.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub bytes: Vec<u8>,
    pub format: FileFormat,
}

impl FileInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, format: FileFormat) -> Self {
        Self {
            name: name.into(),
            bytes,
            format,
        }
    }

    /// Build an input whose format is detected from the file name.
    pub fn detect(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let format = FileFormat::detect(&name, None);
        Self { name, bytes, format }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Parse a single file according to its declared format.
pub fn parse_file(input: &FileInput) -> Result<Vec<RawRow>, ParseError> {
    match input.format {
        FileFormat::Delimited => csv::parse(&input.name, &input.bytes),
        FileFormat::Spreadsheet => xlsx::parse(&input.name, &input.bytes),
    }
}

/// Parse files independently and in parallel. Results keep input order; one file's
/// failure never affects another.
pub fn parse_files(inputs: &[FileInput]) -> Vec<(String, Result<Vec<RawRow>, ParseError>)> {
    inputs
        .par_iter()
        .map(|input| (input.name.clone(), parse_file(input)))
        .collect()
}
