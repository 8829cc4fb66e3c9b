// Spreadsheet import (xlsx, xlsm, xlsb, xls, ods) via calamine

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::ParseError;
use crate::row::{Cell, RawRow};

/// Parse the first sheet of a workbook. The first non-empty row is the header.
///
/// Empty cells are left out of the row and rows without any cell are skipped.
pub fn parse(file: &str, bytes: &[u8]) -> Result<Vec<RawRow>, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::new(file, format!("failed to open workbook: {e}")))?;

    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ParseError::new(file, "workbook contains no sheets"))?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| ParseError::new(file, format!("failed to read sheet '{first_sheet}': {e}")))?;

    let mut grid = range
        .rows()
        .filter(|cells| cells.iter().any(|c| !matches!(data_to_cell(c), Cell::Empty)));

    let Some(header_cells) = grid.next() else {
        return Ok(Vec::new());
    };
    let columns = header_names(header_cells);

    let mut rows = Vec::new();
    for cells in grid {
        let mut row = RawRow::new();
        for (name, data) in columns.iter().zip(cells.iter()) {
            let Some(name) = name else { continue };
            match data_to_cell(data) {
                Cell::Empty => {}
                cell => row.insert(name.clone(), cell),
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    log::debug!("{file}: sheet '{first_sheet}', {} row(s)", rows.len());
    Ok(rows)
}

fn header_names(cells: &[Data]) -> Vec<Option<String>> {
    let mut seen: Vec<String> = Vec::new();
    let mut blank_count = 0usize;
    cells
        .iter()
        .map(|data| {
            let mut name = data_to_cell(data).to_string().trim().to_string();
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

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        // Store as TRUE/FALSE text, matching the spreadsheet display
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // Date cells keep their serial number
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}
