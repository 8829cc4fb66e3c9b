use std::collections::BTreeMap;

use cotrend_io::Cell;

use crate::model::{Record, YearSeries};

/// Filter records to one country, group by year and reduce to the per-year mean.
///
/// A record's area is AREA_LABEL, or AREA_CODE when the label is blank. Records with
/// an area must match `country` case-insensitively; records with no area at all are
/// kept as already scoped to the country. Records whose PERIOD or VALUE is not
/// numeric are dropped.
pub fn aggregate(records: &[Record], country: &str) -> YearSeries {
    let target = country.trim().to_lowercase();
    let mut groups: BTreeMap<i32, (f64, usize)> = BTreeMap::new();

    for record in records {
        if let Some(area) = record_area(record) {
            if area.to_lowercase() != target {
                continue;
            }
        }
        let (Some(year), Some(value)) = (
            record.period.as_ref().and_then(to_year),
            record.value.as_ref().and_then(Cell::as_number),
        ) else {
            continue;
        };
        let entry = groups.entry(year).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(year, (sum, count))| (year, sum / count as f64))
        .collect()
}

fn record_area(record: &Record) -> Option<String> {
    [record.area_label.as_ref(), record.area_code.as_ref()]
        .into_iter()
        .flatten()
        .map(|cell| cell.to_string().trim().to_string())
        .find(|area| !area.is_empty())
}

/// Integer year, truncated toward zero.
fn to_year(cell: &Cell) -> Option<i32> {
    cell.as_number()
        .filter(|n| n.abs() < i32::MAX as f64)
        .map(|n| n.trunc() as i32)
}
