use std::collections::BTreeMap;

use cotrend_io::Cell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PipelineError;
use crate::stats::MIN_POINTS;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The five canonical columns every usable file must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Canonical {
    AreaCode,
    AreaLabel,
    Indicator,
    Period,
    Value,
}

impl Canonical {
    pub const ALL: [Canonical; 5] = [
        Canonical::AreaCode,
        Canonical::AreaLabel,
        Canonical::Indicator,
        Canonical::Period,
        Canonical::Value,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AreaCode => "AREA_CODE",
            Self::AreaLabel => "AREA_LABEL",
            Self::Indicator => "INDICATOR",
            Self::Period => "PERIOD",
            Self::Value => "VALUE",
        }
    }
}

impl std::fmt::Display for Canonical {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A normalized row. `Some(Cell::Empty)` means the column exists but the cell is blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub area_code: Option<Cell>,
    pub area_label: Option<Cell>,
    pub indicator: Option<Cell>,
    pub period: Option<Cell>,
    pub value: Option<Cell>,
    /// Columns that matched no alias, in source order.
    pub extra: Vec<(String, Cell)>,
}

impl Record {
    pub fn get(&self, column: Canonical) -> Option<&Cell> {
        match column {
            Canonical::AreaCode => self.area_code.as_ref(),
            Canonical::AreaLabel => self.area_label.as_ref(),
            Canonical::Indicator => self.indicator.as_ref(),
            Canonical::Period => self.period.as_ref(),
            Canonical::Value => self.value.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, column: Canonical) -> &mut Option<Cell> {
        match column {
            Canonical::AreaCode => &mut self.area_code,
            Canonical::AreaLabel => &mut self.area_label,
            Canonical::Indicator => &mut self.indicator,
            Canonical::Period => &mut self.period,
            Canonical::Value => &mut self.value,
        }
    }
}

/// Bucket a file's rows are routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Primary,
    Secondary,
    DenominatorValue,
    DenominatorCount,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
            Self::DenominatorValue => write!(f, "denominator_value"),
            Self::DenominatorCount => write!(f, "denominator_count"),
        }
    }
}

/// Classified rows. The two denominator buckets may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDatasets {
    pub primary: Vec<Record>,
    pub secondary: Vec<Record>,
    pub denominator_value: Vec<Record>,
    pub denominator_count: Vec<Record>,
}

impl ParsedDatasets {
    pub fn bucket_mut(&mut self, role: Role) -> &mut Vec<Record> {
        match role {
            Role::Primary => &mut self.primary,
            Role::Secondary => &mut self.secondary,
            Role::DenominatorValue => &mut self.denominator_value,
            Role::DenominatorCount => &mut self.denominator_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
            && self.secondary.is_empty()
            && self.denominator_value.is_empty()
            && self.denominator_count.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Aggregation + alignment
// ---------------------------------------------------------------------------

/// Per-year mean for one bucket and one country, ascending by year.
pub type YearSeries = BTreeMap<i32, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub year: i32,
    pub primary: f64,
    pub secondary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub year: i32,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ols {
    pub intercept: Option<f64>,
    pub slope: Option<f64>,
    pub r_squared: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationAvailable {
    pub percent_of_denominator: bool,
    pub per_unit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSeries {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub percent_of_denominator: Option<Vec<TimeSeriesPoint>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub per_unit: Option<Vec<TimeSeriesPoint>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub primary_rows: usize,
    pub secondary_rows: usize,
    pub denominator_value_rows: usize,
    pub denominator_count_rows: usize,
    pub years_aligned: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}

/// Everything derived for one country. Built fresh per call, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedResult {
    pub country: String,
    pub years: Vec<i32>,
    pub time_series: Vec<TimeSeriesPoint>,
    /// Primary YoY growth, percent.
    pub primary_growth_yoy: Vec<YearValue>,
    /// Secondary YoY change, original units.
    pub secondary_change_yoy: Vec<YearValue>,
    pub scatter: Vec<ScatterPoint>,
    pub correlation_r: Option<f64>,
    pub ols: Ols,
    pub normalization_available: NormalizationAvailable,
    pub normalized: NormalizedSeries,
    pub pipeline_stats: PipelineStats,
}

impl ProcessedResult {
    pub fn has_overlap(&self) -> bool {
        !self.time_series.is_empty()
    }

    /// `InsufficientData` when too few years aligned for correlation / OLS.
    pub fn insufficiency(&self) -> Option<PipelineError> {
        let actual = self.years.len();
        (actual < MIN_POINTS).then_some(PipelineError::InsufficientData {
            required: MIN_POINTS,
            actual,
        })
    }

    /// `country, year, primary, secondary` rows for the merged-series export.
    pub fn merged_rows(&self) -> Vec<Map<String, Value>> {
        self.time_series
            .iter()
            .map(|p| {
                let mut row = Map::new();
                row.insert("country".into(), Value::String(self.country.clone()));
                row.insert("year".into(), Value::from(p.year));
                row.insert("primary".into(), json_number(p.primary));
                row.insert("secondary".into(), json_number(p.secondary));
                row
            })
            .collect()
    }
}

/// Integral floats export without a fractional part; non-finite values become null.
fn json_number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
