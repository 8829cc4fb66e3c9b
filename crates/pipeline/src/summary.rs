//! Markdown findings report for a processed result.

use std::fmt::Write as _;

use crate::config::SeriesLabels;
use crate::model::{ProcessedResult, YearValue};

const NA: &str = "N/A";
const RELATIONSHIP_THRESHOLD: f64 = 0.1;
const STABLE_RANGE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relationship {
    Negative,
    Positive,
    None,
}

impl Relationship {
    fn of(r: f64) -> Self {
        if r < -RELATIONSHIP_THRESHOLD {
            Self::Negative
        } else if r > RELATIONSHIP_THRESHOLD {
            Self::Positive
        } else {
            Self::None
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Negative => "negative relationship",
            Self::Positive => "positive relationship",
            Self::None => "no significant relationship",
        }
    }
}

pub fn to_markdown_summary(result: &ProcessedResult, labels: &SeriesLabels) -> String {
    let primary = labels.primary.as_str();
    let secondary = labels.secondary.as_str();
    let span = coverage_span(result);
    let mut out = String::new();

    let _ = writeln!(out, "# Analytics Summary - {}", result.country);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Key Findings");
    let coverage = match &span {
        Some(span) => format!("{span} ({} years)", result.years.len()),
        None => NA.to_string(),
    };
    let _ = writeln!(out, "- **Coverage**: {coverage}");
    let correlation = match result.correlation_r {
        Some(r) => format!("{r:.2} ({})", Relationship::of(r).label()),
        None => format!("{NA} (not enough aligned years)"),
    };
    let _ = writeln!(out, "- **Pearson correlation**: {correlation}");
    let _ = writeln!(out, "- **{primary}**: {}", primary_trend(result, span.as_deref()));
    let _ = writeln!(out, "- **{secondary}**: {}", secondary_stability(result));
    let _ = writeln!(
        out,
        "- **Peak {primary} YoY Growth**: {}",
        describe(peak_growth(&result.primary_growth_yoy), "%")
    );
    let _ = writeln!(
        out,
        "- **Largest {secondary} Change**: {}",
        describe(largest_change(&result.secondary_change_yoy), "pp")
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Interpretation");
    match result.correlation_r.map(Relationship::of) {
        Some(Relationship::Negative) => {
            let _ = writeln!(
                out,
                "- **Negative correlation**: years with higher {primary} tend to show lower {secondary}"
            );
            let _ = writeln!(
                out,
                "- Possible explanations include changed incentives or structural factors that dominate both series"
            );
        }
        Some(Relationship::Positive) => {
            let _ = writeln!(
                out,
                "- **Positive correlation**: years with higher {primary} tend to show higher {secondary}"
            );
            let _ = writeln!(
                out,
                "- The two series may share a common driver such as economic growth"
            );
        }
        Some(Relationship::None) => {
            let _ = writeln!(
                out,
                "- No clear linear relationship between {primary} and {secondary} over the aligned years"
            );
            let _ = writeln!(
                out,
                "- The relationship requires further investigation with additional control variables"
            );
        }
        None => {
            let _ = writeln!(
                out,
                "- No correlation could be computed; at least 3 aligned years with varying values are needed"
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Context");
    let _ = writeln!(
        out,
        "- **Important**: Correlation ≠ Causation. Consider controls such as GDP, unemployment, education levels and income inequality"
    );
    let _ = writeln!(out);

    let stats = &result.pipeline_stats;
    let norm = &result.normalization_available;
    let _ = writeln!(out, "## Data Notes");
    let _ = writeln!(out, "- {primary}: {} data points", stats.primary_rows);
    let _ = writeln!(out, "- {secondary}: {} data points", stats.secondary_rows);
    let _ = writeln!(
        out,
        "- Denominators: {} value rows, {} count rows",
        stats.denominator_value_rows, stats.denominator_count_rows
    );
    let _ = writeln!(
        out,
        "- {} years successfully aligned between datasets",
        stats.years_aligned
    );
    let _ = write!(
        out,
        "- Normalization: percent of denominator {}, per unit {}",
        availability(norm.percent_of_denominator),
        availability(norm.per_unit)
    );

    out
}

fn coverage_span(result: &ProcessedResult) -> Option<String> {
    let first = result.years.first()?;
    let last = result.years.last()?;
    Some(format!("{first}–{last}"))
}

fn primary_trend(result: &ProcessedResult, span: Option<&str>) -> String {
    let (Some(first), Some(last), Some(span)) =
        (result.time_series.first(), result.time_series.last(), span)
    else {
        return NA.to_string();
    };
    let direction = if last.primary > first.primary {
        "increased"
    } else if last.primary < first.primary {
        "decreased"
    } else {
        "remained unchanged"
    };
    format!("{direction} between {span}")
}

fn secondary_stability(result: &ProcessedResult) -> String {
    let values = result.time_series.iter().map(|p| p.secondary);
    let Some((min, max)) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    }) else {
        return NA.to_string();
    };
    let range = max - min;
    if range < STABLE_RANGE {
        format!("remained relatively stable (range {range:.2})")
    } else {
        format!("showed significant variation (range {range:.2})")
    }
}

/// Largest value; the earliest year wins ties.
fn peak_growth(growth: &[YearValue]) -> Option<YearValue> {
    growth.iter().fold(None, |best: Option<YearValue>, g| match best {
        Some(b) if b.value >= g.value => Some(b),
        _ => Some(*g),
    })
}

/// Steepest drop (most negative change); the earliest year wins ties.
fn largest_change(change: &[YearValue]) -> Option<YearValue> {
    change.iter().fold(None, |best: Option<YearValue>, c| match best {
        Some(b) if b.value <= c.value => Some(b),
        _ => Some(*c),
    })
}

fn describe(point: Option<YearValue>, unit: &str) -> String {
    match point {
        Some(p) => format!("{:.2}{unit} in {}", p.value, p.year),
        None => format!("{NA} in {NA}"),
    }
}

fn availability(flag: bool) -> &'static str {
    if flag {
        "available"
    } else {
        "not available"
    }
}
