// Human-readable terminal output

use std::fmt::Write as _;

use cotrend_config::FileManifestEntry;
use cotrend_pipeline::{Classification, ProcessedResult, Role};
use serde::Serialize;

pub fn render(result: &ProcessedResult, classifications: &[Classification]) -> String {
    let mut out = String::new();
    if !classifications.is_empty() {
        let width = classifications.iter().map(|c| c.file.len()).max().unwrap_or(0);
        let _ = writeln!(out, "Files:");
        for c in classifications {
            let _ = writeln!(out, "  {:<width$}  {:<17} ({})", c.file, c.role.to_string(), c.rule);
        }
        let _ = writeln!(out);
    }
    render_result(&mut out, result);
    out
}

pub fn render_saved(result: &ProcessedResult, manifest: &[FileManifestEntry]) -> String {
    let mut out = String::new();
    if !manifest.is_empty() {
        let _ = writeln!(out, "Files:");
        for entry in manifest {
            let _ = writeln!(out, "  {} ({} bytes)", entry.name, entry.size);
        }
        let _ = writeln!(out);
    }
    render_result(&mut out, result);
    out
}

fn render_result(out: &mut String, result: &ProcessedResult) {
    let _ = writeln!(out, "Country:       {}", result.country);
    let span = match (result.years.first(), result.years.last()) {
        (Some(first), Some(last)) => format!("{first}–{last} ({} years)", result.years.len()),
        _ => "none".to_string(),
    };
    let _ = writeln!(out, "Aligned years: {span}");
    let _ = writeln!(out, "Pearson r:     {}", fmt_opt(result.correlation_r, 4));

    let ols = &result.ols;
    match (ols.intercept, ols.slope) {
        (Some(a), Some(b)) => {
            let _ = writeln!(
                out,
                "OLS:           secondary = {a:.4} + {b:.6} * primary (r² = {})",
                fmt_opt(ols.r_squared, 4)
            );
        }
        _ => {
            let _ = writeln!(out, "OLS:           n/a");
        }
    }

    if let Some(e) = result.insufficiency() {
        let _ = writeln!(out, "Note:          {e}");
    }

    let norm = &result.normalization_available;
    let _ = writeln!(
        out,
        "Normalized:    percent of denominator {}, per unit {}",
        yes_no(norm.percent_of_denominator),
        yes_no(norm.per_unit)
    );

    if !result.time_series.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {:>6}  {:>16}  {:>12}", "year", "primary", "secondary");
        for p in &result.time_series {
            let _ = writeln!(out, "  {:>6}  {:>16.2}  {:>12.2}", p.year, p.primary, p.secondary);
        }
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "n/a".to_string(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

// ============================================================================
// validate
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ValidationEntry {
    pub file: String,
    pub ok: bool,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationEntry {
    pub fn ok(file: &str, rows: usize, role: Role, rule: &'static str) -> Self {
        Self {
            file: file.to_string(),
            ok: true,
            rows,
            role: Some(role),
            rule: Some(rule),
            missing: Vec::new(),
            error: None,
        }
    }

    pub fn missing(file: &str, rows: usize, missing: Vec<&'static str>) -> Self {
        Self {
            file: file.to_string(),
            ok: false,
            rows,
            role: None,
            rule: None,
            missing,
            error: None,
        }
    }

    pub fn failed(file: &str, error: String) -> Self {
        Self {
            file: file.to_string(),
            ok: false,
            rows: 0,
            role: None,
            rule: None,
            missing: Vec::new(),
            error: Some(error),
        }
    }
}

pub fn render_validation(entries: &[ValidationEntry]) -> String {
    let mut out = String::new();
    for e in entries {
        let detail = match (&e.role, &e.error) {
            (Some(role), _) => format!("{} rows -> {role} ({})", e.rows, e.rule.unwrap_or("-")),
            (None, Some(error)) => error.clone(),
            (None, None) => format!("missing column(s) {}", e.missing.join(", ")),
        };
        let _ = writeln!(out, "{:<4}  {}  {detail}", if e.ok { "ok" } else { "FAIL" }, e.file);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cotrend_pipeline::{process, ParsedDatasets};

    #[test]
    fn empty_result_renders_placeholders() {
        let text = render(&process(&ParsedDatasets::default(), "Kenya"), &[]);
        assert!(text.contains("Country:       Kenya"));
        assert!(text.contains("Aligned years: none"));
        assert!(text.contains("Pearson r:     n/a"));
        assert!(text.contains("OLS:           n/a"));
        assert!(text.contains("need at least 3 aligned years, got 0"));
    }

    #[test]
    fn validation_lines() {
        let entries = vec![
            ValidationEntry::ok("a.csv", 4, Role::Primary, "primary-tag"),
            ValidationEntry::missing("b.csv", 2, vec!["AREA_CODE", "INDICATOR"]),
        ];
        let text = render_validation(&entries);
        assert!(text.contains("ok    a.csv  4 rows -> primary (primary-tag)"));
        assert!(text.contains("FAIL  b.csv  missing column(s) AREA_CODE, INDICATOR"));
    }
}
