use cotrend_io::{parse_files, FileInput};

use crate::aggregate::aggregate;
use crate::align::{align, normalize_by_count, normalize_by_value, scatter, yoy_change, yoy_growth};
use crate::classify::{Classification, Classifier};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::model::{
    NormalizationAvailable, NormalizedSeries, ParsedDatasets, PipelineStats, ProcessedResult,
};
use crate::normalize::{missing_columns, normalize_rows};
use crate::stats::{ols, pearson};

/// Outcome of loading a batch of files. Failed files are listed, not fatal.
#[derive(Debug, Clone, Default)]
pub struct Ingest {
    pub datasets: ParsedDatasets,
    pub classifications: Vec<Classification>,
    pub failures: Vec<PipelineError>,
}

/// Parse, normalize, schema-check and classify every file.
pub fn ingest(files: &[FileInput], config: &PipelineConfig) -> Ingest {
    let classifier = Classifier::new(&config.classifier);
    let mut out = Ingest::default();

    for (file, parsed) in parse_files(files) {
        let rows = match parsed {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("skipping {e}");
                out.failures.push(e.into());
                continue;
            }
        };

        if rows.is_empty() {
            let err = PipelineError::NoRows { file };
            log::warn!("skipping {err}");
            out.failures.push(err);
            continue;
        }

        let records = normalize_rows(&rows);
        let missing = missing_columns(&records);
        if !missing.is_empty() {
            let err = PipelineError::Schema {
                file,
                missing: missing.into_iter().map(String::from).collect(),
            };
            log::warn!("skipping {err}");
            out.failures.push(err);
            continue;
        }

        let classification = classifier.classify(&file, &records);
        out.datasets.bucket_mut(classification.role).extend(records);
        out.classifications.push(classification);
    }

    let d = &out.datasets;
    log::info!(
        "ingested {} file(s), {} failed: {} primary, {} secondary, {} denominator-value, {} denominator-count rows",
        out.classifications.len(),
        out.failures.len(),
        d.primary.len(),
        d.secondary.len(),
        d.denominator_value.len(),
        d.denominator_count.len()
    );
    out
}

/// Derive every series and statistic for one country. Total: empty or
/// non-overlapping input yields an empty result with `None` statistics.
pub fn process(datasets: &ParsedDatasets, country: &str) -> ProcessedResult {
    let primary = aggregate(&datasets.primary, country);
    let secondary = aggregate(&datasets.secondary, country);
    let denominator_value = aggregate(&datasets.denominator_value, country);
    let denominator_count = aggregate(&datasets.denominator_count, country);

    let (years, time_series) = align(&primary, &secondary);
    let xs: Vec<f64> = time_series.iter().map(|p| p.primary).collect();
    let ys: Vec<f64> = time_series.iter().map(|p| p.secondary).collect();

    let percent_of_denominator = Some(normalize_by_value(&years, &primary, &secondary, &denominator_value))
        .filter(|s| !s.is_empty());
    let per_unit = Some(normalize_by_count(&years, &primary, &secondary, &denominator_count))
        .filter(|s| !s.is_empty());

    let result = ProcessedResult {
        country: country.to_string(),
        primary_growth_yoy: yoy_growth(&time_series),
        secondary_change_yoy: yoy_change(&time_series),
        scatter: scatter(&time_series),
        correlation_r: pearson(&xs, &ys),
        ols: ols(&xs, &ys),
        normalization_available: NormalizationAvailable {
            percent_of_denominator: percent_of_denominator.is_some(),
            per_unit: per_unit.is_some(),
        },
        normalized: NormalizedSeries {
            percent_of_denominator,
            per_unit,
        },
        pipeline_stats: PipelineStats {
            primary_rows: datasets.primary.len(),
            secondary_rows: datasets.secondary.len(),
            denominator_value_rows: datasets.denominator_value.len(),
            denominator_count_rows: datasets.denominator_count.len(),
            years_aligned: years.len(),
            first_year: years.first().copied(),
            last_year: years.last().copied(),
        },
        years,
        time_series,
    };

    if let Some(e) = result.insufficiency() {
        log::warn!("{country}: {e}; correlation and regression omitted");
    }
    log::info!(
        "{country}: {} aligned year(s), r = {}",
        result.years.len(),
        result
            .correlation_r
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.4}"))
    );
    result
}

/// [`process`], with zero overlap reported as [`PipelineError::NoOverlap`].
pub fn analyze(datasets: &ParsedDatasets, country: &str) -> Result<ProcessedResult, PipelineError> {
    let result = process(datasets, country);
    if !result.has_overlap() {
        return Err(PipelineError::NoOverlap {
            country: country.to_string(),
        });
    }
    Ok(result)
}
