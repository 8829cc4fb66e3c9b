//! Dataset classification.
//!
//! Each file's full record set is routed to exactly one [`Role`]. The decision is an
//! explicit ordered list of [`ClassifierRule`]s evaluated in priority order; the first
//! rule that returns a verdict wins:
//!
//! 1. `primary-tag`: primary tags match and the sample is not percent-like
//! 2. `denominator-value-tag`: value-denominator tags match
//! 3. `denominator-count-tag`: count-denominator tags match
//! 4. `secondary-tag`: secondary tags match
//! 5. `percent-range`: every sampled value lies in the percent range
//! 6. `magnitude`: sample mean above the threshold → primary, else secondary
//!
//! A tag set matches on a file-name substring or on a substring of any INDICATOR value.
//! The heuristic is best-effort: ambiguous input can be misrouted.

use std::collections::BTreeSet;

use crate::config::{ClassifierConfig, TagSet};
use crate::model::{Record, Role};

/// What the rules look at for one file.
#[derive(Debug, Clone)]
pub struct FileEvidence {
    /// Upper-cased file name.
    pub file_name: String,
    /// Upper-cased, non-empty INDICATOR values.
    pub indicators: BTreeSet<String>,
    /// Finite VALUEs of the first `sample_size` records.
    pub sample: Vec<f64>,
    pub in_percent_range: bool,
}

impl FileEvidence {
    pub fn gather(file_name: &str, records: &[Record], config: &ClassifierConfig) -> Self {
        let indicators = records
            .iter()
            .filter_map(|r| r.indicator.as_ref())
            .filter(|cell| !cell.is_blank())
            .map(|cell| cell.to_string().trim().to_uppercase())
            .collect();

        let sample: Vec<f64> = records
            .iter()
            .take(config.sample_size)
            .filter_map(|r| r.value.as_ref().and_then(|cell| cell.as_number()))
            .collect();

        let in_percent_range = !sample.is_empty()
            && sample
                .iter()
                .all(|n| *n >= config.percent_min && *n <= config.percent_max);

        Self {
            file_name: file_name.to_uppercase(),
            indicators,
            sample,
            in_percent_range,
        }
    }

    pub fn matches_file_name(&self, tags: &TagSet) -> bool {
        tags.filename.iter().any(|tag| self.file_name.contains(tag.as_str()))
    }

    pub fn matches_indicator(&self, tags: &TagSet) -> bool {
        self.indicators
            .iter()
            .any(|value| tags.indicator.iter().any(|tag| value.contains(tag.as_str())))
    }

    pub fn matches(&self, tags: &TagSet) -> bool {
        self.matches_file_name(tags) || self.matches_indicator(tags)
    }

    pub fn sample_mean(&self) -> f64 {
        if self.sample.is_empty() {
            0.0
        } else {
            self.sample.iter().sum::<f64>() / self.sample.len() as f64
        }
    }
}

/// One step of the ordered classification.
pub trait ClassifierRule: Send + Sync {
    fn name(&self) -> &'static str;
    /// `Some(role)` on a match, `None` to defer to the next rule.
    fn evaluate(&self, evidence: &FileEvidence) -> Option<Role>;
}

/// Tag match routed to a fixed role, optionally refused for percent-like samples.
pub struct TagRule {
    name: &'static str,
    role: Role,
    tags: TagSet,
    reject_percent_like: bool,
}

impl ClassifierRule for TagRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn evaluate(&self, evidence: &FileEvidence) -> Option<Role> {
        if self.reject_percent_like && evidence.in_percent_range {
            return None;
        }
        evidence.matches(&self.tags).then_some(self.role)
    }
}

pub struct PercentRangeRule;

impl ClassifierRule for PercentRangeRule {
    fn name(&self) -> &'static str {
        "percent-range"
    }

    fn evaluate(&self, evidence: &FileEvidence) -> Option<Role> {
        evidence.in_percent_range.then_some(Role::Secondary)
    }
}

pub struct MagnitudeRule {
    threshold: f64,
}

impl ClassifierRule for MagnitudeRule {
    fn name(&self) -> &'static str {
        "magnitude"
    }

    fn evaluate(&self, evidence: &FileEvidence) -> Option<Role> {
        if evidence.sample_mean() > self.threshold {
            Some(Role::Primary)
        } else {
            Some(Role::Secondary)
        }
    }
}

/// The outcome for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub file: String,
    pub role: Role,
    pub rule: &'static str,
}

pub struct Classifier {
    rules: Vec<Box<dyn ClassifierRule>>,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let tags = &config.tags;
        let rules: Vec<Box<dyn ClassifierRule>> = vec![
            Box::new(TagRule {
                name: "primary-tag",
                role: Role::Primary,
                tags: tags.primary.clone(),
                reject_percent_like: true,
            }),
            Box::new(TagRule {
                name: "denominator-value-tag",
                role: Role::DenominatorValue,
                tags: tags.denominator_value.clone(),
                reject_percent_like: false,
            }),
            Box::new(TagRule {
                name: "denominator-count-tag",
                role: Role::DenominatorCount,
                tags: tags.denominator_count.clone(),
                reject_percent_like: false,
            }),
            Box::new(TagRule {
                name: "secondary-tag",
                role: Role::Secondary,
                tags: tags.secondary.clone(),
                reject_percent_like: false,
            }),
            Box::new(PercentRangeRule),
            Box::new(MagnitudeRule {
                threshold: config.magnitude_threshold,
            }),
        ];
        Self {
            rules,
            config: config.clone(),
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn classify(&self, file_name: &str, records: &[Record]) -> Classification {
        let evidence = FileEvidence::gather(file_name, records, &self.config);
        self.classify_evidence(file_name, &evidence)
    }

    pub fn classify_evidence(&self, file_name: &str, evidence: &FileEvidence) -> Classification {
        for rule in &self.rules {
            if let Some(role) = rule.evaluate(evidence) {
                log::debug!("{file_name}: {role} (rule {})", rule.name());
                return Classification {
                    file: file_name.to_string(),
                    role,
                    rule: rule.name(),
                };
            }
        }
        // The magnitude rule always answers; this is the same decision without it.
        Classification {
            file: file_name.to_string(),
            role: Role::Secondary,
            rule: "magnitude",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cotrend_io::Cell;

    fn rec(indicator: &str, value: f64) -> Record {
        Record {
            indicator: Some(Cell::Text(indicator.into())),
            value: Some(Cell::Number(value)),
            ..Record::default()
        }
    }

    fn classify(file: &str, records: &[Record]) -> Classification {
        Classifier::new(&ClassifierConfig::default()).classify(file, records)
    }

    #[test]
    fn rule_order_is_fixed() {
        let classifier = Classifier::new(&ClassifierConfig::default());
        assert_eq!(
            classifier.rule_names(),
            vec![
                "primary-tag",
                "denominator-value-tag",
                "denominator-count-tag",
                "secondary-tag",
                "percent-range",
                "magnitude",
            ]
        );
    }

    #[test]
    fn primary_by_file_name() {
        let c = classify("WB_SOC_PRO_EXP.csv", &[rec("X", 250_000.0)]);
        assert_eq!((c.role, c.rule), (Role::Primary, "primary-tag"));
    }

    #[test]
    fn primary_by_indicator() {
        let c = classify("upload.csv", &[rec("cofog_710", 9_000.0)]);
        assert_eq!((c.role, c.rule), (Role::Primary, "primary-tag"));
    }

    #[test]
    fn primary_tag_refused_for_percent_like_sample() {
        // Social spending expressed as % of GDP looks like a percent series
        let c = classify("soc_pro_pct.csv", &[rec("SOCIAL", 12.0), rec("SOCIAL", 14.0)]);
        assert_eq!((c.role, c.rule), (Role::Secondary, "percent-range"));
    }

    #[test]
    fn denominator_tags_win_over_percent_range() {
        let c = classify("gdp_growth.csv", &[rec("X", 2.5)]);
        assert_eq!((c.role, c.rule), (Role::DenominatorValue, "denominator-value-tag"));

        let c = classify("data.csv", &[rec("SP.POP.TOTL", 59_000_000.0)]);
        assert_eq!((c.role, c.rule), (Role::DenominatorCount, "denominator-count-tag"));
    }

    #[test]
    fn value_denominator_outranks_count_denominator() {
        let c = classify("gdp_per_population.csv", &[rec("X", 6_000.0)]);
        assert_eq!(c.role, Role::DenominatorValue);
    }

    #[test]
    fn secondary_by_tag_even_out_of_range() {
        let c = classify("ILO_HCP.csv", &[rec("X", 1_500.0)]);
        assert_eq!((c.role, c.rule), (Role::Secondary, "secondary-tag"));
    }

    #[test]
    fn percent_range_fallback() {
        let c = classify("upload.csv", &[rec("X", 58.0), rec("X", 0.0), rec("X", 100.0)]);
        assert_eq!((c.role, c.rule), (Role::Secondary, "percent-range"));
    }

    #[test]
    fn magnitude_fallback() {
        let c = classify("upload.csv", &[rec("X", 5_000.0), rec("X", 1.0)]);
        assert_eq!((c.role, c.rule), (Role::Primary, "magnitude"));

        let c = classify("upload.csv", &[rec("X", 150.0), rec("X", -2.0)]);
        assert_eq!((c.role, c.rule), (Role::Secondary, "magnitude"));
    }

    #[test]
    fn empty_sample_is_secondary_by_magnitude() {
        let blank = Record {
            value: Some(Cell::Empty),
            ..Record::default()
        };
        let c = classify("upload.csv", &[blank]);
        assert_eq!((c.role, c.rule), (Role::Secondary, "magnitude"));
    }

    #[test]
    fn sample_limited_to_first_rows() {
        let mut records: Vec<Record> = (0..10).map(|_| rec("X", 50.0)).collect();
        records.push(rec("X", 1_000_000.0));
        let c = classify("upload.csv", &records);
        assert_eq!(c.rule, "percent-range");
    }

    #[test]
    fn numeric_indicator_values_are_matched_as_text() {
        let records = vec![Record {
            indicator: Some(Cell::Number(710.0)),
            value: Some(Cell::Number(5_000.0)),
            ..Record::default()
        }];
        let evidence = FileEvidence::gather("a.csv", &records, &ClassifierConfig::default());
        assert!(evidence.indicators.contains("710"));
    }
}
