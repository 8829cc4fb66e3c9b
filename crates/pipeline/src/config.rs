use serde::Deserialize;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub default_country: String,
    pub classifier: ClassifierConfig,
    pub labels: SeriesLabels,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_country: "South Africa".into(),
            classifier: ClassifierConfig::default(),
            labels: SeriesLabels::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Rows sampled from the start of a file for the numeric heuristics.
    pub sample_size: usize,
    pub percent_min: f64,
    pub percent_max: f64,
    /// Sample mean above which an untagged file is treated as the primary series.
    pub magnitude_threshold: f64,
    pub tags: RoleTags,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sample_size: 10,
            percent_min: 0.0,
            percent_max: 100.0,
            magnitude_threshold: 1000.0,
            tags: RoleTags::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoleTags {
    pub primary: TagSet,
    pub secondary: TagSet,
    pub denominator_value: TagSet,
    pub denominator_count: TagSet,
}

impl Default for RoleTags {
    fn default() -> Self {
        Self {
            primary: TagSet::new(&["SOC_PRO"], &["SOC_PRO", "COFOG", "SOCIAL"]),
            secondary: TagSet::new(&["HCP"], &["HCP", "LABOUR", "LABOR"]),
            denominator_value: TagSet::new(&["GDP"], &["GDP"]),
            denominator_count: TagSet::new(&["POP", "POPULATION"], &["POP", "POPULATION"]),
        }
    }
}

/// Upper-case substrings looked for in the file name and in INDICATOR values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagSet {
    pub filename: Vec<String>,
    pub indicator: Vec<String>,
}

impl TagSet {
    pub fn new(filename: &[&str], indicator: &[&str]) -> Self {
        Self {
            filename: filename.iter().map(|s| s.to_string()).collect(),
            indicator: indicator.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn uppercase(&mut self) {
        for tag in self.filename.iter_mut().chain(self.indicator.iter_mut()) {
            *tag = tag.trim().to_uppercase();
        }
        self.filename.retain(|t| !t.is_empty());
        self.indicator.retain(|t| !t.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Human names of the two series, used by the summary report.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeriesLabels {
    pub primary: String,
    pub secondary: String,
}

impl Default for SeriesLabels {
    fn default() -> Self {
        Self {
            primary: "Social Protection Expenditure".into(),
            secondary: "Labour Force Participation".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, PipelineError> {
        let mut config: PipelineConfig =
            toml::from_str(input).map_err(|e| PipelineError::ConfigParse(e.to_string()))?;
        config.classifier.tags.primary.uppercase();
        config.classifier.tags.secondary.uppercase();
        config.classifier.tags.denominator_value.uppercase();
        config.classifier.tags.denominator_count.uppercase();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.default_country.trim().is_empty() {
            return Err(PipelineError::ConfigValidation(
                "default_country must not be empty".into(),
            ));
        }

        let c = &self.classifier;
        if c.sample_size == 0 {
            return Err(PipelineError::ConfigValidation(
                "classifier.sample_size must be at least 1".into(),
            ));
        }
        if !c.percent_min.is_finite() || !c.percent_max.is_finite() || c.percent_min > c.percent_max {
            return Err(PipelineError::ConfigValidation(format!(
                "classifier percent range [{}, {}] is invalid",
                c.percent_min, c.percent_max
            )));
        }
        if !c.magnitude_threshold.is_finite() {
            return Err(PipelineError::ConfigValidation(
                "classifier.magnitude_threshold must be finite".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config.default_country, "South Africa");
        assert_eq!(config.classifier.sample_size, 10);
        assert_eq!(config.classifier.magnitude_threshold, 1000.0);
        assert_eq!(config.classifier.tags.secondary.indicator, vec!["HCP", "LABOUR", "LABOR"]);
        assert_eq!(config.labels.primary, "Social Protection Expenditure");
    }

    #[test]
    fn parse_overrides_and_uppercases_tags() {
        let input = r#"
default_country = "Kenya"

[classifier]
sample_size = 5
magnitude_threshold = 500.0

[classifier.tags.primary]
filename = ["spend"]
indicator = [" exp_ ", ""]

[labels]
primary = "Health spending"
"#;
        let config = PipelineConfig::from_toml(input).unwrap();
        assert_eq!(config.default_country, "Kenya");
        assert_eq!(config.classifier.sample_size, 5);
        assert_eq!(config.classifier.percent_max, 100.0);
        assert_eq!(config.classifier.tags.primary.filename, vec!["SPEND"]);
        assert_eq!(config.classifier.tags.primary.indicator, vec!["EXP_"]);
        // Untouched role keeps its defaults
        assert_eq!(config.classifier.tags.denominator_value.filename, vec!["GDP"]);
        assert_eq!(config.labels.primary, "Health spending");
        assert_eq!(config.labels.secondary, "Labour Force Participation");
    }

    #[test]
    fn reject_zero_sample_size() {
        let err = PipelineConfig::from_toml("[classifier]\nsample_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("sample_size"));
    }

    #[test]
    fn reject_inverted_percent_range() {
        let err = PipelineConfig::from_toml("[classifier]\npercent_min = 50.0\npercent_max = 10.0\n")
            .unwrap_err();
        assert!(err.to_string().contains("percent range"));
    }

    #[test]
    fn reject_unparseable_toml() {
        let err = PipelineConfig::from_toml("default_country = ").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse(_)));
    }
}
