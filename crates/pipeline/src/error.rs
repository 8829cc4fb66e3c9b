use std::fmt;

use cotrend_io::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A file could not be parsed.
    Parse(ParseError),
    /// A file has a header but no data rows.
    NoRows { file: String },
    /// A file lacks required canonical columns; its rows are excluded.
    Schema { file: String, missing: Vec<String> },
    /// Too few aligned years for correlation / regression.
    InsufficientData { required: usize, actual: usize },
    /// The primary and secondary series share no year for the country.
    NoOverlap { country: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error.
    ConfigValidation(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::NoRows { file } => write!(f, "'{file}': no data rows"),
            Self::Schema { file, missing } => {
                write!(f, "'{file}': missing column(s) {}", missing.join(", "))
            }
            Self::InsufficientData { required, actual } => {
                write!(f, "need at least {required} aligned years, got {actual}")
            }
            Self::NoOverlap { country } => {
                write!(f, "no overlapping years between the two series for '{country}'")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}
