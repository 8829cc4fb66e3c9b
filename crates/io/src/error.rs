use std::fmt;

/// A file could not be turned into rows. Scoped to one file; siblings keep going.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub file: String,
    pub cause: String,
}

impl ParseError {
    pub fn new(file: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            cause: cause.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse '{}': {}", self.file, self.cause)
    }
}

impl std::error::Error for ParseError {}
