use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use cotrend_pipeline::{PipelineConfig, PipelineError};

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    Read { path: PathBuf, cause: String },
    Invalid { path: PathBuf, error: PipelineError },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, cause } => write!(f, "cannot read {}: {cause}", path.display()),
            Self::Invalid { path, error } => write!(f, "{}: {error}", path.display()),
        }
    }
}

impl std::error::Error for SettingsError {}

/// `<config_dir>/cotrend/config.toml`
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cotrend")
        .join("config.toml")
}

/// Load the pipeline config.
///
/// An explicit path must exist. Without one, the default location is used when
/// present, and built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<PipelineConfig, SettingsError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = config_path();
            if !path.exists() {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(PipelineConfig::default());
            }
            path
        }
    };
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<PipelineConfig, SettingsError> {
    let contents = fs::read_to_string(path).map_err(|e| SettingsError::Read {
        path: path.to_path_buf(),
        cause: e.to_string(),
    })?;
    let config = PipelineConfig::from_toml(&contents).map_err(|error| SettingsError::Invalid {
        path: path.to_path_buf(),
        error,
    })?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}
