//! `cotrend-pipeline`: country/year alignment and co-movement statistics.
//!
//! Receives parsed rows from `cotrend-io`, routes each file to a series role, reduces
//! every series to a per-year mean for one country, aligns the two main series and
//! computes YoY movement, Pearson correlation and an OLS fit. No persistence or CLI.

pub mod aggregate;
pub mod align;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod stats;
pub mod summary;

pub use classify::{Classification, Classifier};
pub use config::{PipelineConfig, SeriesLabels};
pub use engine::{analyze, ingest, process, Ingest};
pub use error::PipelineError;
pub use model::{ParsedDatasets, ProcessedResult, Record, Role, TimeSeriesPoint};
pub use normalize::{missing_columns, validate_schema};
pub use summary::to_markdown_summary;
