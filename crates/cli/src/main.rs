// cotrend CLI - load country/year indicator files and report how two series co-move

mod exit_codes;
mod report;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use cotrend_config::{
    load_config, AppState, FileStore, SettingsError, SnapshotStore, StoreError,
};
use cotrend_io::{csv, parse_file, FileInput};
use cotrend_pipeline::normalize::{missing_columns, normalize_rows};
use cotrend_pipeline::{to_markdown_summary, Classifier, PipelineConfig, PipelineError, ProcessedResult};

use exit_codes::{
    EXIT_CONFIG, EXIT_ERROR, EXIT_IO, EXIT_NO_OVERLAP, EXIT_NO_STATE, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "cotrend")]
#[command(about = "Align two country/year indicator series and measure how they co-move")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest files, align the series for one country and report statistics
    #[command(after_help = "\
Examples:
  cotrend analyze soc_pro.csv hcp.xlsx
  cotrend analyze *.csv --country Kenya --json
  cotrend analyze soc_pro.csv hcp.csv gdp.csv --csv merged.csv --summary report.md")]
    Analyze {
        /// Input files (CSV/TSV or spreadsheets)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Country to analyze (defaults to `default_country` from config)
        #[arg(long, short = 'c')]
        country: Option<String>,

        /// Pipeline config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Write the merged series as CSV
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Write the Markdown summary
        #[arg(long, value_name = "PATH")]
        summary: Option<PathBuf>,

        /// State directory (default: <config_dir>/cotrend/state)
        #[arg(long, value_name = "DIR")]
        state_dir: Option<PathBuf>,

        /// Do not persist the result
        #[arg(long)]
        no_save: bool,
    },

    /// Check each file's columns and the role it would be routed to
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Print the saved result
    Show {
        #[arg(long, conflicts_with = "summary")]
        json: bool,

        /// Print the Markdown summary
        #[arg(long)]
        summary: bool,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_name = "DIR")]
        state_dir: Option<PathBuf>,
    },

    /// Export the saved result
    Export {
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        #[arg(long, value_name = "PATH")]
        summary: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_name = "DIR")]
        state_dir: Option<PathBuf>,
    },

    /// Remove the saved state
    Clear {
        #[arg(long, value_name = "DIR")]
        state_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            files,
            country,
            config,
            json,
            csv,
            summary,
            state_dir,
            no_save,
        } => cmd_analyze(files, country, config, json, csv, summary, state_dir, no_save),
        Commands::Validate { files, config, json } => cmd_validate(files, config, json),
        Commands::Show {
            json,
            summary,
            config,
            state_dir,
        } => cmd_show(json, summary, config, state_dir),
        Commands::Export {
            csv,
            summary,
            config,
            state_dir,
        } => cmd_export(csv, summary, config, state_dir),
        Commands::Clear { state_dir } => cmd_clear(state_dir),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn no_state() -> Self {
        Self {
            code: EXIT_NO_STATE,
            message: "no saved result".into(),
            hint: Some("run `cotrend analyze <FILES>...` first".into()),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self { code: EXIT_CONFIG, message: err.to_string(), hint: None }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::io(err.to_string())
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NoOverlap { .. } => Self {
                code: EXIT_NO_OVERLAP,
                message: err.to_string(),
                hint: Some("check --country against the AREA_LABEL / AREA_CODE values in the files".into()),
            },
            PipelineError::ConfigParse(_) | PipelineError::ConfigValidation(_) => {
                Self { code: EXIT_CONFIG, message: err.to_string(), hint: None }
            }
            _ => Self::general(err.to_string()),
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn open_store(state_dir: Option<PathBuf>) -> FileStore {
    match state_dir {
        Some(dir) => FileStore::new(dir),
        None => FileStore::open_default(),
    }
}

fn read_inputs(files: &[PathBuf]) -> Result<Vec<FileInput>, CliError> {
    files
        .iter()
        .map(|path| {
            let bytes = fs::read(path)
                .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(FileInput::detect(name, bytes))
        })
        .collect()
}

fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn write_exports(
    result: &ProcessedResult,
    config: &PipelineConfig,
    csv_path: Option<&Path>,
    summary_path: Option<&Path>,
) -> Result<(), CliError> {
    if let Some(path) = csv_path {
        write_output(path, &csv::to_csv(&result.merged_rows()))?;
    }
    if let Some(path) = summary_path {
        write_output(path, &to_markdown_summary(result, &config.labels))?;
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("cannot serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

fn restore(state_dir: Option<PathBuf>, config: &PipelineConfig) -> Result<(AppState, ProcessedResult), CliError> {
    let store = open_store(state_dir);
    let state = AppState::load_from(&store, &config.default_country)?;
    let result = state.processed().cloned().ok_or_else(CliError::no_state)?;
    Ok((state, result))
}

// ============================================================================
// analyze
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    files: Vec<PathBuf>,
    country: Option<String>,
    config: Option<PathBuf>,
    json: bool,
    csv_path: Option<PathBuf>,
    summary_path: Option<PathBuf>,
    state_dir: Option<PathBuf>,
    no_save: bool,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let country = country.unwrap_or_else(|| config.default_country.clone());
    if country.trim().is_empty() {
        return Err(CliError::args("--country must not be empty"));
    }

    let inputs = read_inputs(&files)?;
    let mut state = AppState::new(country.clone());
    let ingest = state.ingest(&inputs, &config);
    for failure in &ingest.failures {
        eprintln!("warning: {failure}");
    }
    if !state.has_data() {
        return Err(CliError::general("no usable input files")
            .with_hint("each file needs area, indicator, period and value columns; try `cotrend validate`"));
    }

    let result = state.recompute(&country)?.clone();

    if json {
        print_json(&result)?;
    } else {
        print!("{}", report::render(&result, &ingest.classifications));
    }

    write_exports(&result, &config, csv_path.as_deref(), summary_path.as_deref())?;

    if !no_save {
        let mut store = open_store(state_dir);
        state.save_to(&mut store)?;
        log::info!("saved state to {}", store.dir().display());
    }
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(files: Vec<PathBuf>, config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let classifier = Classifier::new(&config.classifier);
    let inputs = read_inputs(&files)?;

    let mut entries = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let entry = match parse_file(input) {
            Err(e) => report::ValidationEntry::failed(&input.name, e.to_string()),
            Ok(rows) if rows.is_empty() => report::ValidationEntry::failed(&input.name, "no data rows".into()),
            Ok(rows) => {
                let records = normalize_rows(&rows);
                let missing = missing_columns(&records);
                if missing.is_empty() {
                    let c = classifier.classify(&input.name, &records);
                    report::ValidationEntry::ok(&input.name, records.len(), c.role, c.rule)
                } else {
                    report::ValidationEntry::missing(&input.name, records.len(), missing)
                }
            }
        };
        entries.push(entry);
    }

    if json {
        print_json(&entries)?;
    } else {
        print!("{}", report::render_validation(&entries));
    }

    let failed = entries.iter().filter(|e| !e.ok).count();
    if failed > 0 {
        return Err(CliError::general(format!(
            "{failed} of {} file(s) failed validation",
            entries.len()
        )));
    }
    Ok(())
}

// ============================================================================
// show / export / clear
// ============================================================================

fn cmd_show(
    json: bool,
    summary: bool,
    config: Option<PathBuf>,
    state_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let (state, result) = restore(state_dir, &config)?;

    if json {
        print_json(&result)?;
    } else if summary {
        println!("{}", to_markdown_summary(&result, &config.labels));
    } else {
        print!("{}", report::render_saved(&result, state.manifest()));
    }
    Ok(())
}

fn cmd_export(
    csv_path: Option<PathBuf>,
    summary_path: Option<PathBuf>,
    config: Option<PathBuf>,
    state_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    if csv_path.is_none() && summary_path.is_none() {
        return Err(CliError::args("nothing to export").with_hint("pass --csv <PATH> and/or --summary <PATH>"));
    }
    let config = load_config(config.as_deref())?;
    let (_, result) = restore(state_dir, &config)?;
    write_exports(&result, &config, csv_path.as_deref(), summary_path.as_deref())
}

fn cmd_clear(state_dir: Option<PathBuf>) -> Result<(), CliError> {
    let mut store = open_store(state_dir);
    store.clear()?;
    println!("cleared {}", store.dir().display());
    Ok(())
}
