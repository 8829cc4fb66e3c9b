use cotrend_io::FileInput;
use cotrend_pipeline::{
    analyze, ingest, Classification, ParsedDatasets, PipelineConfig, PipelineError, ProcessedResult,
};
use serde::{Deserialize, Serialize};

use crate::store::{SnapshotStore, StoreError};

/// Name and byte size of one loaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifestEntry {
    pub name: String,
    pub size: u64,
}

impl FileManifestEntry {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// The persisted subset of [`AppState`]. Parsed datasets are never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub has_data: bool,
    pub uploaded_files: Vec<FileManifestEntry>,
    pub processed: Option<ProcessedResult>,
}

/// Issued by [`AppState::begin_recompute`]; later tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecomputeTicket(u64);

/// Per-file results of [`AppState::ingest`].
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub classifications: Vec<Classification>,
    pub failures: Vec<PipelineError>,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    has_data: bool,
    manifest: Vec<FileManifestEntry>,
    datasets: Option<ParsedDatasets>,
    processed: Option<ProcessedResult>,
    country: String,
    issued: u64,
    committed: u64,
}

impl AppState {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            ..Self::default()
        }
    }

    /// Restore from a store. The country comes from the stored result when there is one.
    pub fn load_from(store: &dyn SnapshotStore, default_country: &str) -> Result<Self, StoreError> {
        let snapshot = store.load()?;
        let country = snapshot
            .processed
            .as_ref()
            .map_or_else(|| default_country.to_string(), |p| p.country.clone());
        Ok(Self {
            has_data: snapshot.has_data,
            manifest: snapshot.uploaded_files,
            datasets: None,
            processed: snapshot.processed,
            country,
            issued: 0,
            committed: 0,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            has_data: self.has_data,
            uploaded_files: self.manifest.clone(),
            processed: self.processed.clone(),
        }
    }

    pub fn save_to(&self, store: &mut dyn SnapshotStore) -> Result<(), StoreError> {
        store.save(&self.snapshot())
    }

    /// Replace the in-memory datasets with a fresh batch. Any previous result is dropped.
    pub fn ingest(&mut self, files: &[FileInput], config: &PipelineConfig) -> IngestReport {
        let batch = ingest(files, config);
        self.manifest = files
            .iter()
            .map(|f| FileManifestEntry::new(f.name.clone(), f.size() as u64))
            .collect();
        self.has_data = !batch.datasets.is_empty();
        self.datasets = Some(batch.datasets);
        self.processed = None;
        IngestReport {
            classifications: batch.classifications,
            failures: batch.failures,
        }
    }

    /// Re-run the pipeline for `country` over the loaded datasets.
    ///
    /// On `NoOverlap` the current result is left in place.
    pub fn recompute(&mut self, country: &str) -> Result<&ProcessedResult, PipelineError> {
        let ticket = self.begin_recompute();
        let empty = ParsedDatasets::default();
        let result = analyze(self.datasets.as_ref().unwrap_or(&empty), country)?;
        self.commit(ticket, result);
        self.processed
            .as_ref()
            .ok_or_else(|| PipelineError::NoOverlap { country: country.to_string() })
    }

    pub fn begin_recompute(&mut self) -> RecomputeTicket {
        self.issued += 1;
        RecomputeTicket(self.issued)
    }

    /// Install `result` unless a later ticket has already committed. Returns whether it was kept.
    pub fn commit(&mut self, ticket: RecomputeTicket, result: ProcessedResult) -> bool {
        if ticket.0 <= self.committed {
            log::debug!(
                "discarding stale result for {} (ticket {}, committed {})",
                result.country,
                ticket.0,
                self.committed
            );
            return false;
        }
        self.committed = ticket.0;
        self.country = result.country.clone();
        self.has_data |= result.has_overlap();
        self.processed = Some(result);
        true
    }

    /// Forget everything. Tickets issued before the reset can no longer commit.
    pub fn reset(&mut self) {
        self.has_data = false;
        self.manifest.clear();
        self.datasets = None;
        self.processed = None;
        self.committed = self.issued;
    }

    pub fn has_data(&self) -> bool {
        self.has_data
    }

    pub fn manifest(&self) -> &[FileManifestEntry] {
        &self.manifest
    }

    pub fn datasets(&self) -> Option<&ParsedDatasets> {
        self.datasets.as_ref()
    }

    pub fn processed(&self) -> Option<&ProcessedResult> {
        self.processed.as_ref()
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use cotrend_io::FileFormat;
    use cotrend_pipeline::process;

    const HEADER: &str = "REF_AREA,REF_AREA_LABEL,INDICATOR,TIME_PERIOD,OBS_VALUE\n";

    fn files() -> Vec<FileInput> {
        let primary = format!(
            "{HEADER}ZAF,South Africa,SOC_PRO,2018,100\nZAF,South Africa,SOC_PRO,2019,110\nZAF,South Africa,SOC_PRO,2020,140\nKEN,Kenya,SOC_PRO,2020,900\n"
        );
        let secondary = format!(
            "{HEADER}ZAF,South Africa,HCP,2018,58\nZAF,South Africa,HCP,2019,57\nZAF,South Africa,HCP,2020,55\nKEN,Kenya,HCP,2020,70\n"
        );
        vec![
            FileInput::new("soc_pro.csv", primary.into_bytes(), FileFormat::Delimited),
            FileInput::new("hcp.csv", secondary.into_bytes(), FileFormat::Delimited),
        ]
    }

    fn loaded() -> AppState {
        let mut state = AppState::new("South Africa");
        let report = state.ingest(&files(), &PipelineConfig::default());
        assert!(report.failures.is_empty());
        state
    }

    #[test]
    fn ingest_records_manifest() {
        let state = loaded();
        assert!(state.has_data());
        let names: Vec<&str> = state.manifest().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["soc_pro.csv", "hcp.csv"]);
        assert_eq!(state.manifest()[0].size, files()[0].size() as u64);
        assert!(state.processed().is_none());
    }

    #[test]
    fn recompute_switches_country_without_reparse() {
        let mut state = loaded();
        assert_eq!(state.recompute("South Africa").unwrap().years.len(), 3);
        assert_eq!(state.recompute("Kenya").unwrap().years, vec![2020]);
        assert_eq!(state.country(), "Kenya");
    }

    #[test]
    fn no_overlap_keeps_previous_result() {
        let mut state = loaded();
        state.recompute("South Africa").unwrap();
        let err = state.recompute("Brazil").unwrap_err();
        assert!(matches!(err, PipelineError::NoOverlap { .. }));
        assert_eq!(state.country(), "South Africa");
        assert_eq!(state.processed().map(|p| p.years.len()), Some(3));
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut state = loaded();
        let datasets = state.datasets().cloned().unwrap();
        let first = state.begin_recompute();
        let second = state.begin_recompute();
        assert!(first < second);

        assert!(state.commit(second, process(&datasets, "Kenya")));
        assert!(!state.commit(first, process(&datasets, "South Africa")));
        assert_eq!(state.country(), "Kenya");
    }

    #[test]
    fn in_order_commits_both_land() {
        let mut state = loaded();
        let datasets = state.datasets().cloned().unwrap();
        let first = state.begin_recompute();
        assert!(state.commit(first, process(&datasets, "Kenya")));
        let second = state.begin_recompute();
        assert!(state.commit(second, process(&datasets, "South Africa")));
        assert_eq!(state.country(), "South Africa");
    }

    #[test]
    fn reset_invalidates_in_flight_tickets() {
        let mut state = loaded();
        let datasets = state.datasets().cloned().unwrap();
        let ticket = state.begin_recompute();
        state.reset();
        assert!(!state.commit(ticket, process(&datasets, "South Africa")));
        assert!(!state.has_data());
        assert!(state.manifest().is_empty());
        assert!(state.datasets().is_none());
    }

    #[test]
    fn save_and_restore() {
        let mut state = loaded();
        state.recompute("South Africa").unwrap();
        let mut store = MemoryStore::new();
        state.save_to(&mut store).unwrap();

        let restored = AppState::load_from(&store, "Kenya").unwrap();
        assert!(restored.has_data());
        assert_eq!(restored.country(), "South Africa");
        assert_eq!(restored.manifest(), state.manifest());
        assert_eq!(restored.processed(), state.processed());
        assert!(restored.datasets().is_none());
    }

    #[test]
    fn restore_from_empty_store_uses_default_country() {
        let restored = AppState::load_from(&MemoryStore::new(), "Kenya").unwrap();
        assert!(!restored.has_data());
        assert_eq!(restored.country(), "Kenya");
        assert!(restored.processed().is_none());
    }
}
