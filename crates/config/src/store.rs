use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cotrend_pipeline::ProcessedResult;

use crate::state::{FileManifestEntry, Snapshot};

pub const HAS_DATA_KEY: &str = "has_data";
pub const UPLOADED_FILES_KEY: &str = "uploaded_files";
pub const PROCESSED_SUMMARY_KEY: &str = "processed_summary";

pub const KEYS: [&str; 3] = [HAS_DATA_KEY, UPLOADED_FILES_KEY, PROCESSED_SUMMARY_KEY];

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Io(String),
    Serialize(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "state storage error: {msg}"),
            Self::Serialize(msg) => write!(f, "state serialization error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Key/value storage of JSON text under the three state keys.
///
/// Implementors supply the raw accessors; `load`, `save` and `clear` are shared.
pub trait SnapshotStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Restore a snapshot. Malformed entries are logged and treated as absent.
    fn load(&self) -> Result<Snapshot, StoreError> {
        let flag = self.read(HAS_DATA_KEY)?.is_some_and(|raw| raw.trim() == "true");

        let uploaded_files = match self.read(UPLOADED_FILES_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<FileManifestEntry>>(&raw).unwrap_or_else(|e| {
                log::warn!("ignoring malformed {UPLOADED_FILES_KEY}: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let processed = match self.read(PROCESSED_SUMMARY_KEY)? {
            Some(raw) => match serde_json::from_str::<ProcessedResult>(&raw) {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("ignoring malformed {PROCESSED_SUMMARY_KEY}: {e}");
                    None
                }
            },
            None => None,
        };

        let has_data = flag || processed.as_ref().is_some_and(|p| !p.time_series.is_empty());
        Ok(Snapshot {
            has_data,
            uploaded_files,
            processed,
        })
    }

    /// Persist every key. A snapshot without a result removes the stored one.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.write(HAS_DATA_KEY, if snapshot.has_data { "true" } else { "false" })?;

        let files = serde_json::to_string(&snapshot.uploaded_files)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        self.write(UPLOADED_FILES_KEY, &files)?;

        match &snapshot.processed {
            Some(result) => {
                let json = serde_json::to_string(result)
                    .map_err(|e| StoreError::Serialize(e.to_string()))?;
                self.write(PROCESSED_SUMMARY_KEY, &json)
            }
            None => self.remove(PROCESSED_SUMMARY_KEY),
        }
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        for key in KEYS {
            self.remove(key)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key inside a state directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config_dir>/cotrend/state`
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cotrend")
            .join("state")
    }

    pub fn open_default() -> Self {
        Self::new(Self::default_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(format!("{}: {e}", path.display()))),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.dir.display())))?;
        let path = self.key_path(key);
        fs::write(&path, value).map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(format!("{}: {e}", path.display()))),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cotrend_pipeline::{ParsedDatasets, TimeSeriesPoint};

    fn result_with_points(n: usize) -> ProcessedResult {
        let mut result = cotrend_pipeline::process(&ParsedDatasets::default(), "South Africa");
        result.time_series = (0..n)
            .map(|i| TimeSeriesPoint {
                year: 2018 + i as i32,
                primary: 100.0,
                secondary: 50.0,
            })
            .collect();
        result
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            has_data: true,
            uploaded_files: vec![FileManifestEntry::new("soc_pro.csv", 2048)],
            processed: Some(result_with_points(3)),
        }
    }

    #[test]
    fn empty_store_restores_nothing() {
        let snap = MemoryStore::new().load().unwrap();
        assert_eq!(snap, Snapshot::default());
    }

    #[test]
    fn memory_roundtrip() {
        let mut store = MemoryStore::new();
        store.save(&snapshot()).unwrap();
        assert_eq!(store.read(HAS_DATA_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(store.load().unwrap(), snapshot());
    }

    #[test]
    fn has_data_inferred_from_time_series() {
        let mut store = MemoryStore::new();
        store.write(HAS_DATA_KEY, "false").unwrap();
        store
            .write(PROCESSED_SUMMARY_KEY, &serde_json::to_string(&result_with_points(2)).unwrap())
            .unwrap();
        assert!(store.load().unwrap().has_data);

        store
            .write(PROCESSED_SUMMARY_KEY, &serde_json::to_string(&result_with_points(0)).unwrap())
            .unwrap();
        assert!(!store.load().unwrap().has_data);
    }

    #[test]
    fn malformed_entries_are_ignored() {
        let mut store = MemoryStore::new();
        store.write(HAS_DATA_KEY, "yes").unwrap();
        store.write(UPLOADED_FILES_KEY, "{not json").unwrap();
        store.write(PROCESSED_SUMMARY_KEY, "[1, 2]").unwrap();
        let snap = store.load().unwrap();
        assert!(!snap.has_data);
        assert!(snap.uploaded_files.is_empty());
        assert!(snap.processed.is_none());
    }

    #[test]
    fn saving_without_result_removes_key() {
        let mut store = MemoryStore::new();
        store.save(&snapshot()).unwrap();
        assert!(store.contains(PROCESSED_SUMMARY_KEY));

        let mut cleared = snapshot();
        cleared.processed = None;
        store.save(&cleared).unwrap();
        assert!(!store.contains(PROCESSED_SUMMARY_KEY));
        assert!(store.contains(UPLOADED_FILES_KEY));
    }

    #[test]
    fn file_store_writes_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("state"));
        store.save(&snapshot()).unwrap();

        for key in KEYS {
            assert!(dir.path().join("state").join(format!("{key}.json")).exists(), "{key}");
        }
        assert_eq!(FileStore::new(dir.path().join("state")).load().unwrap(), snapshot());

        store.clear().unwrap();
        assert!(!dir.path().join("state").join("has_data.json").exists());
        assert_eq!(store.load().unwrap(), Snapshot::default());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn default_dir_is_namespaced() {
        let dir = FileStore::default_dir();
        assert!(dir.ends_with("cotrend/state"));
    }
}
