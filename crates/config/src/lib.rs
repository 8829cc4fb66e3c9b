// Settings loading and persisted application state

pub mod settings;
pub mod state;
pub mod store;

pub use settings::{config_path, load_config, SettingsError};
pub use state::{AppState, FileManifestEntry, IngestReport, RecomputeTicket, Snapshot};
pub use store::{FileStore, MemoryStore, SnapshotStore, StoreError};
