//! Database construction from settings.
//!
//! - **memory**: an in-process [`store::MemoryDatabase`], gone when the process exits
//! - **file**: a [`store::FileDatabase`] under `storage.data_dir`, or
//!   `<data_dir>/notepad/` when unset

use std::path::PathBuf;
use std::sync::Arc;

use api::settings::{Settings, StorageKind};
use store::{Database, FileDatabase, MemoryDatabase, StoreError};
use tracing::info;

/// Platform data directory for the file database.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notepad")
}

pub fn make_database(settings: &Settings) -> Result<Arc<dyn Database>, StoreError> {
    match settings.storage.kind {
        StorageKind::Memory => {
            info!(backend = %settings.backend.database_url, "using in-memory database");
            Ok(Arc::new(MemoryDatabase::new()))
        }
        StorageKind::File => {
            let dir = settings
                .storage
                .data_dir
                .clone()
                .unwrap_or_else(default_data_dir);
            let db = FileDatabase::open(dir)?;
            info!(path = %db.path().display(), "using file database");
            Ok(Arc::new(db))
        }
    }
}
