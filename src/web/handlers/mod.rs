//! API handlers for the depot front end.

pub mod file;

pub use file::*;

use crate::config::StorageConfig;
use crate::file::{FileService, FileStorage, ObjectIndex};
use crate::Result;

/// Application state shared across handlers.
#[derive(Debug)]
pub struct AppState {
    /// Directory holding the physical bytes.
    pub storage: FileStorage,
    /// Persisted catalog of records.
    pub index: ObjectIndex,
    /// Maximum accepted upload body, in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(storage: FileStorage, index: ObjectIndex, max_upload_size: u64) -> Self {
        Self {
            storage,
            index,
            max_upload_size,
        }
    }

    /// Build the state from the storage section of the configuration.
    ///
    /// Creates the upload directory if needed; the index document is not
    /// touched.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let storage = FileStorage::new(&config.upload_dir)?;
        let index = ObjectIndex::new(&config.index_path);
        Ok(Self::new(storage, index, config.max_upload_bytes()))
    }

    /// File service over this state's storage and index.
    pub fn file_service(&self) -> FileService<'_> {
        FileService::new(&self.storage, &self.index)
    }
}
