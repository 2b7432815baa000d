//! Persisted object index.
//!
//! The whole catalog lives in one JSON document (`{"files": [...]}`) that is
//! rewritten on every mutation. Writes go to a sibling temp file which is then
//! renamed over the document, so readers never see a partial catalog.
//!
//! Mutations hold `write_lock` across their load -> change -> write sequence.
//! Reads take no lock.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::record::ObjectRecord;
use crate::{DepotError, Result};

/// On-disk shape of the index.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexDocument {
    #[serde(default)]
    files: Vec<ObjectRecord>,
}

/// JSON-file backed catalog of object records.
#[derive(Debug)]
pub struct ObjectIndex {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ObjectIndex {
    /// Create an index backed by the document at `path`.
    ///
    /// Nothing is touched on disk until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the index document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty catalog if no document exists yet.
    ///
    /// Returns `true` if a document was created.
    pub async fn init(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(false);
        }
        self.write_document(&IndexDocument::default()).await?;
        Ok(true)
    }

    /// All records in insertion order. A missing document is an empty catalog.
    pub async fn load_all(&self) -> Result<Vec<ObjectRecord>> {
        Ok(self.read_document().await?.files)
    }

    /// Look up one record.
    pub async fn get(&self, id: &str) -> Result<Option<ObjectRecord>> {
        Ok(self.load_all().await?.into_iter().find(|r| r.id == id))
    }

    /// Append records in one persisted update.
    pub async fn append_many(&self, records: Vec<ObjectRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_document().await?;
        doc.files.extend(records);
        self.write_document(&doc).await
    }

    /// Apply `mutator` to the record with `id` and persist.
    ///
    /// Returns the updated record, or `NotFound` without writing.
    pub async fn update_one<F>(&self, id: &str, mutator: F) -> Result<ObjectRecord>
    where
        F: FnOnce(&mut ObjectRecord),
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_document().await?;

        let record = doc
            .files
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(DepotError::object_not_found)?;
        mutator(record);
        let updated = record.clone();

        self.write_document(&doc).await?;
        Ok(updated)
    }

    /// Remove the record with `id` and persist.
    pub async fn remove_one(&self, id: &str) -> Result<ObjectRecord> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_document().await?;

        let position = doc
            .files
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(DepotError::object_not_found)?;
        let removed = doc.files.remove(position);

        self.write_document(&doc).await?;
        Ok(removed)
    }

    async fn read_document(&self) -> Result<IndexDocument> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(IndexDocument::default()),
            Err(e) => {
                return Err(DepotError::Storage(format!(
                    "failed to read index {}: {e}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_slice(&data).map_err(|e| {
            DepotError::Storage(format!(
                "index {} is not a valid catalog: {e}",
                self.path.display()
            ))
        })
    }

    async fn write_document(&self, doc: &IndexDocument) -> Result<()> {
        let data = serde_json::to_vec_pretty(doc)?;
        let tmp = self.temp_path();

        if let Err(e) = self.replace_with(&tmp, &data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(DepotError::Storage(format!(
                "failed to write index {}: {e}",
                self.path.display()
            )));
        }

        tracing::debug!(path = %self.path.display(), records = doc.files.len(), "index persisted");
        Ok(())
    }

    async fn replace_with(&self, tmp: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(tmp, &self.path).await
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()))
    }
}
