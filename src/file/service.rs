//! File service for depot.
//!
//! Upload, list, download, rename and delete, each keeping the index and the
//! storage directory in correspondence.

use std::collections::HashSet;
use std::path::PathBuf;

use bytes::Bytes;
use tokio::fs::File;

use super::index::ObjectIndex;
use super::multipart::{self, FilePart, MultipartError};
use super::record::{generate_id, stored_name_for, ObjectRecord};
use super::storage::FileStorage;
use super::MAX_FILENAME_LENGTH;
use crate::{DepotError, Result};

/// An object opened for streaming.
#[derive(Debug)]
pub struct Download {
    /// Record as of the moment the file was opened.
    pub record: ObjectRecord,
    /// Open handle to the physical bytes.
    pub file: File,
    /// Length of the physical file.
    pub len: u64,
}

/// Index/storage disagreements found by [`FileService::find_orphans`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct OrphanReport {
    /// Files in the storage directory no record points at.
    pub untracked_files: Vec<String>,
    /// Ids of records whose physical file is gone.
    pub missing_objects: Vec<String>,
}

impl OrphanReport {
    /// True if index and storage agree.
    pub fn is_clean(&self) -> bool {
        self.untracked_files.is_empty() && self.missing_objects.is_empty()
    }
}

/// An upload part with its id and names assigned, not yet written.
struct PlannedObject {
    id: String,
    name: String,
    stored_name: String,
    content: Bytes,
}

/// File service for managing stored objects.
pub struct FileService<'a> {
    storage: &'a FileStorage,
    index: &'a ObjectIndex,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(storage: &'a FileStorage, index: &'a ObjectIndex) -> Self {
        Self { storage, index }
    }

    /// Boundary of a `multipart/form-data` content type.
    ///
    /// Cheap enough to run before the request body is read.
    pub fn boundary_for(content_type: Option<&str>) -> Result<String> {
        let content_type = content_type.ok_or(MultipartError::UnsupportedContentType)?;
        Ok(multipart::parse_boundary(content_type)?)
    }

    /// Decode a multipart body and store every file part.
    pub async fn upload_multipart(&self, boundary: &str, body: &Bytes) -> Result<Vec<ObjectRecord>> {
        let parts = multipart::decode(body, boundary)?;
        self.upload(parts).await
    }

    /// Store decoded file parts and index them in one update.
    ///
    /// Either every part ends up indexed or the bytes written for this call
    /// are removed again (best-effort).
    pub async fn upload(&self, parts: Vec<FilePart>) -> Result<Vec<ObjectRecord>> {
        if parts.is_empty() {
            return Err(DepotError::Validation("no file present".to_string()));
        }

        let planned = parts
            .into_iter()
            .map(|part| {
                let name = sanitize_filename(&part.filename)?;
                let id = generate_id();
                Ok(PlannedObject {
                    stored_name: stored_name_for(&id, &name),
                    id,
                    name,
                    content: part.content,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let records = self.write_all(planned).await?;

        if let Err(e) = self.index.append_many(records.clone()).await {
            tracing::error!(error = %e, "failed to index upload, removing stored bytes");
            self.discard(&records).await;
            return Err(e);
        }

        for record in &records {
            tracing::info!(
                id = %record.id,
                original_name = %record.original_name,
                size = record.size,
                "object uploaded"
            );
        }

        Ok(records)
    }

    /// All records in index order.
    pub async fn list(&self) -> Result<Vec<ObjectRecord>> {
        self.index.load_all().await
    }

    /// Resolve an id and open its bytes for streaming.
    pub async fn open_download(&self, id: &str) -> Result<Download> {
        let record = self
            .index
            .get(id)
            .await?
            .ok_or_else(DepotError::object_not_found)?;

        let (file, len) = self.storage.open(&record.path).await.map_err(|e| {
            match &e {
                DepotError::NotFound(_) => {
                    tracing::warn!(id = %record.id, path = %record.path.display(), "indexed object has no bytes");
                }
                _ => tracing::error!(id = %record.id, error = %e, "failed to open object"),
            }
            e
        })?;

        tracing::info!(id = %record.id, original_name = %record.original_name, "object download");
        Ok(Download { record, file, len })
    }

    /// Delete an object: physical bytes first (best-effort), then the record.
    pub async fn delete(&self, id: &str) -> Result<ObjectRecord> {
        let record = self
            .index
            .get(id)
            .await?
            .ok_or_else(DepotError::object_not_found)?;

        match self.storage.delete(&record.path).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(id = %record.id, path = %record.path.display(), "object bytes already gone");
            }
            Err(e) => {
                tracing::warn!(id = %record.id, error = %e, "failed to remove object bytes");
            }
        }

        let removed = self.index.remove_one(id).await?;
        tracing::info!(id = %removed.id, original_name = %removed.original_name, "object deleted");
        Ok(removed)
    }

    /// Change an object's display name. Physical bytes are not touched.
    pub async fn rename(&self, id: &str, new_name: &str) -> Result<ObjectRecord> {
        let new_name = validate_display_name(new_name)?;

        let mut old_name = String::new();
        let updated = self
            .index
            .update_one(id, |record| {
                old_name = std::mem::take(&mut record.original_name);
                record.rename(new_name);
            })
            .await?;

        tracing::info!(id = %updated.id, from = %old_name, to = %updated.original_name, "object renamed");
        Ok(updated)
    }

    /// Compare the storage directory with the index. Reports only.
    pub async fn find_orphans(&self) -> Result<OrphanReport> {
        let records = self.index.load_all().await?;
        let indexed: HashSet<PathBuf> = records.iter().map(|r| r.path.clone()).collect();

        let untracked_files = self
            .storage
            .list_names()
            .await?
            .into_iter()
            .filter(|name| !indexed.contains(&self.storage.get_file_path(name)))
            .collect();

        let mut missing_objects = Vec::new();
        for record in &records {
            if !self.storage.exists(&record.path).await {
                missing_objects.push(record.id.clone());
            }
        }

        Ok(OrphanReport {
            untracked_files,
            missing_objects,
        })
    }

    /// Write every planned object. On the first failure the objects
    /// already written are removed again.
    async fn write_all(&self, planned: Vec<PlannedObject>) -> Result<Vec<ObjectRecord>> {
        let mut records = Vec::with_capacity(planned.len());
        for object in planned {
            match self.storage.save(&object.stored_name, &object.content).await {
                Ok((path, size)) => {
                    records.push(ObjectRecord::new(
                        object.id,
                        object.name,
                        object.stored_name,
                        size,
                        path,
                    ));
                }
                Err(e) => {
                    tracing::error!(error = %e, stored_name = %object.stored_name, "failed to store upload");
                    self.discard(&records).await;
                    return Err(into_storage_error(e));
                }
            }
        }
        Ok(records)
    }

    async fn discard(&self, records: &[ObjectRecord]) {
        for record in records {
            if let Err(e) = self.storage.delete(&record.path).await {
                tracing::warn!(path = %record.path.display(), error = %e, "failed to discard stored bytes");
            }
        }
    }
}

/// Reduce a client supplied filename to a safe single path component.
///
/// Directory parts (either separator) are dropped and control characters
/// removed; what is left must be a non-empty name other than `.`/`..`.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(DepotError::invalid_name());
    }
    if cleaned.len() > MAX_FILENAME_LENGTH {
        return Err(DepotError::Validation("file name too long".to_string()));
    }

    Ok(cleaned.to_string())
}

/// Validate a new display name for rename.
///
/// Only a blank name is refused. The name is stored exactly as sent; it
/// never reaches the filesystem.
fn validate_display_name(name: &str) -> Result<&str> {
    if name.trim().is_empty() {
        return Err(DepotError::invalid_name());
    }
    Ok(name)
}

/// Storage failures during upload surface as storage errors; client
/// mistakes keep their type.
fn into_storage_error(e: DepotError) -> DepotError {
    match e {
        DepotError::Io(io) => DepotError::Storage(format!("failed to write object: {io}")),
        other => other,
    }
}
