//! Physical byte store for depot.
//!
//! One flat directory, one file per object:
//! ```text
//! {base_path}/
//! ├── 3f2a...9c_report.pdf
//! └── 81be...07_logo.png
//! ```
//! The directory knows nothing about records; the index decides what exists.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::{DepotError, Result};

/// File storage rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Absolute base directory.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The directory is created if missing and the path made absolute.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        let base_path = fs::canonicalize(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Full path for a stored name.
    pub fn get_file_path(&self, stored_name: &str) -> PathBuf {
        self.base_path.join(stored_name)
    }

    /// Write `content` under `stored_name`.
    ///
    /// Never overwrites an existing file. Returns the absolute path and the
    /// size reported by the filesystem after the write.
    pub async fn save(&self, stored_name: &str, content: &[u8]) -> Result<(PathBuf, u64)> {
        if !is_plain_file_name(stored_name) {
            return Err(DepotError::invalid_name());
        }

        // The directory may have been removed since startup.
        tokio::fs::create_dir_all(&self.base_path).await?;

        let path = self.get_file_path(stored_name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(content).await?;
        file.sync_all().await?;

        let size = file.metadata().await?.len();
        tracing::debug!(path = %path.display(), size, "stored object bytes");

        Ok((path, size))
    }

    /// Open a stored file for streaming.
    ///
    /// Returns the handle and its current length. A missing file is reported
    /// as an unavailable object.
    pub async fn open(&self, path: &Path) -> Result<(File, u64)> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DepotError::object_unavailable())
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub async fn delete(&self, path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a file exists.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Names of all regular files in the storage directory.
    pub async fn list_names(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        Ok(names)
    }
}

/// True if `name` is a single normal path component.
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
