//! Object metadata records.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Fallback content type for unknown extensions.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Extension table consulted before falling back to `mime_guess`.
const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("zip", "application/zip"),
];

/// Metadata for one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    /// Opaque object id (32 hex chars).
    pub id: String,
    /// Display name. Changed by rename.
    pub original_name: String,
    /// Physical file name, `<id>_<name at upload time>`.
    pub stored_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type derived from the display name.
    pub mime_type: String,
    /// When the object was uploaded.
    pub upload_time: DateTime<Utc>,
    /// Absolute path of the physical file.
    #[schema(value_type = String)]
    pub path: PathBuf,
}

impl ObjectRecord {
    /// Build a record for freshly written bytes.
    pub fn new(
        id: impl Into<String>,
        original_name: impl Into<String>,
        stored_name: impl Into<String>,
        size: u64,
        path: impl Into<PathBuf>,
    ) -> Self {
        let original_name = original_name.into();
        Self {
            id: id.into(),
            mime_type: mime_type_for(&original_name),
            original_name,
            stored_name: stored_name.into(),
            size,
            upload_time: Utc::now(),
            path: path.into(),
        }
    }

    /// Change the display name and recompute the content type.
    ///
    /// `stored_name` and `path` are never touched.
    pub fn rename(&mut self, new_name: impl Into<String>) {
        self.original_name = new_name.into();
        self.mime_type = mime_type_for(&self.original_name);
    }
}

/// Generate a fresh object id.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Physical file name for an object.
pub fn stored_name_for(id: &str, original_name: &str) -> String {
    format!("{id}_{original_name}")
}

/// Content type for a file name, by extension (case-insensitive).
pub fn mime_type_for(filename: &str) -> String {
    let Some(ext) = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
    else {
        return DEFAULT_MIME_TYPE.to_string();
    };

    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| (*mime).to_string())
        .unwrap_or_else(|| {
            mime_guess::from_ext(&ext)
                .first_or_octet_stream()
                .to_string()
        })
}
