//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::file::ObjectRecord;

/// Upload result.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Newly created records, in request order.
    pub files: Vec<ObjectRecord>,
}

impl UploadResponse {
    /// Wrap newly uploaded records.
    pub fn new(files: Vec<ObjectRecord>) -> Self {
        Self {
            success: true,
            message: format!("{} file(s) uploaded", files.len()),
            files,
        }
    }
}

/// Listing of every stored object.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    /// Always `true`.
    pub success: bool,
    /// All records in index order.
    pub files: Vec<ObjectRecord>,
    /// Number of records.
    pub total: usize,
}

impl ListResponse {
    /// Wrap the full catalog.
    pub fn new(files: Vec<ObjectRecord>) -> Self {
        Self {
            success: true,
            total: files.len(),
            files,
        }
    }
}

/// Minimal description of a deleted object.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedObject {
    /// Object ID.
    pub id: String,
    /// Display name at deletion time.
    pub original_name: String,
}

/// Delete result.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// The removed object.
    pub file: DeletedObject,
}

impl DeleteResponse {
    /// Describe a removed record.
    pub fn new(record: ObjectRecord) -> Self {
        Self {
            success: true,
            message: "file deleted".to_string(),
            file: DeletedObject {
                id: record.id,
                original_name: record.original_name,
            },
        }
    }
}

/// Rename result.
#[derive(Debug, Serialize, ToSchema)]
pub struct RenameResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// The updated record.
    pub file: ObjectRecord,
}

impl RenameResponse {
    /// Wrap an updated record.
    pub fn new(file: ObjectRecord) -> Self {
        Self {
            success: true,
            message: "file renamed".to_string(),
            file,
        }
    }
}
