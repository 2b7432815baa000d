//! Object storage for depot.
//!
//! - `multipart`: decodes uploaded request bodies into file parts
//! - `record`: object metadata and content type lookup
//! - `index`: the persisted JSON catalog of records
//! - `storage`: the directory holding the physical bytes
//! - `service`: upload/list/download/rename/delete over both

pub mod multipart;
mod index;
mod record;
mod service;
mod storage;

pub use index::ObjectIndex;
pub use multipart::{FilePart, MultipartError};
pub use record::{generate_id, mime_type_for, stored_name_for, ObjectRecord, DEFAULT_MIME_TYPE};
pub use service::{sanitize_filename, Download, FileService, OrphanReport};
pub use storage::FileStorage;

/// Maximum length for an uploaded file name, in bytes.
pub const MAX_FILENAME_LENGTH: usize = 200;

/// Chunk size for streamed downloads.
pub const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;
