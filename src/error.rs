//! Error types for depot.

use thiserror::Error;

use crate::file::MultipartError;

/// Common error type for depot.
#[derive(Error, Debug)]
pub enum DepotError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index document could not be encoded or decoded.
    #[error("index serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage error (disk write/read/persist failure).
    #[error("storage error: {0}")]
    Storage(String),

    /// Validation error for client input.
    ///
    /// The message is returned to the client verbatim.
    #[error("{0}")]
    Validation(String),

    /// Request body exceeded the configured upload limit.
    #[error("upload too large (max {0} bytes)")]
    PayloadTooLarge(u64),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DepotError {
    /// Unknown object id.
    pub fn object_not_found() -> Self {
        DepotError::NotFound("object not found".to_string())
    }

    /// Record present, physical bytes missing.
    pub fn object_unavailable() -> Self {
        DepotError::NotFound("object no longer available".to_string())
    }

    /// Blank or otherwise unusable display name.
    pub fn invalid_name() -> Self {
        DepotError::Validation("invalid name".to_string())
    }
}

impl From<MultipartError> for DepotError {
    fn from(e: MultipartError) -> Self {
        DepotError::Validation(e.to_string())
    }
}

/// Result type alias for depot operations.
pub type Result<T> = std::result::Result<T, DepotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_is_verbatim() {
        let err = DepotError::Validation("no file present".to_string());
        assert_eq!(err.to_string(), "no file present");
    }

    #[test]
    fn test_not_found_constructors() {
        assert_eq!(
            DepotError::object_not_found().to_string(),
            "object not found"
        );
        assert_eq!(
            DepotError::object_unavailable().to_string(),
            "object no longer available"
        );
    }

    #[test]
    fn test_storage_error_display() {
        let err = DepotError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only fs");
        let err: DepotError = io_err.into();
        assert!(matches!(err, DepotError::Io(_)));
        assert!(err.to_string().contains("read-only fs"));
    }

    #[test]
    fn test_multipart_error_is_validation() {
        let err: DepotError = MultipartError::MissingBoundary.into();
        assert!(matches!(err, DepotError::Validation(_)));
    }

    #[test]
    fn test_payload_too_large_display() {
        let err = DepotError::PayloadTooLarge(1024);
        assert_eq!(err.to_string(), "upload too large (max 1024 bytes)");
    }
}
