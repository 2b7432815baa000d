//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::ToSchema;

/// Rename request body, `{ "newName": "..." }`.
///
/// `newName` is kept as raw JSON so a missing or non-string value can be
/// reported as an invalid name rather than a body rejection.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    /// New display name.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub new_name: Option<serde_json::Value>,
}

impl RenameRequest {
    /// The new name, if present and a string.
    pub fn new_name(&self) -> Option<&str> {
        self.new_name.as_ref().and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_request_string() {
        let req: RenameRequest = serde_json::from_str(r#"{"newName": "b.png"}"#).unwrap();
        assert_eq!(req.new_name(), Some("b.png"));
    }

    #[test]
    fn test_rename_request_missing_or_wrong_type() {
        let req: RenameRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.new_name(), None);

        let req: RenameRequest = serde_json::from_str(r#"{"newName": 42}"#).unwrap();
        assert_eq!(req.new_name(), None);
    }
}
