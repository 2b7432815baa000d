//! OpenAPI document for the depot API.

use utoipa::OpenApi;

use super::dto::{DeleteResponse, DeletedObject, ListResponse, RenameRequest, RenameResponse, UploadResponse};
use super::handlers;
use crate::file::ObjectRecord;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "depot",
        description = "Self-hosted file storage: upload, list, download, rename and delete"
    ),
    paths(
        handlers::file::list_files,
        handlers::file::upload_files,
        handlers::file::download_file,
        handlers::file::delete_file,
        handlers::file::rename_file,
    ),
    components(schemas(
        ObjectRecord,
        UploadResponse,
        ListResponse,
        DeletedObject,
        DeleteResponse,
        RenameRequest,
        RenameResponse,
    )),
    tags(
        (name = "files", description = "Stored objects"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_file_routes() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/files"));
        assert!(doc.paths.paths.contains_key("/api/files/{id}"));

        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("ObjectRecord"));
        assert!(schemas.contains_key("RenameRequest"));
    }
}
