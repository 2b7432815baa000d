//! File handlers for the depot API.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::Response,
    Json,
};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use crate::file::{FileService, DOWNLOAD_CHUNK_SIZE};
use crate::web::dto::{DeleteResponse, ListResponse, RenameRequest, RenameResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::DepotError;

/// Generate the Content-Disposition header value for a download.
///
/// Both the plain and the RFC 5987 parameter carry the percent-encoded
/// name, so control characters and quotes never reach the header.
fn content_disposition_header(filename: &str) -> String {
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        encoded, encoded
    )
}

/// Stream `reader` as a response body in bounded chunks.
///
/// A read error after the response has started is logged and ends the body.
fn download_body<R>(reader: R, id: String) -> Body
where
    R: AsyncRead + Send + 'static,
{
    let stream = ReaderStream::with_capacity(reader, DOWNLOAD_CHUNK_SIZE).inspect_err(move |e| {
        tracing::error!(id = %id, error = %e, "download stream aborted");
    });
    Body::from_stream(stream)
}

/// Read the whole upload body, enforcing the size limit.
async fn read_upload_body(headers: &HeaderMap, body: Body, limit: u64) -> Result<Bytes, ApiError> {
    let too_large = || ApiError::from(DepotError::PayloadTooLarge(limit));

    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(too_large());
    }

    let limit_usize = usize::try_from(limit).unwrap_or(usize::MAX);
    axum::body::to_bytes(body, limit_usize).await.map_err(|e| {
        let inner = e.into_inner();
        if inner
            .downcast_ref::<http_body_util::LengthLimitError>()
            .is_some()
        {
            too_large()
        } else {
            tracing::warn!("Failed to read upload body: {}", inner);
            ApiError::bad_request("failed to read request body")
        }
    })
}

/// GET /api/files - List all stored objects.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "All records in index order", body = ListResponse),
        (status = 500, description = "Index could not be read", body = String, content_type = "text/plain")
    )
)]
pub async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<ListResponse>, ApiError> {
    let files = state.file_service().list().await?;
    Ok(Json(ListResponse::new(files)))
}

/// POST /api/files - Upload one or more files as multipart/form-data.
#[utoipa::path(
    post,
    path = "/api/files",
    tag = "files",
    request_body(content = String, content_type = "multipart/form-data", description = "One or more file parts"),
    responses(
        (status = 200, description = "Files uploaded", body = UploadResponse),
        (status = 400, description = "Malformed multipart body, no file part or invalid name", body = String, content_type = "text/plain"),
        (status = 413, description = "Upload too large", body = String, content_type = "text/plain"),
        (status = 500, description = "Storage error", body = String, content_type = "text/plain")
    )
)]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadResponse>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let boundary = FileService::boundary_for(content_type)?;

    let body = read_upload_body(&headers, body, state.max_upload_size).await?;

    let files = state
        .file_service()
        .upload_multipart(&boundary, &body)
        .await?;

    Ok(Json(UploadResponse::new(files)))
}

/// GET /api/files/:id - Download an object's bytes.
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Object ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "Object not found or no longer available", body = String, content_type = "text/plain"),
        (status = 500, description = "Storage error", body = String, content_type = "text/plain")
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.file_service().open_download(&id).await?;
    let record = download.record;

    let content_type = HeaderValue::from_str(&record.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static(crate::file::DEFAULT_MIME_TYPE));

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&record.original_name),
        )
        .header(header::CONTENT_LENGTH, download.len)
        .body(download_body(download.file, record.id.clone()))
        .map_err(|e| {
            tracing::error!("Failed to build download response: {}", e);
            ApiError::internal(format!("storage error: {e}"))
        })
}

/// DELETE /api/files/:id - Delete an object.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Object ID")
    ),
    responses(
        (status = 200, description = "Object deleted", body = DeleteResponse),
        (status = 404, description = "Object not found", body = String, content_type = "text/plain"),
        (status = 500, description = "Storage error", body = String, content_type = "text/plain")
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let removed = state.file_service().delete(&id).await?;
    Ok(Json(DeleteResponse::new(removed)))
}

/// PUT /api/files/:id - Rename an object.
#[utoipa::path(
    put,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Object ID")
    ),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Object renamed", body = RenameResponse),
        (status = 400, description = "Invalid JSON body or invalid name", body = String, content_type = "text/plain"),
        (status = 404, description = "Object not found", body = String, content_type = "text/plain"),
        (status = 500, description = "Storage error", body = String, content_type = "text/plain")
    )
)]
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<RenameResponse>, ApiError> {
    let req: RenameRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejected rename body: {}", e);
        ApiError::bad_request("invalid JSON body")
    })?;

    let new_name = req.new_name().ok_or_else(DepotError::invalid_name)?;
    let updated = state.file_service().rename(&id, new_name).await?;

    Ok(Json(RenameResponse::new(updated)))
}
