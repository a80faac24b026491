//! Handlers for the `/files` resource (object-storage upload and delete).

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use storefront_core::storage::{
    image_content_type, validate_file_size, validate_image_extension, StoredObject, UploadRequest,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum number of files accepted in one upload request.
pub const MAX_FILES_PER_UPLOAD: usize = 10;

/// One entry of the `PATCH /files/delete` body.
#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub destination: String,
}

/// A received multipart file, before it is given a stored name.
struct ReceivedFile {
    original_name: String,
    ext: String,
    bytes: Vec<u8>,
}

/// POST /api/v1/files/upload
///
/// Multipart form with one `destination` text field and one or more `files`
/// fields. Every file is stored as `<destination>/<uuid>.<ext>`.
pub async fn upload(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<StoredObject>>>)> {
    let limit = state.config.file_limit_bytes;
    let mut destination: Option<String> = None;
    let mut received: Vec<ReceivedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("destination") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                destination = Some(value.trim().trim_matches('/').to_string());
            }
            Some("files") => {
                if received.len() == MAX_FILES_PER_UPLOAD {
                    return Err(AppError::BadRequest(format!(
                        "At most {MAX_FILES_PER_UPLOAD} files may be uploaded at once"
                    )));
                }
                let original_name = field.file_name().unwrap_or_default().to_string();
                let ext = validate_image_extension(&original_name)?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                validate_file_size(bytes.len(), limit)?;
                received.push(ReceivedFile {
                    original_name,
                    ext,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let destination = destination
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::BadRequest("destination is required".to_string()))?;
    if received.is_empty() {
        return Err(AppError::BadRequest(
            "No files received in multipart upload".to_string(),
        ));
    }

    let requests: Vec<UploadRequest> = received
        .into_iter()
        .map(|file| {
            let file_name = format!("{}.{}", Uuid::new_v4(), file.ext);
            tracing::debug!(original = %file.original_name, stored = %file_name, "Queued upload");
            UploadRequest {
                destination: format!("{destination}/{file_name}"),
                content_type: image_content_type(&file.ext).to_string(),
                file_name,
                bytes: file.bytes,
            }
        })
        .collect();

    let stored = state.storage.upload(requests).await?;
    tracing::info!(count = stored.len(), %destination, "Files uploaded");
    Ok((StatusCode::CREATED, Json(DataResponse::new(stored))))
}

/// PATCH /api/v1/files/delete
///
/// Body: `[{ "destination": "images/products/<file>" }, ...]`.
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<Vec<DeleteFileRequest>>,
) -> AppResult<StatusCode> {
    if input.is_empty() {
        return Err(AppError::BadRequest("No files to delete".to_string()));
    }
    let destinations: Vec<String> = input.into_iter().map(|f| f.destination).collect();
    let count = destinations.len();
    state.storage.delete(destinations).await?;
    tracing::info!(count, "Files deleted");
    Ok(StatusCode::NO_CONTENT)
}
