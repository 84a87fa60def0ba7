//! File upload and download endpoints.
//!
//! - POST /api/v1/files - multipart upload (`folder`, `file`)
//! - GET /api/v1/files/url?key= - presigned download URL

use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};

use crate::{
    clients::storage::{self, FileStorage},
    error::AppError,
    middleware::tenant::Tenant,
    models::file::{FileFolder, FileUrlQuery, FileUrlResponse, UploadedFile},
    state::AppState,
};

fn storage(state: &AppState) -> Result<&FileStorage, AppError> {
    state
        .storage
        .as_ref()
        .ok_or(AppError::IntegrationDisabled("S3"))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::InvalidRequest(format!("malformed multipart body: {}", err.body_text()))
}

/// Upload an image or PDF.
///
/// # Request Body
///
/// `multipart/form-data` with a `folder` field (`motorcycles`, `models`,
/// `tickets` or `documents`) followed by a `file` field.
///
/// # Response
///
/// - **201 Created**: the object key to store on the owning entity
/// - **400**: unknown folder, missing file, disallowed type or file too large
/// - **503**: no bucket configured
pub async fn upload(
    State(state): State<AppState>,
    tenant: Tenant,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedFile>), AppError> {
    let storage = storage(&state)?;

    let mut folder = None;
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("folder") => {
                let value = field.text().await.map_err(multipart_error)?;
                folder = Some(FileFolder::parse(&value).ok_or_else(|| {
                    AppError::InvalidRequest(format!("unknown folder '{value}'"))
                })?);
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::InvalidRequest("file name is required".into()))?;
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, bytes));
            }
            _ => {}
        }
    }

    let folder = folder.ok_or_else(|| AppError::InvalidRequest("folder is required".into()))?;
    let (name, bytes) = file.ok_or_else(|| AppError::InvalidRequest("file is required".into()))?;

    if bytes.is_empty() {
        return Err(AppError::InvalidRequest("file is empty".into()));
    }
    if bytes.len() > storage.max_upload_bytes() {
        return Err(AppError::InvalidRequest(format!(
            "file exceeds the {} byte limit",
            storage.max_upload_bytes()
        )));
    }
    let content_type = storage::allowed_content_type(&name)?;

    let key = storage::object_key(tenant.organization_id, folder, &name);
    let size_bytes = bytes.len();
    storage.put(&key, &content_type, bytes.to_vec()).await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        key = %key,
        size_bytes,
        "File uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadedFile {
            key,
            content_type,
            size_bytes,
        }),
    ))
}

/// Presigned GET URL for a key under the caller's organization. Keys of
/// other organizations answer 404.
pub async fn download_url(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<FileUrlQuery>,
) -> Result<Json<FileUrlResponse>, AppError> {
    let storage = storage(&state)?;
    if !storage::key_belongs_to(tenant.organization_id, &query.key) {
        return Err(AppError::NotFound("File"));
    }

    let url = storage.presigned_get(&query.key).await?;
    Ok(Json(FileUrlResponse {
        url,
        expires_in_seconds: storage::PRESIGN_TTL.as_secs(),
    }))
}
