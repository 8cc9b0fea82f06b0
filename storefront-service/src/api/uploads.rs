use anyhow::anyhow;
use axum::{
    body::Bytes,
    extract::{multipart::Field, Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AppState;
use crate::error::{ApiError, ApiResult};
use crate::images::{check_image, check_upload, transcode_to_webp, UploadRejection};
use crate::storage::generate_image_key;
use crate::video::{sanitize_display_name, UploadedVideo, ALLOWED_VIDEO_TYPES, MAX_VIDEO_BYTES};

impl From<UploadRejection> for ApiError {
    fn from(rejection: UploadRejection) -> Self {
        ApiError::Validation(rejection.to_string())
    }
}

struct IncomingFile {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

impl IncomingFile {
    async fn read(field: Field<'_>) -> ApiResult<Self> {
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload {}: {}", file_name, e)))?;
        Ok(Self { file_name, content_type, data })
    }
}

#[derive(Debug, Serialize)]
pub struct UploadedImages {
    pub urls: Vec<String>,
}

struct ImageBatch {
    files: Vec<IncomingFile>,
    folder: Option<String>,
}

/// Reads every part of an image upload and checks each file, so a batch is
/// either accepted whole or refused before anything is transcoded.
async fn read_image_batch(mut multipart: Multipart) -> ApiResult<ImageBatch> {
    let mut files = Vec::new();
    let mut folder: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") | Some("files") => files.push(IncomingFile::read(field).await?),
            Some("folder") => {
                folder = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(format!("Malformed folder field: {}", e)))?,
                )
            }
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(UploadRejection::Missing.into());
    }
    for file in &files {
        check_image(&file.file_name, file.content_type.as_deref(), file.data.len())?;
    }
    Ok(ImageBatch { files, folder })
}

/// Accepts one or more images under `file`/`files`.
pub async fn upload_images(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<UploadedImages>> {
    let ImageBatch { files, folder } = read_image_batch(multipart).await?;

    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        let IncomingFile { file_name, data, .. } = file;
        let webp = tokio::task::spawn_blocking(move || transcode_to_webp(&data))
            .await
            .map_err(|e| anyhow!("Image worker failed: {}", e))?
            .map_err(|e| {
                warn!("Could not transcode {}: {:#}", file_name, e);
                ApiError::validation(format!("Could not process image {}", file_name))
            })?;

        let key = generate_image_key(folder.as_deref());
        let url = state.storage.put(&key, &webp, "image/webp").await?;
        info!("Uploaded image {} ({} bytes as WebP)", key, webp.len());
        urls.push(url);
    }

    Ok(Json(UploadedImages { urls }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageRequest {
    pub url: String,
}

pub async fn delete_image(
    State(state): State<AppState>,
    Json(request): Json<DeleteImageRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let key = state
        .storage
        .key_from_url(&request.url)
        .ok_or_else(|| ApiError::validation("URL does not belong to this storage bucket"))?;

    state.storage.delete(&key).await?;
    Ok(Json(serde_json::json!({ "deleted": key })))
}

async fn read_video(mut multipart: Multipart) -> ApiResult<IncomingFile> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed upload: {}", e)))?
    {
        if field.name() == Some("file") {
            file = Some(IncomingFile::read(field).await?);
            break;
        }
    }

    let file = file.ok_or(UploadRejection::Missing)?;
    check_upload(
        &file.file_name,
        file.content_type.as_deref(),
        file.data.len(),
        ALLOWED_VIDEO_TYPES,
        MAX_VIDEO_BYTES,
    )?;
    Ok(file)
}

pub async fn upload_video(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<UploadedVideo>> {
    let file = read_video(multipart).await?;

    let display_name = sanitize_display_name(&file.file_name);
    let content_type = file.content_type.as_deref().unwrap_or("video/mp4");
    let video = state.stream.upload(file.data.to_vec(), &display_name, content_type).await?;

    Ok(Json(video))
}

#[derive(Debug, Deserialize)]
pub struct DeleteVideoRequest {
    pub uid: String,
}

pub async fn delete_video(
    State(state): State<AppState>,
    Json(request): Json<DeleteVideoRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let uid = request.uid.trim();
    if uid.is_empty() || !uid.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::validation("A valid video uid is required"));
    }

    state.stream.delete(uid).await?;
    Ok(Json(serde_json::json!({ "deleted": uid })))
}
