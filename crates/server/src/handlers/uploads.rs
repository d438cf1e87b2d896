//! Image upload handler.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use bytes::Bytes;
use darkroom_core::{ImageRecord, upload};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Upload acknowledgment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_id: String,
    pub image_url: String,
    pub uploaded_at: String,
    pub message: String,
}

struct UploadedFile {
    filename: String,
    content_type: String,
    data: Bytes,
}

/// POST /v1/images — multipart upload (`file` part, optional
/// `description`).
///
/// Validation runs before either store is touched. The object lands in
/// storage first; the initial metadata record (`status=uploading`, empty
/// labels) follows, and the recognition pipeline mutates it from there.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let mut file: Option<UploadedFile> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        // The field name borrow must end before `bytes()` consumes the field.
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read file: {e}")))?;
                file = Some(UploadedFile {
                    filename,
                    content_type,
                    data,
                });
            }
            "description" => {
                description = field.text().await.ok();
            }
            _ => {}
        }
    }

    let file = file.ok_or(darkroom_core::Error::MissingFile)?;
    upload::validate_upload(&file.content_type, file.data.len())?;

    let image_id = upload::new_image_id();
    let key = upload::object_key(&image_id, &file.filename);

    tracing::info!(
        image_id = %image_id,
        filename = %file.filename,
        size = file.data.len(),
        "processing image upload"
    );

    let stored = state
        .storage
        .put(&key, file.data.clone(), &file.content_type)
        .await?;

    let uploaded_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    let mut record = ImageRecord::empty(&image_id);
    record.name = file.filename;
    record.url = stored.url.clone();
    record.object_key = stored.key;
    record.size = file.data.len() as u64;
    record.mime_type = file.content_type;
    record.uploaded_at = uploaded_at.clone();

    if let Some(description) = description {
        tracing::debug!(image_id = %image_id, description = %description, "upload description received");
    }

    state.metadata.put(&record).await?;

    tracing::info!(image_id = %image_id, "image uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            image_id,
            image_url: stored.url,
            uploaded_at,
            message: "Image uploaded successfully. Recognition process started.".to_string(),
        }),
    ))
}
