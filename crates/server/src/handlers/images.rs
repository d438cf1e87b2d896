//! Image metadata and file handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use darkroom_core::{ImageRecord, ImageStatus, Label, LabelStats};
use serde::{Deserialize, Serialize};

/// Default page size for listings.
const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Default minimum confidence for label search.
const DEFAULT_MIN_CONFIDENCE: f64 = 80.0;

/// Default number of label statistics entries.
const DEFAULT_LABEL_LIMIT: usize = 50;

/// Canonical wire shape of an image. Labels are collapsed to canonical
/// pairs regardless of how they are stored, so consumers only ever see the
/// canonical field names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: String,
    pub name: String,
    pub url: String,
    pub labels: Vec<Label>,
    pub uploaded_at: String,
    pub size: u64,
    pub mime_type: String,
    pub status: ImageStatus,
}

impl From<&ImageRecord> for ImageResponse {
    fn from(record: &ImageRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            url: record.url.clone(),
            labels: record.labels.iter().map(|l| l.to_canonical()).collect(),
            uploaded_at: record.uploaded_at.clone(),
            size: record.size,
            mime_type: record.mime_type.clone(),
            status: record.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub images: Vec<ImageResponse>,
    pub pagination: PaginationMeta,
}

/// GET /v1/images — paginated listing.
pub async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, 100);

    let result = state.metadata.scan_page(page, limit).await?;

    Ok(Json(ListResponse {
        images: result.items.iter().map(ImageResponse::from).collect(),
        pagination: PaginationMeta {
            page,
            limit,
            has_more: result.has_more,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub label: String,
    pub confidence: Option<f64>,
    pub page: Option<u32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHitResponse {
    #[serde(flatten)]
    pub image: ImageResponse,
    pub matching_label: Label,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPagination {
    pub page: u32,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub images: Vec<SearchHitResponse>,
    pub search_criteria: SearchCriteria,
    pub pagination: SearchPagination,
}

/// GET /v1/images/search — label search with confidence filtering.
pub async fn search_images(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    if query.label.is_empty() {
        return Err(ApiError::BadRequest("label must not be empty".to_string()));
    }
    let confidence = query.confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let result = state
        .metadata
        .search_by_label(&query.label, confidence, limit)
        .await?;

    let images = result
        .items
        .iter()
        .map(|hit| SearchHitResponse {
            image: ImageResponse::from(&hit.record),
            matching_label: hit.matched.clone(),
        })
        .collect();

    Ok(Json(SearchResponse {
        images,
        search_criteria: SearchCriteria {
            label: query.label,
            confidence,
        },
        pagination: SearchPagination {
            page: query.page.unwrap_or(1),
            limit,
            total: result.total,
            pages: result.total.div_ceil(limit),
        },
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelsQuery {
    pub limit: Option<usize>,
    pub min_count: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct LabelsResponse {
    pub labels: Vec<LabelStats>,
    /// Distinct labels meeting the minimum count, even when the list is
    /// truncated to `limit`.
    pub total: usize,
}

/// GET /v1/images/labels — label usage statistics.
pub async fn get_all_labels(
    State(state): State<AppState>,
    Query(query): Query<LabelsQuery>,
) -> ApiResult<Json<LabelsResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LABEL_LIMIT).clamp(1, 100);
    let min_count = query.min_count.unwrap_or(1).max(1);

    let aggregation = state.metadata.label_stats(limit, min_count).await?;

    Ok(Json(LabelsResponse {
        labels: aggregation.stats,
        total: aggregation.total_distinct,
    }))
}

/// GET /v1/images/{id} — point lookup.
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ImageResponse>> {
    let record = state
        .metadata
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image with id '{id}' not found")))?;

    Ok(Json(ImageResponse::from(&record)))
}

/// GET /v1/images/{id}/file — stream the binary object.
pub async fn get_image_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let record = state
        .metadata
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image with id '{id}' not found")))?;

    if record.object_key.is_empty() || !state.storage.exists(&record.object_key).await? {
        return Err(ApiError::NotFound(
            "image file not found in storage".to_string(),
        ));
    }

    let download = state.storage.get_stream(&record.object_key).await?;

    let filename = if record.name.is_empty() {
        format!("image-{id}")
    } else {
        record.name.clone()
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.content_type)
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{filename}\""),
        );
    if let Some(length) = download.length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    builder
        .body(Body::from_stream(download.stream))
        .map_err(|e| ApiError::Internal(format!("failed to build file response: {e}")))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ImageStatus,
    /// When present (including empty), replaces the stored label sequence
    /// in the same write as the status change.
    pub labels: Option<Vec<Label>>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// PUT /v1/images/{id}/status — recognition pipeline callback.
pub async fn update_image_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .metadata
        .update_status(&id, request.status, request.labels.as_deref())
        .await?;

    Ok(Json(MessageResponse {
        message: format!("Image {id} status updated to {}", request.status),
    }))
}

/// DELETE /v1/images/{id} — remove the binary object, then the metadata.
///
/// Object-store deletion happens before the metadata delete becomes
/// durable; the two are not atomic, so a crash in between leaves a record
/// whose file is gone, never an orphaned file.
pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let record = state
        .metadata
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image with id '{id}' not found")))?;

    if !record.object_key.is_empty() {
        state.storage.delete(&record.object_key).await?;
    }
    state.metadata.delete(&id).await?;

    tracing::info!(image_id = %id, "image deleted");
    Ok(Json(MessageResponse {
        message: format!("Image {id} deleted successfully"),
    }))
}
