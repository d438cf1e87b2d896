//! Raw record normalization.
//!
//! Stored items are written by two producers with different field naming:
//! the API writes `name`/`s3Key`/`size`/`uploadedAt`/`status`/`labels`,
//! the recognition pipeline writes `FileName`/`S3Key`/`FileSize`/
//! `ProcessedAt`/`Status`/`Labels`. Every canonical field resolves through
//! an explicit fallback chain, so a new producer dialect is added by
//! extending a chain rather than by branching logic.

use crate::kv::RawItem;
use darkroom_core::{Dimensions, ImageRecord, ImageStatus, LabelValue};
use serde_json::Value;

const NAME_FIELDS: &[&str] = &["name", "FileName"];
const URL_FIELDS: &[&str] = &["url"];
const OBJECT_KEY_FIELDS: &[&str] = &["s3Key", "objectKey", "S3Key"];
const SIZE_FIELDS: &[&str] = &["size", "FileSize"];
const MIME_FIELDS: &[&str] = &["mimeType"];
const UPLOADED_AT_FIELDS: &[&str] = &["uploadedAt", "ProcessedAt"];
const STATUS_FIELDS: &[&str] = &["status", "Status"];
const LABEL_FIELDS: &[&str] = &["labels", "Labels"];

/// Convert one raw stored item into the canonical record.
///
/// Never fails: a per-field conversion failure takes that field's
/// documented default, and an item whose label values are neither known
/// shape degrades to a placeholder record marked `error`, so one bad item
/// cannot abort a batch operation.
pub fn normalize(item: &RawItem) -> ImageRecord {
    match try_normalize(item) {
        Ok(record) => record,
        Err(fault) => {
            tracing::error!(
                image_id = %item_id(item),
                error = %fault,
                "failed to process stored item, substituting placeholder"
            );
            placeholder(item)
        }
    }
}

fn try_normalize(item: &RawItem) -> Result<ImageRecord, String> {
    let status = first_string(item, STATUS_FIELDS)
        .map(|s| ImageStatus::parse_or_default(&s))
        .unwrap_or_default();

    Ok(ImageRecord {
        id: first_string(item, &["ImageId"]).unwrap_or_default(),
        created_at: first_string(item, &["CreatedAt"]).unwrap_or_default(),
        name: first_string(item, NAME_FIELDS).unwrap_or_default(),
        url: first_string(item, URL_FIELDS).unwrap_or_default(),
        object_key: first_string(item, OBJECT_KEY_FIELDS).unwrap_or_default(),
        size: resolve_size(item),
        mime_type: first_string(item, MIME_FIELDS).unwrap_or_default(),
        uploaded_at: first_string(item, UPLOADED_AT_FIELDS).unwrap_or_default(),
        status,
        labels: resolve_labels(item)?,
        dimensions: resolve_dimensions(item),
    })
}

/// Placeholder for an item that could not be processed. Keeps the original
/// id when one is present so the caller can still correlate it.
fn placeholder(item: &RawItem) -> ImageRecord {
    let mut record = ImageRecord::empty(item_id(item));
    record.created_at = first_string(item, &["CreatedAt"]).unwrap_or_default();
    record.name = "Error processing item".to_string();
    record.status = ImageStatus::Error;
    record
}

fn item_id(item: &RawItem) -> String {
    first_string(item, &["ImageId"]).unwrap_or_else(|| "unknown".to_string())
}

/// First field in the chain that is present as a string.
fn first_string(item: &RawItem, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| item.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

/// Size resolution: a numeric `size` wins, then a numeric `FileSize`, then
/// an integer parse of whichever of the two is present as a string. Parse
/// failures, absence, and negative values all yield zero.
fn resolve_size(item: &RawItem) -> u64 {
    for field in SIZE_FIELDS {
        if let Some(n) = item.get(*field).and_then(Value::as_i64) {
            return u64::try_from(n).unwrap_or(0);
        }
        if let Some(f) = item.get(*field).and_then(Value::as_f64) {
            return if f >= 0.0 { f as u64 } else { 0 };
        }
    }
    for field in SIZE_FIELDS {
        if let Some(s) = item.get(*field).and_then(Value::as_str) {
            return s
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0);
        }
    }
    0
}

/// Labels stay in whichever shape they arrived; only the accessors read
/// through the duality at query time. An element that is neither shape is
/// the one genuinely unrecoverable fault in an item.
fn resolve_labels(item: &RawItem) -> Result<Vec<LabelValue>, String> {
    for field in LABEL_FIELDS {
        if let Some(Value::Array(elements)) = item.get(*field) {
            let mut labels = Vec::with_capacity(elements.len());
            for element in elements {
                let label = serde_json::from_value::<LabelValue>(element.clone())
                    .map_err(|e| format!("label in `{field}` has an unknown shape: {e}"))?;
                labels.push(label);
            }
            return Ok(labels);
        }
    }
    Ok(Vec::new())
}

fn resolve_dimensions(item: &RawItem) -> Option<Dimensions> {
    item.get("dimensions")
        .and_then(|value| serde_json::from_value::<Dimensions>(value.clone()).ok())
}
