//! The metadata store facade.
//!
//! Composes the normalizer, page walker, search engine, and aggregator
//! over a [`KeyValueStore`] backend, and translates backend faults into
//! per-operation [`MetadataError`] kinds. No operation retries internally;
//! operations either fully succeed or surface one error.

use crate::error::{MetadataError, MetadataResult};
use crate::kv::{
    ATTR_CREATED_AT, ATTR_IMAGE_ID, ContinuationToken, ItemKey, KeyValueStore, RawItem,
    ScanFilter, ScanInput,
};
use crate::normalize::normalize;
use crate::scan::{PageWalk, WalkStep};
use crate::search::{LabelMatch, dedup_by_identity, filter_matches};
use crate::stats::{LabelAggregation, aggregate};
use darkroom_core::{
    ImageRecord, ImageStatus, Label, LabelValue, METADATA_SENTINEL, SEARCHABLE_STATUSES,
};
use serde_json::Value;
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Attribute backing the exact-match label index.
pub const LABEL_VALUE_ATTR: &str = "LabelValue";

/// Items examined per best-effort search scan call.
const SEARCH_SCAN_LIMIT: u32 = 100;

/// Items examined per aggregation scan call.
const STATS_SCAN_LIMIT: u32 = 100;

/// Maximum page size exposed to callers.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// One page of results from a facade operation.
///
/// `total` is the count of items in this result, not a global count; the
/// underlying store offers no total-count primitive short of a full scan.
#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_more: bool,
}

/// Public contract over image metadata records.
pub struct ImageMetadataStore {
    kv: Arc<dyn KeyValueStore>,
    /// Name of the exact-match label index, or `None` to skip the search
    /// fast path entirely.
    label_index: Option<String>,
}

impl ImageMetadataStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, label_index: Option<String>) -> Self {
        Self { kv, label_index }
    }

    /// Write a metadata record, overwriting any record with the same id.
    ///
    /// Defaults are applied for omitted values: the sort key is pinned to
    /// the metadata sentinel and `uploadedAt` is stamped with the current
    /// instant when empty.
    pub async fn put(&self, record: &ImageRecord) -> MetadataResult<()> {
        let item = to_item(record);
        tracing::debug!(image_id = %record.id, "storing image metadata");
        self.kv
            .put_item(item)
            .await
            .map_err(|e| MetadataError::PutFailed {
                id: record.id.clone(),
                message: e.to_string(),
            })
    }

    /// Point lookup by id. Absence is a normal outcome.
    pub async fn get(&self, id: &str) -> MetadataResult<Option<ImageRecord>> {
        let item = self
            .kv
            .get_item(&ItemKey::metadata(id))
            .await
            .map_err(|e| MetadataError::GetFailed {
                id: id.to_string(),
                message: e.to_string(),
            })?;
        Ok(item.as_ref().map(normalize))
    }

    /// Produce page `page` (1-indexed) of size `limit` from a bulk scan.
    ///
    /// The walk requests batches sequentially from the start of the key
    /// space, because the store's ordering is only stable along its own
    /// continuation tokens. A fault at any step aborts the whole page;
    /// partial pages are never returned.
    pub async fn scan_page(&self, page: u32, limit: u32) -> MetadataResult<Page<ImageRecord>> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        tracing::debug!(page, limit, "scanning image page");

        let mut walk = PageWalk::new(page);
        loop {
            let input = ScanInput {
                filter: Some(ScanFilter::equals(ATTR_CREATED_AT, METADATA_SENTINEL)),
                projection: None,
                limit,
                start: walk.token().cloned(),
            };
            let output = self
                .kv
                .scan(input)
                .await
                .map_err(|e| MetadataError::ScanFailed {
                    message: e.to_string(),
                })?;

            match walk.advance(output.items, output.next_token) {
                WalkStep::Continue(next) => walk = next,
                WalkStep::Done { items, has_more } => {
                    let records: Vec<ImageRecord> = items.iter().map(normalize).collect();
                    let total = records.len();
                    tracing::debug!(page, count = total, has_more, "image page complete");
                    return Ok(Page {
                        items: records,
                        total,
                        has_more,
                    });
                }
            }
        }
    }

    /// Find images carrying a label whose name matches case-insensitively
    /// with at least the given confidence.
    ///
    /// Two candidate sets are unioned: an exact-match index lookup (the
    /// index typically names only an image's dominant label) and a
    /// best-effort bounded scan over searchable-status records. Dedup is
    /// order-stable by image identity, index hits first.
    pub async fn search_by_label(
        &self,
        label: &str,
        min_confidence: f64,
        limit: usize,
    ) -> MetadataResult<Page<LabelMatch>> {
        tracing::debug!(label = %label, min_confidence, "searching images by label");

        let mut candidates: Vec<ImageRecord> = Vec::new();

        if let Some(index) = &self.label_index {
            let indexed = self
                .kv
                .query_index(index, LABEL_VALUE_ATTR, label, limit.max(1) as u32)
                .await
                .map_err(|e| MetadataError::QueryFailed {
                    message: e.to_string(),
                })?;
            candidates.extend(indexed.iter().map(normalize));
        }

        let scanned = self
            .kv
            .scan(ScanInput {
                filter: Some(ScanFilter::any_of("status", SEARCHABLE_STATUSES)),
                projection: None,
                limit: SEARCH_SCAN_LIMIT,
                start: None,
            })
            .await
            .map_err(|e| MetadataError::QueryFailed {
                message: e.to_string(),
            })?;
        candidates.extend(scanned.items.iter().map(normalize));

        let mut matches = filter_matches(dedup_by_identity(candidates), label, min_confidence);
        let total = matches.len();
        let has_more = total > limit;
        matches.truncate(limit);

        tracing::debug!(label = %label, count = matches.len(), has_more, "label search complete");
        Ok(Page {
            items: matches,
            total,
            has_more,
        })
    }

    /// Aggregate label statistics over all searchable-status records.
    ///
    /// Scans the full key space batch by batch, projecting only the label
    /// attributes. Records created or deleted mid-walk may or may not be
    /// counted; aggregates are eventual, not point-in-time.
    pub async fn label_stats(
        &self,
        limit: usize,
        min_count: u64,
    ) -> MetadataResult<LabelAggregation> {
        tracing::debug!(limit, min_count, "aggregating label statistics");

        let mut labels: Vec<LabelValue> = Vec::new();
        let mut start: Option<ContinuationToken> = None;
        loop {
            let output = self
                .kv
                .scan(ScanInput {
                    filter: Some(ScanFilter::any_of("status", SEARCHABLE_STATUSES)),
                    projection: Some("labels, Labels".to_string()),
                    limit: STATS_SCAN_LIMIT,
                    start,
                })
                .await
                .map_err(|e| MetadataError::ScanFailed {
                    message: e.to_string(),
                })?;

            for item in &output.items {
                labels.extend(normalize(item).labels);
            }

            match output.next_token {
                Some(token) => start = Some(token),
                None => break,
            }
        }

        let aggregation = aggregate(labels.iter(), limit, min_count);
        tracing::debug!(
            distinct = aggregation.total_distinct,
            returned = aggregation.stats.len(),
            "label aggregation complete"
        );
        Ok(aggregation)
    }

    /// Partial update: set the status, and when `labels` is provided
    /// (including explicitly empty) replace the stored sequence in the
    /// same write.
    pub async fn update_status(
        &self,
        id: &str,
        status: ImageStatus,
        labels: Option<&[Label]>,
    ) -> MetadataResult<()> {
        tracing::debug!(image_id = %id, status = %status, "updating image status");

        let mut assignments = vec![("status".to_string(), Value::from(status.as_str()))];
        if let Some(labels) = labels {
            let value = serde_json::to_value(labels).unwrap_or(Value::Array(Vec::new()));
            assignments.push(("labels".to_string(), value));
        }

        self.kv
            .update_item(&ItemKey::metadata(id), &assignments)
            .await
            .map_err(|e| MetadataError::UpdateFailed {
                id: id.to_string(),
                message: e.to_string(),
            })
    }

    /// Delete the metadata record for an id. Deleting a nonexistent id is
    /// not an error.
    pub async fn delete(&self, id: &str) -> MetadataResult<()> {
        tracing::debug!(image_id = %id, "deleting image metadata");
        self.kv
            .delete_item(&ItemKey::metadata(id))
            .await
            .map_err(|e| MetadataError::DeleteFailed {
                id: id.to_string(),
                message: e.to_string(),
            })
    }

    /// Verify store connectivity.
    pub async fn health_check(&self) -> MetadataResult<()> {
        self.kv
            .health_check()
            .await
            .map_err(|e| MetadataError::ScanFailed {
                message: e.to_string(),
            })
    }
}

/// Serialize a canonical record into the stored attribute layout (the
/// canonical producer dialect). Labels keep their in-memory shape.
fn to_item(record: &ImageRecord) -> RawItem {
    let uploaded_at = if record.uploaded_at.is_empty() {
        now_rfc3339()
    } else {
        record.uploaded_at.clone()
    };

    let mut item = RawItem::new();
    item.insert(ATTR_IMAGE_ID.to_string(), Value::from(record.id.clone()));
    item.insert(ATTR_CREATED_AT.to_string(), Value::from(METADATA_SENTINEL));
    item.insert("name".to_string(), Value::from(record.name.clone()));
    item.insert("url".to_string(), Value::from(record.url.clone()));
    item.insert("s3Key".to_string(), Value::from(record.object_key.clone()));
    item.insert("size".to_string(), Value::from(record.size));
    item.insert(
        "mimeType".to_string(),
        Value::from(record.mime_type.clone()),
    );
    item.insert("uploadedAt".to_string(), Value::from(uploaded_at));
    item.insert("status".to_string(), Value::from(record.status.as_str()));
    item.insert(
        "labels".to_string(),
        serde_json::to_value(&record.labels).unwrap_or(Value::Array(Vec::new())),
    );
    if let Some(dimensions) = record.dimensions {
        if let Ok(value) = serde_json::to_value(dimensions) {
            item.insert("dimensions".to_string(), value);
        }
    }
    item
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
