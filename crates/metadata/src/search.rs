//! Label search: candidate merging and predicate filtering.
//!
//! Search unions a fast-path index lookup with a best-effort scan, so the
//! same image can appear in both candidate sets, and scan results may
//! include non-metadata rows. The pure half of the engine lives here; the
//! store facade drives the two lookups.

use darkroom_core::{ImageRecord, Label, LabelValue, METADATA_SENTINEL};
use std::collections::HashSet;

/// A search hit annotated with the label that satisfied the predicate.
#[derive(Clone, Debug)]
pub struct LabelMatch {
    pub record: ImageRecord,
    pub matched: Label,
}

/// Deduplicate candidates by entity identity, keeping the first occurrence
/// of each id (order-stable, not set semantics on full records). Rows that
/// are not metadata records, or that carry no id, are dropped.
pub fn dedup_by_identity(candidates: Vec<ImageRecord>) -> Vec<ImageRecord> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|record| {
            !record.id.is_empty()
                && record.created_at == METADATA_SENTINEL
                && seen.insert(record.id.clone())
        })
        .collect()
}

/// The first label on the record satisfying the case-insensitive name
/// match and confidence threshold, if any. When several labels match, any
/// satisfying one is acceptable.
pub fn matching_label(record: &ImageRecord, label: &str, min_confidence: f64) -> Option<Label> {
    let needle = label.to_lowercase();
    record
        .labels
        .iter()
        .find(|candidate| {
            candidate.name().to_lowercase() == needle && candidate.confidence() >= min_confidence
        })
        .map(LabelValue::to_canonical)
}

/// Filter deduplicated candidates down to annotated matches.
pub fn filter_matches(
    candidates: Vec<ImageRecord>,
    label: &str,
    min_confidence: f64,
) -> Vec<LabelMatch> {
    candidates
        .into_iter()
        .filter_map(|record| {
            matching_label(&record, label, min_confidence)
                .map(|matched| LabelMatch { record, matched })
        })
        .collect()
}
