//! Canonical image metadata records.

use crate::label::LabelValue;
use serde::{Deserialize, Serialize};

/// Fixed sort-key sentinel for metadata records.
///
/// Every metadata record for a given image id uses this same value as the
/// second component of its composite key, so exactly one metadata record
/// exists per id.
pub const METADATA_SENTINEL: &str = "METADATA";

/// Raw status values eligible for label search and aggregation.
///
/// `processed` is the recognition pipeline's dialect for a finished record;
/// it is matched at the raw scan level, before normalization.
pub const SEARCHABLE_STATUSES: &[&str] = &["completed", "processed"];

/// Image lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    /// Initial state for newly created or malformed records.
    #[default]
    Uploading,
    Processing,
    Completed,
    Failed,
    /// Reserved for records that failed normalization.
    Error,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }

    /// Parse a stored status string. Unknown values degrade to the default
    /// rather than failing the record they appear in.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "uploading" => Self::Uploading,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "error" => Self::Error,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel dimensions reported by the recognition pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// The canonical, store-independent image metadata record.
///
/// Raw stored items arrive in one of two producer dialects; the normalizer
/// in `darkroom-metadata` reconciles both into this shape. Consumers read
/// the canonical field names only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Unique, producer-assigned, immutable once written.
    pub id: String,
    /// Always [`METADATA_SENTINEL`] for metadata records.
    pub created_at: String,
    /// Original filename; empty if absent.
    pub name: String,
    /// Public or signed location of the binary object; empty if absent.
    pub url: String,
    /// Key of the binary object in the object store; empty if absent.
    pub object_key: String,
    /// Byte size; zero if absent or unparsable.
    pub size: u64,
    pub mime_type: String,
    /// RFC 3339 instant string.
    pub uploaded_at: String,
    pub status: ImageStatus,
    /// Always present, possibly empty. Elements keep their stored shape.
    pub labels: Vec<LabelValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl ImageRecord {
    /// A minimal record for the given id with every other field at its
    /// documented default.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: METADATA_SENTINEL.to_string(),
            name: String::new(),
            url: String::new(),
            object_key: String::new(),
            size: 0,
            mime_type: String::new(),
            uploaded_at: String::new(),
            status: ImageStatus::default(),
            labels: Vec::new(),
            dimensions: None,
        }
    }
}
