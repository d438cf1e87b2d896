//! Key-value store primitive.
//!
//! The metadata layer assumes only what this trait offers: put-by-key,
//! get-by-key, delete-by-key, a bulk forward scan with opaque continuation
//! tokens, one optional exact-match index, and a single-write update. The
//! production backend is DynamoDB; an in-memory backend mirrors its
//! semantics for tests and local development.

use crate::error::{KvError, KvResult};
use async_trait::async_trait;
use darkroom_core::METADATA_SENTINEL;
use serde_json::Value;

/// Partition key attribute of the image table.
pub const ATTR_IMAGE_ID: &str = "ImageId";

/// Sort key attribute of the image table.
pub const ATTR_CREATED_AT: &str = "CreatedAt";

/// Maximum size for continuation tokens (2 KB).
pub const MAX_TOKEN_SIZE: usize = 2048;

/// A raw stored item: a schema-less attribute map, exactly as a producer
/// wrote it. Field naming is not assumed; normalization happens above this
/// layer.
pub type RawItem = serde_json::Map<String, Value>;

/// Composite key of a stored item.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ItemKey {
    pub image_id: String,
    pub created_at: String,
}

impl ItemKey {
    /// The metadata record key for an image id (sort key pinned to the
    /// sentinel, so at most one metadata record exists per id).
    pub fn metadata(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            created_at: METADATA_SENTINEL.to_string(),
        }
    }
}

/// An opaque continuation token for resuming scan operations.
///
/// The token is backend-specific and must not be parsed or modified by
/// callers. Maximum size is 2 KB to keep tokens cheap to carry around.
#[derive(Clone, PartialEq, Eq)]
pub struct ContinuationToken(Vec<u8>);

impl ContinuationToken {
    /// Create a new continuation token from raw bytes.
    ///
    /// Returns an error if the token exceeds [`MAX_TOKEN_SIZE`].
    pub fn new(data: Vec<u8>) -> KvResult<Self> {
        if data.len() > MAX_TOKEN_SIZE {
            return Err(KvError::InvalidContinuationToken(format!(
                "continuation token too large: {} bytes (max: {})",
                data.len(),
                MAX_TOKEN_SIZE
            )));
        }
        Ok(Self(data))
    }

    /// Get the raw token bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to base64 for serialization.
    pub fn to_base64(&self) -> String {
        use base64::{Engine as _, engine::general_purpose};
        general_purpose::STANDARD.encode(&self.0)
    }

    /// Parse from base64.
    pub fn from_base64(s: &str) -> KvResult<Self> {
        // Pre-check input length so oversized tokens are rejected before
        // decoding. Base64 inflates by 4/3; 2x leaves margin for padding.
        const MAX_BASE64_INPUT: usize = MAX_TOKEN_SIZE * 2;
        if s.len() > MAX_BASE64_INPUT {
            return Err(KvError::InvalidContinuationToken(format!(
                "continuation token base64 too large: {} bytes (max: {})",
                s.len(),
                MAX_BASE64_INPUT
            )));
        }

        use base64::{Engine as _, engine::general_purpose};
        let data = general_purpose::STANDARD.decode(s).map_err(|e| {
            KvError::InvalidContinuationToken(format!("invalid continuation token base64: {e}"))
        })?;
        Self::new(data)
    }
}

impl std::fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ContinuationToken")
            .field(&"<redacted>")
            .finish()
    }
}

/// Equality filter for scan operations: the attribute must equal any of
/// the listed values. This is the only predicate the layer relies on.
#[derive(Clone, Debug)]
pub struct ScanFilter {
    pub attribute: String,
    pub any_of: Vec<Value>,
}

impl ScanFilter {
    /// Filter on a single attribute value.
    pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            any_of: vec![value.into()],
        }
    }

    /// Filter on an attribute matching any of the given string values.
    pub fn any_of(attribute: impl Into<String>, values: &[&str]) -> Self {
        Self {
            attribute: attribute.into(),
            any_of: values.iter().map(|v| Value::from(*v)).collect(),
        }
    }
}

/// Parameters for one forward scan call.
///
/// Like DynamoDB, `limit` bounds the number of items *examined*; the
/// filter applies afterwards, so a call may return fewer matches than
/// `limit` while still carrying a continuation token.
#[derive(Clone, Debug)]
pub struct ScanInput {
    pub filter: Option<ScanFilter>,
    /// Comma-separated attribute names to project, or `None` for all.
    pub projection: Option<String>,
    pub limit: u32,
    pub start: Option<ContinuationToken>,
}

/// One batch of scan results.
#[derive(Clone, Debug)]
pub struct ScanOutput {
    pub items: Vec<RawItem>,
    /// Cursor for the next call, absent when the scan is exhausted.
    pub next_token: Option<ContinuationToken>,
}

/// Schema-less key-value store bound to a single table.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Write an item, overwriting any existing item with the same key.
    async fn put_item(&self, item: RawItem) -> KvResult<()>;

    /// Point lookup. Absence is a normal outcome, not an error.
    async fn get_item(&self, key: &ItemKey) -> KvResult<Option<RawItem>>;

    /// One step of a forward scan.
    async fn scan(&self, input: ScanInput) -> KvResult<ScanOutput>;

    /// Exact-match lookup on a secondary index.
    async fn query_index(
        &self,
        index: &str,
        key_attr: &str,
        value: &str,
        limit: u32,
    ) -> KvResult<Vec<RawItem>>;

    /// Apply SET-style assignments to an item in a single write. Creates
    /// the item if it does not exist (DynamoDB update semantics).
    async fn update_item(&self, key: &ItemKey, assignments: &[(String, Value)]) -> KvResult<()>;

    /// Delete an item. Deleting a missing key is not an error.
    async fn delete_item(&self, key: &ItemKey) -> KvResult<()>;

    /// Verify backend connectivity.
    async fn health_check(&self) -> KvResult<()> {
        Ok(())
    }
}
