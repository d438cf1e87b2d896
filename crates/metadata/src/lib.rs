//! Metadata store abstraction and implementations for darkroom.
//!
//! This crate is the normalization and query layer over a schema-less
//! key-value store:
//! - Reconciling divergent producer record shapes into one canonical entity
//! - Deterministic forward pagination over a cursored bulk scan
//! - Label search combining an index fast path with a best-effort scan
//! - Label-frequency aggregation with defined ordering
//! - A facade translating store faults into store-domain errors

pub mod dynamodb;
pub mod error;
pub mod kv;
pub mod memory;
pub mod normalize;
pub mod scan;
pub mod search;
pub mod stats;
pub mod store;

pub use dynamodb::DynamoDbStore;
pub use error::{KvError, KvResult, MetadataError, MetadataResult};
pub use kv::{
    ContinuationToken, ItemKey, KeyValueStore, RawItem, ScanFilter, ScanInput, ScanOutput,
};
pub use memory::MemoryStore;
pub use search::LabelMatch;
pub use stats::LabelAggregation;
pub use store::{ImageMetadataStore, Page};

use darkroom_core::config::MetadataConfig;
use std::sync::Arc;

/// Default name of the exact-match label index.
pub const DEFAULT_LABEL_INDEX: &str = "LabelIndex";

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<ImageMetadataStore> {
    match config {
        MetadataConfig::Memory => {
            tracing::info!("Using in-memory metadata store");
            Ok(ImageMetadataStore::new(
                Arc::new(MemoryStore::new()),
                Some(DEFAULT_LABEL_INDEX.to_string()),
            ))
        }
        MetadataConfig::DynamoDb {
            table,
            region,
            endpoint,
            access_key_id,
            secret_access_key,
            label_index,
        } => {
            let backend = DynamoDbStore::new(
                table,
                region.clone(),
                endpoint.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
            )
            .await
            .map_err(|e| MetadataError::Config(e.to_string()))?;
            Ok(ImageMetadataStore::new(
                Arc::new(backend),
                label_index.clone(),
            ))
        }
    }
}
