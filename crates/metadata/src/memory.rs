//! In-memory key-value store.
//!
//! Used by tests and local development. Mirrors DynamoDB's scan semantics
//! where they matter to the layer above: `limit` bounds the number of
//! items examined, the filter applies afterwards, and continuation tokens
//! point at the last examined key.

use crate::error::{KvError, KvResult};
use crate::kv::{
    ATTR_CREATED_AT, ATTR_IMAGE_ID, ContinuationToken, ItemKey, KeyValueStore, RawItem, ScanFilter,
    ScanInput, ScanOutput,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

type StoredKey = (String, String);

/// In-process store over a sorted map, so scans have a stable forward
/// order to cursor through.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<StoredKey, RawItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn encode_token(key: &StoredKey) -> KvResult<ContinuationToken> {
        let bytes = serde_json::to_vec(key)
            .map_err(|e| KvError::InvalidContinuationToken(e.to_string()))?;
        ContinuationToken::new(bytes)
    }

    fn decode_token(token: &ContinuationToken) -> KvResult<StoredKey> {
        serde_json::from_slice(token.as_bytes())
            .map_err(|e| KvError::InvalidContinuationToken(e.to_string()))
    }
}

fn stored_key(item: &RawItem) -> KvResult<StoredKey> {
    let image_id = item
        .get(ATTR_IMAGE_ID)
        .and_then(Value::as_str)
        .ok_or_else(|| KvError::Transport(format!("item missing {ATTR_IMAGE_ID} key attribute")))?;
    let created_at = item
        .get(ATTR_CREATED_AT)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            KvError::Transport(format!("item missing {ATTR_CREATED_AT} key attribute"))
        })?;
    Ok((image_id.to_string(), created_at.to_string()))
}

fn matches_filter(item: &RawItem, filter: &Option<ScanFilter>) -> bool {
    match filter {
        Some(filter) => item
            .get(&filter.attribute)
            .is_some_and(|value| filter.any_of.contains(value)),
        None => true,
    }
}

fn project(item: &RawItem, projection: Option<&str>) -> RawItem {
    match projection {
        Some(attrs) => {
            let keep: Vec<&str> = attrs.split(',').map(str::trim).collect();
            item.iter()
                .filter(|(name, _)| keep.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect()
        }
        None => item.clone(),
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put_item(&self, item: RawItem) -> KvResult<()> {
        let key = stored_key(&item)?;
        self.items.write().await.insert(key, item);
        Ok(())
    }

    async fn get_item(&self, key: &ItemKey) -> KvResult<Option<RawItem>> {
        let items = self.items.read().await;
        Ok(items
            .get(&(key.image_id.clone(), key.created_at.clone()))
            .cloned())
    }

    async fn scan(&self, input: ScanInput) -> KvResult<ScanOutput> {
        let items = self.items.read().await;

        let range = match &input.start {
            Some(token) => {
                let key = Self::decode_token(token)?;
                (Bound::Excluded(key), Bound::Unbounded)
            }
            None => (Bound::Unbounded, Bound::Unbounded),
        };

        let limit = input.limit.max(1) as usize;
        let mut iter = items.range(range);
        let mut matched = Vec::new();
        let mut last_examined: Option<StoredKey> = None;
        let mut exhausted = false;

        for _ in 0..limit {
            match iter.next() {
                Some((key, item)) => {
                    last_examined = Some(key.clone());
                    if matches_filter(item, &input.filter) {
                        matched.push(project(item, input.projection.as_deref()));
                    }
                }
                None => {
                    exhausted = true;
                    break;
                }
            }
        }

        if !exhausted && iter.next().is_none() {
            exhausted = true;
        }

        let next_token = match (&last_examined, exhausted) {
            (Some(key), false) => Some(Self::encode_token(key)?),
            _ => None,
        };

        Ok(ScanOutput {
            items: matched,
            next_token,
        })
    }

    /// Emulates an exact-match secondary index by filtering on the index's
    /// key attribute; the index name itself is not interpreted.
    async fn query_index(
        &self,
        _index: &str,
        key_attr: &str,
        value: &str,
        limit: u32,
    ) -> KvResult<Vec<RawItem>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| item.get(key_attr).and_then(Value::as_str) == Some(value))
            .take(limit.max(1) as usize)
            .cloned()
            .collect())
    }

    async fn update_item(&self, key: &ItemKey, assignments: &[(String, Value)]) -> KvResult<()> {
        let mut items = self.items.write().await;
        let stored = (key.image_id.clone(), key.created_at.clone());
        // DynamoDB update semantics: a missing item is created from its key.
        let item = items.entry(stored).or_insert_with(|| {
            let mut fresh = RawItem::new();
            fresh.insert(
                ATTR_IMAGE_ID.to_string(),
                Value::from(key.image_id.clone()),
            );
            fresh.insert(
                ATTR_CREATED_AT.to_string(),
                Value::from(key.created_at.clone()),
            );
            fresh
        });
        for (attr, value) in assignments {
            item.insert(attr.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete_item(&self, key: &ItemKey) -> KvResult<()> {
        self.items
            .write()
            .await
            .remove(&(key.image_id.clone(), key.created_at.clone()));
        Ok(())
    }
}
