//! DynamoDB key-value store backend.

use crate::error::{KvError, KvResult};
use crate::kv::{
    ATTR_CREATED_AT, ATTR_IMAGE_ID, ContinuationToken, ItemKey, KeyValueStore, RawItem, ScanInput,
    ScanOutput,
};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::Value;
use std::collections::HashMap;

/// DynamoDB-backed store bound to a single table.
pub struct DynamoDbStore {
    client: Client,
    table: String,
}

impl std::fmt::Debug for DynamoDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl DynamoDbStore {
    /// Create a new DynamoDB store.
    ///
    /// Credentials come from the explicit pair when both are set, otherwise
    /// from the ambient AWS credential chain. An endpoint override points
    /// the client at DynamoDB Local or LocalStack.
    pub async fn new(
        table: &str,
        region: Option<String>,
        endpoint: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
    ) -> KvResult<Self> {
        if access_key_id.is_some() ^ secret_access_key.is_some() {
            return Err(KvError::Config(
                "dynamodb config requires both access_key_id and secret_access_key when either is set"
                    .to_string(),
            ));
        }

        let resolved_region = region.unwrap_or_else(|| "us-east-1".to_string());
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(resolved_region));

        if let (Some(key_id), Some(secret)) = (access_key_id, secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                None, // session token
                None, // expiration
                "darkroom-config",
            ));
        }

        if let Some(endpoint_url) = endpoint {
            // Handle bare host:port endpoints (e.g., "dynamodb-local:8000").
            let normalized = if endpoint_url.to_lowercase().starts_with("http://")
                || endpoint_url.to_lowercase().starts_with("https://")
            {
                endpoint_url
            } else {
                format!("http://{endpoint_url}")
            };
            loader = loader.endpoint_url(normalized);
        }

        let config = loader.load().await;
        let client = Client::new(&config);

        tracing::info!(table = %table, "DynamoDB metadata backend initialized");
        Ok(Self {
            client,
            table: table.to_string(),
        })
    }

    fn key_attrs(key: &ItemKey) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (
                ATTR_IMAGE_ID.to_string(),
                AttributeValue::S(key.image_id.clone()),
            ),
            (
                ATTR_CREATED_AT.to_string(),
                AttributeValue::S(key.created_at.clone()),
            ),
        ])
    }

    fn encode_token(key: &HashMap<String, AttributeValue>) -> KvResult<ContinuationToken> {
        let raw = attrs_to_raw(key);
        let bytes = serde_json::to_vec(&raw)
            .map_err(|e| KvError::InvalidContinuationToken(e.to_string()))?;
        ContinuationToken::new(bytes)
    }

    fn decode_token(token: &ContinuationToken) -> KvResult<HashMap<String, AttributeValue>> {
        let raw: RawItem = serde_json::from_slice(token.as_bytes())
            .map_err(|e| KvError::InvalidContinuationToken(e.to_string()))?;
        Ok(raw_to_attrs(&raw))
    }
}

#[async_trait]
impl KeyValueStore for DynamoDbStore {
    async fn put_item(&self, item: RawItem) -> KvResult<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(raw_to_attrs(&item)))
            .send()
            .await
            .map_err(|e| KvError::Transport(error_chain(&e)))?;
        Ok(())
    }

    async fn get_item(&self, key: &ItemKey) -> KvResult<Option<RawItem>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .set_key(Some(Self::key_attrs(key)))
            .send()
            .await
            .map_err(|e| KvError::Transport(error_chain(&e)))?;
        Ok(output.item.map(|attrs| attrs_to_raw(&attrs)))
    }

    async fn scan(&self, input: ScanInput) -> KvResult<ScanOutput> {
        let mut request = self
            .client
            .scan()
            .table_name(&self.table)
            .limit(input.limit.max(1) as i32);

        if let Some(filter) = &input.filter {
            // Attributes go through aliases: `status` is a reserved word.
            request = request.expression_attribute_names("#f", &filter.attribute);
            let mut terms = Vec::with_capacity(filter.any_of.len());
            for (idx, value) in filter.any_of.iter().enumerate() {
                let placeholder = format!(":f{idx}");
                terms.push(format!("#f = {placeholder}"));
                request = request.expression_attribute_values(placeholder, json_to_attr(value));
            }
            request = request.filter_expression(terms.join(" OR "));
        }

        if let Some(projection) = &input.projection {
            let mut aliases = Vec::new();
            for (idx, attr) in projection.split(',').map(str::trim).enumerate() {
                let alias = format!("#p{idx}");
                request = request.expression_attribute_names(&alias, attr);
                aliases.push(alias);
            }
            request = request.projection_expression(aliases.join(", "));
        }

        if let Some(token) = &input.start {
            request = request.set_exclusive_start_key(Some(Self::decode_token(token)?));
        }

        let output = request
            .send()
            .await
            .map_err(|e| KvError::Transport(error_chain(&e)))?;

        let items = output
            .items
            .unwrap_or_default()
            .iter()
            .map(attrs_to_raw)
            .collect();
        let next_token = output
            .last_evaluated_key
            .as_ref()
            .map(Self::encode_token)
            .transpose()?;

        Ok(ScanOutput { items, next_token })
    }

    async fn query_index(
        &self,
        index: &str,
        key_attr: &str,
        value: &str,
        limit: u32,
    ) -> KvResult<Vec<RawItem>> {
        let output = self
            .client
            .query()
            .table_name(&self.table)
            .index_name(index)
            .key_condition_expression("#k = :v")
            .expression_attribute_names("#k", key_attr)
            .expression_attribute_values(":v", AttributeValue::S(value.to_string()))
            .limit(limit.max(1) as i32)
            .send()
            .await
            .map_err(|e| KvError::Transport(error_chain(&e)))?;

        Ok(output
            .items
            .unwrap_or_default()
            .iter()
            .map(attrs_to_raw)
            .collect())
    }

    async fn update_item(&self, key: &ItemKey, assignments: &[(String, Value)]) -> KvResult<()> {
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table)
            .set_key(Some(Self::key_attrs(key)));

        let mut terms = Vec::with_capacity(assignments.len());
        for (idx, (attr, value)) in assignments.iter().enumerate() {
            let name = format!("#a{idx}");
            let placeholder = format!(":v{idx}");
            terms.push(format!("{name} = {placeholder}"));
            request = request
                .expression_attribute_names(name, attr)
                .expression_attribute_values(placeholder, json_to_attr(value));
        }

        request
            .update_expression(format!("SET {}", terms.join(", ")))
            .send()
            .await
            .map_err(|e| KvError::Transport(error_chain(&e)))?;
        Ok(())
    }

    async fn delete_item(&self, key: &ItemKey) -> KvResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .set_key(Some(Self::key_attrs(key)))
            .send()
            .await
            .map_err(|e| KvError::Transport(error_chain(&e)))?;
        Ok(())
    }

    async fn health_check(&self) -> KvResult<()> {
        self.client
            .scan()
            .table_name(&self.table)
            .limit(1)
            .send()
            .await
            .map_err(|e| KvError::Transport(error_chain(&e)))?;
        Ok(())
    }
}

/// Join an error with its source chain, so the fault surfaced to callers
/// carries the service message and not just the SDK's outer wrapper.
fn error_chain(err: &(dyn std::error::Error)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn attrs_to_raw(attrs: &HashMap<String, AttributeValue>) -> RawItem {
    attrs
        .iter()
        .map(|(name, attr)| (name.clone(), attr_to_json(attr)))
        .collect()
}

fn raw_to_attrs(item: &RawItem) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(name, value)| (name.clone(), json_to_attr(value)))
        .collect()
}

fn attr_to_json(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(list) => Value::Array(list.iter().map(attr_to_json).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(name, attr)| (name.clone(), attr_to_json(attr)))
                .collect(),
        ),
        AttributeValue::Ss(set) => {
            Value::Array(set.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(set) => Value::Array(set.iter().map(|n| number_to_json(n)).collect()),
        // Binary and unknown attribute kinds have no place in the image
        // schema; drop them rather than fail the item.
        _ => Value::Null,
    }
}

fn number_to_json(n: &str) -> Value {
    if let Ok(int) = n.parse::<i64>() {
        return Value::from(int);
    }
    n.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(n.to_string()))
}

fn json_to_attr(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attr).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(name, value)| (name.clone(), json_to_attr(value)))
                .collect(),
        ),
    }
}
