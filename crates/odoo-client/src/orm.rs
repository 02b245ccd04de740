//! ORM conveniences
//!
//! Typed wrappers over [`OdooClient::call`] for the model methods every
//! integration ends up using. Domains and field values stay loosely typed
//! JSON, the same shape the server expects.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::{decode, OdooClient};
use crate::error::{OdooError, OdooResult};

/// Database id of a record
pub type RecordId = i64;

/// Paging and projection options for `search` and `search_read`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Fields to return; empty means all fields (`search_read` only)
    #[serde(default)]
    pub fields: Vec<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    /// e.g. `"name asc, id desc"`
    pub order: Option<String>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    fn to_kwargs(&self, with_fields: bool) -> Value {
        let mut kwargs = Map::new();
        if with_fields && !self.fields.is_empty() {
            kwargs.insert("fields".to_string(), json!(self.fields));
        }
        if let Some(offset) = self.offset {
            kwargs.insert("offset".to_string(), json!(offset));
        }
        if let Some(limit) = self.limit {
            kwargs.insert("limit".to_string(), json!(limit));
        }
        if let Some(order) = &self.order {
            kwargs.insert("order".to_string(), json!(order));
        }
        Value::Object(kwargs)
    }
}

// `null` means "match everything".
fn domain_arg(domain: Value) -> OdooResult<Value> {
    match domain {
        Value::Null => Ok(json!([])),
        Value::Array(_) => Ok(domain),
        other => Err(OdooError::InvalidArgument(format!(
            "domain must be a JSON array, got {}",
            other
        ))),
    }
}

fn values_arg(values: Value) -> OdooResult<Value> {
    match values {
        Value::Object(_) => Ok(values),
        other => Err(OdooError::InvalidArgument(format!(
            "record values must be a JSON object, got {}",
            other
        ))),
    }
}

impl OdooClient {
    /// Ids of the records of `model` matching `domain`
    pub async fn search(
        &self,
        model: &str,
        domain: Value,
        options: &SearchOptions,
    ) -> OdooResult<Vec<RecordId>> {
        let result = self
            .call(model, "search", json!([domain_arg(domain)?]), options.to_kwargs(false))
            .await?;
        decode(result, "search")
    }

    pub async fn search_count(&self, model: &str, domain: Value) -> OdooResult<u64> {
        let result = self
            .call(model, "search_count", json!([domain_arg(domain)?]), Value::Null)
            .await?;
        decode(result, "search_count")
    }

    /// Read `fields` of the given records; an empty field list reads all fields
    pub async fn read(
        &self,
        model: &str,
        ids: &[RecordId],
        fields: &[&str],
    ) -> OdooResult<Vec<Value>> {
        let kwargs = if fields.is_empty() {
            Value::Null
        } else {
            json!({ "fields": fields })
        };
        let result = self.call(model, "read", json!([ids]), kwargs).await?;
        decode(result, "read")
    }

    pub async fn search_read(
        &self,
        model: &str,
        domain: Value,
        options: &SearchOptions,
    ) -> OdooResult<Vec<Value>> {
        let result = self
            .call(model, "search_read", json!([domain_arg(domain)?]), options.to_kwargs(true))
            .await?;
        decode(result, "search_read")
    }

    /// Create one record and return its id
    pub async fn create(&self, model: &str, values: Value) -> OdooResult<RecordId> {
        let result = self
            .call(model, "create", json!([values_arg(values)?]), Value::Null)
            .await?;
        decode(result, "create")
    }

    pub async fn write(&self, model: &str, ids: &[RecordId], values: Value) -> OdooResult<bool> {
        let result = self
            .call(model, "write", json!([ids, values_arg(values)?]), Value::Null)
            .await?;
        decode(result, "write")
    }

    pub async fn unlink(&self, model: &str, ids: &[RecordId]) -> OdooResult<bool> {
        let result = self.call(model, "unlink", json!([ids]), Value::Null).await?;
        decode(result, "unlink")
    }

    /// Field definitions of `model`, keyed by field name
    pub async fn fields_get(
        &self,
        model: &str,
        attributes: &[&str],
    ) -> OdooResult<Map<String, Value>> {
        let kwargs = if attributes.is_empty() {
            Value::Null
        } else {
            json!({ "attributes": attributes })
        };
        let result = self.call(model, "fields_get", Value::Null, kwargs).await?;
        decode(result, "fields_get")
    }

    /// `(id, display name)` pairs whose name matches `name`
    pub async fn name_search(
        &self,
        model: &str,
        name: &str,
        limit: Option<u64>,
    ) -> OdooResult<Vec<(RecordId, String)>> {
        let mut kwargs = json!({ "name": name });
        if let Some(limit) = limit {
            kwargs["limit"] = json!(limit);
        }
        let result = self.call(model, "name_search", Value::Null, kwargs).await?;
        decode(result, "name_search")
    }
}
