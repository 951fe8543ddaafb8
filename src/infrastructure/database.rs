// Document store interface - the only way services reach persistent state.
// Records are encoded to JSON documents; queries filter on top-level fields.

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::AppResult;
use crate::models::Document;

/// A document as returned by the store: its id plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Predicate on a single top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    /// Field value is one of the listed values. Bounded by
    /// [`DocumentStore::max_in_values`].
    In(String, Vec<Value>),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(field, _) | Filter::In(field, _) => field,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        let actual = doc.get(self.field()).unwrap_or(&Value::Null);
        match self {
            Filter::Eq(_, expected) => actual == expected,
            Filter::In(_, values) => values.iter().any(|v| v == actual),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Filtered, ordered, bounded read over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    /// Break `order_by` ties on the document id, in the same direction.
    /// Otherwise ties keep insertion order.
    pub ties_by_id: bool,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            ties_by_id: false,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.into(), value.into()));
        self
    }

    pub fn where_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(field.into(), values));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn ties_by_id(mut self) -> Self {
        self.ties_by_id = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Largest `In` list in this query, zero if there is none.
    pub fn max_in_len(&self) -> usize {
        self.filters
            .iter()
            .map(|f| match f {
                Filter::In(_, values) => values.len(),
                Filter::Eq(..) => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// True if some `In` filter has no values, so nothing can match.
    pub fn is_trivially_empty(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::In(_, values) if values.is_empty()))
    }
}

/// Total order over JSON scalars used for `order_by`: null < bool < number < string.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Document store used by every service. Implementations must be safe to
/// share across request tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert under a fresh server-assigned id and return it.
    async fn insert(&self, collection: &str, doc: Document) -> AppResult<String>;

    /// Atomically insert unless a document with the same `unique_key` already
    /// exists in the collection. Returns the new id, or `None` on conflict.
    async fn insert_unique(
        &self,
        collection: &str,
        unique_key: &str,
        doc: Document,
    ) -> AppResult<Option<String>>;

    /// Create or fully replace the document with the given id.
    async fn put(&self, collection: &str, id: &str, doc: Document) -> AppResult<()>;

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<StoredDocument>>;

    /// Fetch every existing document among `ids`. Fails when more than
    /// `max_in_values()` ids are requested; missing ids are omitted.
    async fn get_many(&self, collection: &str, ids: &[String]) -> AppResult<Vec<StoredDocument>>;

    /// Fails when an `In` filter carries more than `max_in_values()` values.
    async fn query(&self, query: &Query) -> AppResult<Vec<StoredDocument>>;

    /// Apply a JSON merge patch. Returns false if the document does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Document) -> AppResult<bool>;

    /// Returns false if the document did not exist.
    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool>;

    /// Largest id set or `In` list a single call accepts.
    fn max_in_values(&self) -> usize;
}

/// RFC 7396 merge of `patch` into `target`; null values remove keys.
pub fn merge_patch(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(&key);
            }
            Value::Object(nested) => {
                let slot = target
                    .entry(key)
                    .or_insert_with(|| Value::Object(Document::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Document::new());
                }
                if let Value::Object(existing) = slot {
                    merge_patch(existing, nested);
                }
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}
