use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{
    compare_values, merge_patch, Direction, DocumentStore, Query, StoredDocument,
};
use crate::models::Document;

#[derive(Default)]
struct Collection {
    next_seq: u64,
    /// Insertion order -> (id, body). Gives queries without `order_by` a
    /// stable order.
    rows: BTreeMap<u64, (String, Document)>,
    seq_by_id: HashMap<String, u64>,
    id_by_unique_key: HashMap<String, String>,
    unique_key_by_id: HashMap<String, String>,
}

impl Collection {
    fn push(&mut self, id: String, doc: Document) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.seq_by_id.insert(id.clone(), seq);
        self.rows.insert(seq, (id, doc));
    }

    fn get(&self, id: &str) -> Option<&Document> {
        let seq = self.seq_by_id.get(id)?;
        self.rows.get(seq).map(|(_, doc)| doc)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Document> {
        let seq = self.seq_by_id.get(id)?;
        self.rows.get_mut(seq).map(|(_, doc)| doc)
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(seq) = self.seq_by_id.remove(id) else {
            return false;
        };
        self.rows.remove(&seq);
        if let Some(key) = self.unique_key_by_id.remove(id) {
            self.id_by_unique_key.remove(&key);
        }
        true
    }
}

/// In-process document store. Every mutation happens under one write lock,
/// which makes `insert_unique` atomic.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    max_in_values: usize,
}

impl MemoryStore {
    pub fn new(max_in_values: usize) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            max_in_values: max_in_values.max(1),
        }
    }

    /// Number of documents currently held in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.rows.len())
            .unwrap_or(0)
    }

    fn check_batch(&self, len: usize) -> AppResult<()> {
        if len > self.max_in_values {
            return Err(AppError::Storage(anyhow::anyhow!(
                "batch of {} values exceeds the store limit of {}",
                len,
                self.max_in_values
            )));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, doc: Document) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(id.clone(), doc);
        Ok(id)
    }

    async fn insert_unique(
        &self,
        collection: &str,
        unique_key: &str,
        doc: Document,
    ) -> AppResult<Option<String>> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        if coll.id_by_unique_key.contains_key(unique_key) {
            return Ok(None);
        }

        let id = Uuid::new_v4().to_string();
        coll.id_by_unique_key
            .insert(unique_key.to_string(), id.clone());
        coll.unique_key_by_id
            .insert(id.clone(), unique_key.to_string());
        coll.push(id.clone(), doc);
        Ok(Some(id))
    }

    async fn put(&self, collection: &str, id: &str, doc: Document) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        match coll.get_mut(id) {
            Some(existing) => *existing = doc,
            None => coll.push(id.to_string(), doc),
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|doc| StoredDocument {
                id: id.to_string(),
                data: doc.clone(),
            }))
    }

    async fn get_many(&self, collection: &str, ids: &[String]) -> AppResult<Vec<StoredDocument>> {
        self.check_batch(ids.len())?;
        let collections = self.collections.read().await;
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| {
                coll.get(id).map(|doc| StoredDocument {
                    id: id.clone(),
                    data: doc.clone(),
                })
            })
            .collect())
    }

    async fn query(&self, query: &Query) -> AppResult<Vec<StoredDocument>> {
        self.check_batch(query.max_in_len())?;
        if query.is_trivially_empty() {
            return Ok(Vec::new());
        }

        let collections = self.collections.read().await;
        let Some(coll) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<StoredDocument> = coll
            .rows
            .values()
            .filter(|(_, doc)| query.filters.iter().all(|f| f.matches(doc)))
            .map(|(id, doc)| StoredDocument {
                id: id.clone(),
                data: doc.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            matched.sort_by(|a, b| {
                let mut ordering = compare_values(
                    a.data.get(field).unwrap_or(&serde_json::Value::Null),
                    b.data.get(field).unwrap_or(&serde_json::Value::Null),
                );
                if query.ties_by_id {
                    ordering = ordering.then_with(|| a.id.cmp(&b.id));
                }
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> AppResult<bool> {
        let mut collections = self.collections.write().await;
        match collections.get_mut(collection).and_then(|c| c.get_mut(id)) {
            Some(doc) => {
                merge_patch(doc, patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|c| c.remove(id))
            .unwrap_or(false))
    }

    fn max_in_values(&self) -> usize {
        self.max_in_values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_insert_unique_rejects_duplicate_key() {
        let store = MemoryStore::new(10);
        let first = store
            .insert_unique("edges", "a:b", doc(json!({"n": 1})))
            .await
            .unwrap();
        let second = store
            .insert_unique("edges", "a:b", doc(json!({"n": 2})))
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(store.len("edges").await, 1);
    }

    #[tokio::test]
    async fn test_delete_releases_unique_key() {
        let store = MemoryStore::new(10);
        let id = store
            .insert_unique("edges", "a:b", doc(json!({})))
            .await
            .unwrap()
            .unwrap();

        assert!(store.delete("edges", &id).await.unwrap());
        assert!(!store.delete("edges", &id).await.unwrap());
        assert!(store
            .insert_unique("edges", "a:b", doc(json!({})))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_order_ties_by_insertion_or_id() {
        let store = MemoryStore::new(10);
        for id in ["b", "a", "c"] {
            store.put("posts", id, doc(json!({"createdAt": "t1"}))).await.unwrap();
        }

        let base = Query::new("posts").order_by("createdAt", Direction::Descending);
        let ids = |rows: Vec<StoredDocument>| rows.into_iter().map(|r| r.id).collect::<Vec<_>>();

        let by_insertion = store.query(&base).await.unwrap();
        assert_eq!(ids(by_insertion), vec!["b", "a", "c"]);

        let by_id = store.query(&base.clone().ties_by_id().limit(2)).await.unwrap();
        assert_eq!(ids(by_id), vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_query_orders_and_limits() {
        let store = MemoryStore::new(10);
        for (author, ts) in [("a", "t1"), ("b", "t3"), ("a", "t2"), ("c", "t4")] {
            store
                .insert("posts", doc(json!({"authorId": author, "createdAt": ts})))
                .await
                .unwrap();
        }

        let query = Query::new("posts")
            .where_in("authorId", vec![json!("a"), json!("b")])
            .order_by("createdAt", Direction::Descending)
            .limit(2);
        let rows = store.query(&query).await.unwrap();
        let stamps: Vec<_> = rows.iter().map(|r| r.data["createdAt"].clone()).collect();

        assert_eq!(stamps, vec![json!("t3"), json!("t2")]);
    }

    #[tokio::test]
    async fn test_oversized_batches_fail() {
        let store = MemoryStore::new(2);
        let ids: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();

        assert!(matches!(
            store.get_many("users", &ids).await,
            Err(AppError::Storage(_))
        ));

        let query = Query::new("posts").where_in("authorId", vec![json!(1), json!(2), json!(3)]);
        assert!(matches!(store.query(&query).await, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_put_get_update() {
        let store = MemoryStore::default();
        store
            .put("users", "alice", doc(json!({"displayName": "Alice"})))
            .await
            .unwrap();
        assert!(store
            .update("users", "alice", doc(json!({"phoneNumber": "1"})))
            .await
            .unwrap());
        assert!(!store
            .update("users", "nobody", doc(json!({"phoneNumber": "1"})))
            .await
            .unwrap());

        let stored = store.get("users", "alice").await.unwrap().unwrap();
        assert_eq!(
            Value::Object(stored.data),
            json!({"displayName": "Alice", "phoneNumber": "1"})
        );
    }
}
