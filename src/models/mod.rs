// Typed store records - every collection gets an explicit struct and a
// single encode/decode boundary to the document representation.

pub mod follow_edge;
pub mod post;
pub mod timestamp;
pub mod user;

pub use follow_edge::FollowEdge;
pub use post::{Post, PostContent};
pub use user::{PushToken, UserProfile};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Body of a stored document. The record id is kept by the store, not here.
pub type Document = Map<String, Value>;

/// A struct persisted as one document in one collection.
pub trait Record: Serialize + DeserializeOwned {
    /// Collection the record lives in.
    const COLLECTION: &'static str;
    /// Name of the struct field that carries the store-assigned id.
    const ID_FIELD: &'static str;

    /// Id of this record in its collection.
    fn id(&self) -> &str;

    /// Serialize into a document body, dropping the id field.
    fn encode(&self) -> AppResult<Document> {
        match serde_json::to_value(self)? {
            Value::Object(mut doc) => {
                doc.remove(Self::ID_FIELD);
                Ok(doc)
            }
            other => Err(AppError::Storage(anyhow::anyhow!(
                "{} record encoded to non-object value: {}",
                Self::COLLECTION,
                other
            ))),
        }
    }

    /// Rebuild a record from its store id and document body.
    fn decode(id: &str, mut doc: Document) -> AppResult<Self> {
        doc.insert(Self::ID_FIELD.to_string(), Value::String(id.to_string()));
        serde_json::from_value(Value::Object(doc)).map_err(|e| {
            AppError::Storage(anyhow::anyhow!(
                "corrupt {} document {}: {}",
                Self::COLLECTION,
                id,
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_encode_drops_id_field() {
        let edge = FollowEdge {
            edge_id: "e1".to_string(),
            follower_id: "alice".to_string(),
            followee_id: "bob".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };

        let doc = edge.encode().unwrap();
        assert!(!doc.contains_key("edgeId"));
        assert_eq!(doc.get("followerId"), Some(&json!("alice")));
        assert_eq!(doc.get("createdAt"), Some(&json!("2024-05-01T12:00:00.000000Z")));

        let decoded = FollowEdge::decode("e1", doc).unwrap();
        assert_eq!(decoded, edge);
    }

    #[test]
    fn test_decode_rejects_malformed_document() {
        let mut doc = Document::new();
        doc.insert("followerId".to_string(), json!(42));

        let err = FollowEdge::decode("e1", doc).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(err.to_string().contains("user_follows"));
    }
}
