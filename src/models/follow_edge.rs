use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Record};

/// Directed follow relationship: `follower_id` follows `followee_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub edge_id: String,
    pub follower_id: String,
    pub followee_id: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl FollowEdge {
    pub const FOLLOWER_FIELD: &'static str = "followerId";
    pub const FOLLOWEE_FIELD: &'static str = "followeeId";
    pub const CREATED_AT_FIELD: &'static str = "createdAt";

    /// Store-level uniqueness key for the ordered pair.
    pub fn pair_key(follower_id: &str, followee_id: &str) -> String {
        format!("{}:{}", follower_id, followee_id)
    }
}

impl Record for FollowEdge {
    const COLLECTION: &'static str = "user_follows";
    const ID_FIELD: &'static str = "edgeId";

    fn id(&self) -> &str {
        &self.edge_id
    }
}
