use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    pub heading: String,
    pub description: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
}

impl PostContent {
    pub fn new(heading: String, description: String) -> Self {
        Self {
            heading,
            description,
            likes: 0,
            comments: 0,
            shares: 0,
        }
    }
}

/// A post, owned exclusively by `author_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: String,
    pub author_id: String,
    pub content: PostContent,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    pub const AUTHOR_FIELD: &'static str = "authorId";
    pub const CREATED_AT_FIELD: &'static str = "createdAt";
}

impl Record for Post {
    const COLLECTION: &'static str = "posts";
    const ID_FIELD: &'static str = "postId";

    fn id(&self) -> &str {
        &self.post_id
    }
}
