// Feed assembly - newest posts from everyone the caller follows, rebuilt on
// every request.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::AppResult;
use crate::infrastructure::batch::query_in_chunked;
use crate::infrastructure::database::{Direction, DocumentStore, Query};
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{Post, Record};
use crate::services::annotate::{annotate_all, Annotated};
use crate::services::graph_query::GraphQueryEngine;

/// Maximum number of entries in a feed.
pub const FEED_LIMIT: usize = 50;

pub type FeedEntry = Annotated<Post>;

#[derive(Clone)]
pub struct FeedAssembler {
    store: Arc<dyn DocumentStore>,
    graph: GraphQueryEngine,
}

impl FeedAssembler {
    pub fn new(store: Arc<dyn DocumentStore>, graph: GraphQueryEngine) -> Self {
        Self { store, graph }
    }

    /// Up to [`FEED_LIMIT`] posts authored by users the caller follows,
    /// newest first.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn feed(&self, vc: &ViewerContext) -> AppResult<Vec<FeedEntry>> {
        let principal = vc.principal()?;

        let following = self.graph.following_ids(&principal.id).await?;
        if following.is_empty() {
            return Ok(Vec::new());
        }

        let authors: Vec<Value> = following.into_iter().map(Value::String).collect();
        let base = Query::new(Post::COLLECTION)
            .order_by(Post::CREATED_AT_FIELD, Direction::Descending)
            .ties_by_id()
            .limit(FEED_LIMIT);
        let rows =
            query_in_chunked(self.store.as_ref(), &base, Post::AUTHOR_FIELD, &authors).await?;

        let mut posts = rows
            .into_iter()
            .map(|row| Post::decode(&row.id, row.data))
            .collect::<AppResult<Vec<_>>>()?;
        merge_newest_first(&mut posts);

        debug!(authors = authors.len(), entries = posts.len(), "feed assembled");
        Ok(annotate_all(posts, principal))
    }
}

/// Global order across merged batches: newest first, ties broken by id
/// descending (the same key each batch was cut with), then cut to the feed
/// limit.
fn merge_newest_first(posts: &mut Vec<Post>) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.post_id.cmp(&a.post_id))
    });
    posts.truncate(FEED_LIMIT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostContent;
    use chrono::{Duration, TimeZone, Utc};

    fn post(id: &str, minutes: i64) -> Post {
        Post {
            post_id: id.to_string(),
            author_id: "a".to_string(),
            content: PostContent::new("h".to_string(), "d".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            updated_at: None,
        }
    }

    #[test]
    fn test_merge_newest_first_reorders_batches() {
        let mut posts = vec![post("a1", 5), post("a0", 1), post("b1", 7), post("b0", 3)];
        merge_newest_first(&mut posts);
        let ids: Vec<&str> = posts.iter().map(|p| p.post_id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "a1", "b0", "a0"]);
    }

    #[test]
    fn test_merge_truncates_to_limit() {
        let mut posts: Vec<Post> = (0..(FEED_LIMIT as i64 + 20))
            .map(|n| post(&format!("p{:03}", n), n))
            .collect();
        merge_newest_first(&mut posts);

        assert_eq!(posts.len(), FEED_LIMIT);
        assert_eq!(posts[0].post_id, format!("p{:03}", FEED_LIMIT + 19));
    }
}
