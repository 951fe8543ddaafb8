// Graph queries - followers/following views derived from follow edges.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::AppResult;
use crate::infrastructure::batch::get_many_chunked;
use crate::infrastructure::database::{Direction, DocumentStore, Query, StoredDocument};
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{FollowEdge, Record, UserProfile};
use crate::services::annotate::{annotate_all, Annotated};

#[derive(Clone)]
pub struct GraphQueryEngine {
    store: Arc<dyn DocumentStore>,
}

impl GraphQueryEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Profiles of users following `user_id`, oldest follow first. Any
    /// authenticated caller may look at any user.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn followers(
        &self,
        vc: &ViewerContext,
        user_id: &str,
    ) -> AppResult<Vec<Annotated<UserProfile>>> {
        let principal = vc.principal()?;
        let edges = self.edges_where(FollowEdge::FOLLOWEE_FIELD, user_id).await?;
        let ids = distinct(edges.into_iter().map(|e| e.follower_id));
        let profiles = self.resolve_profiles(&ids).await?;
        Ok(annotate_all(profiles, principal))
    }

    /// Profiles of users `user_id` follows, oldest follow first.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn following(
        &self,
        vc: &ViewerContext,
        user_id: &str,
    ) -> AppResult<Vec<Annotated<UserProfile>>> {
        let principal = vc.principal()?;
        let ids = self.following_ids(user_id).await?;
        let profiles = self.resolve_profiles(&ids).await?;
        Ok(annotate_all(profiles, principal))
    }

    /// Distinct ids of the users `user_id` follows.
    pub async fn following_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        let edges = self.edges_where(FollowEdge::FOLLOWER_FIELD, user_id).await?;
        Ok(distinct(edges.into_iter().map(|e| e.followee_id)))
    }

    async fn edges_where(&self, field: &str, user_id: &str) -> AppResult<Vec<FollowEdge>> {
        let query = Query::new(FollowEdge::COLLECTION)
            .where_eq(field, user_id)
            .order_by(FollowEdge::CREATED_AT_FIELD, Direction::Ascending);

        self.store
            .query(&query)
            .await?
            .into_iter()
            .map(|row| FollowEdge::decode(&row.id, row.data))
            .collect()
    }

    /// Batch-resolve ids to profiles, keeping the order of `ids`. Users that
    /// never created a profile are left out.
    async fn resolve_profiles(&self, ids: &[String]) -> AppResult<Vec<UserProfile>> {
        let rows = get_many_chunked(self.store.as_ref(), UserProfile::COLLECTION, ids).await?;
        if rows.len() < ids.len() {
            debug!(
                requested = ids.len(),
                found = rows.len(),
                "some graph members have no profile"
            );
        }

        let mut by_id: HashMap<String, StoredDocument> =
            rows.into_iter().map(|row| (row.id.clone(), row)).collect();
        ids.iter()
            .filter_map(|id| by_id.remove(id))
            .map(|row| UserProfile::decode(&row.id, row.data))
            .collect()
    }
}

fn distinct(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        let ids = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string());
        assert_eq!(distinct(ids), vec!["b", "a", "c"]);
    }
}
