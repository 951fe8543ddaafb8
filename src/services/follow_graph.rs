// Follow graph writes - create and remove directed follow edges.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentStore, Query};
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{timestamp, FollowEdge, PushToken, Record, UserProfile};
use crate::services::annotate::{annotate, Annotated};
use crate::services::notifications::{PushMessage, PushNotifier};

#[derive(Clone)]
pub struct FollowGraphStore {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn PushNotifier>,
}

impl FollowGraphStore {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn PushNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Make the caller follow `followee_id`.
    ///
    /// The existence check and insert are one atomic store call, so
    /// concurrent requests for the same pair create a single edge. A
    /// "new follower" push is sent in the background on success.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn follow(
        &self,
        vc: &ViewerContext,
        followee_id: &str,
    ) -> AppResult<Annotated<FollowEdge>> {
        let principal = vc.principal()?;
        if principal.id == followee_id {
            return Err(AppError::SelfFollow);
        }

        let mut edge = FollowEdge {
            edge_id: String::new(),
            follower_id: principal.id.clone(),
            followee_id: followee_id.to_string(),
            created_at: timestamp::now(),
        };

        let inserted = self
            .store
            .insert_unique(
                FollowEdge::COLLECTION,
                &FollowEdge::pair_key(&edge.follower_id, &edge.followee_id),
                edge.encode()?,
            )
            .await?;

        edge.edge_id = inserted.ok_or(AppError::AlreadyFollowing)?;
        info!(follower = %edge.follower_id, followee = %edge.followee_id, "follow created");

        self.spawn_follow_notification(edge.follower_id.clone(), edge.followee_id.clone());
        Ok(annotate(edge, principal))
    }

    /// Remove the caller's edge to `followee_id`.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn unfollow(&self, vc: &ViewerContext, followee_id: &str) -> AppResult<()> {
        let principal = vc.principal()?;

        let edge = self
            .find_edge(&principal.id, followee_id)
            .await?
            .ok_or(AppError::NotFollowing)?;

        // A concurrent unfollow may have removed it since the lookup.
        if !self.store.delete(FollowEdge::COLLECTION, &edge.edge_id).await? {
            return Err(AppError::NotFollowing);
        }

        info!(follower = %principal.id, followee = %followee_id, "follow removed");
        Ok(())
    }

    /// The edge for the exact (follower, followee) pair, if any.
    pub async fn find_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<FollowEdge>> {
        let query = Query::new(FollowEdge::COLLECTION)
            .where_eq(FollowEdge::FOLLOWER_FIELD, follower_id)
            .where_eq(FollowEdge::FOLLOWEE_FIELD, followee_id)
            .limit(1);

        self.store
            .query(&query)
            .await?
            .into_iter()
            .next()
            .map(|row| FollowEdge::decode(&row.id, row.data))
            .transpose()
    }

    fn spawn_follow_notification(&self, follower_id: String, followee_id: String) {
        let store = self.store.clone();
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            if let Err(err) =
                notify_new_follower(store.as_ref(), notifier.as_ref(), &follower_id, &followee_id)
                    .await
            {
                warn!(
                    follower = %follower_id,
                    followee = %followee_id,
                    error = %err,
                    "failed to send follow notification"
                );
            }
        });
    }
}

async fn notify_new_follower(
    store: &dyn DocumentStore,
    notifier: &dyn PushNotifier,
    follower_id: &str,
    followee_id: &str,
) -> anyhow::Result<()> {
    let Some(row) = store.get(PushToken::COLLECTION, followee_id).await? else {
        debug!(followee = %followee_id, "no push token registered");
        return Ok(());
    };
    let token = PushToken::decode(&row.id, row.data)?;

    let follower_name = match store.get(UserProfile::COLLECTION, follower_id).await? {
        Some(row) => {
            let profile = UserProfile::decode(&row.id, row.data)?;
            if profile.display_name.is_empty() {
                follower_id.to_string()
            } else {
                profile.display_name
            }
        }
        None => follower_id.to_string(),
    };

    notifier
        .send(PushMessage::new_follower(token.token, &follower_name))
        .await
}
