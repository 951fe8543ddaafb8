// Post lifecycle - create, read, update and delete, all gated on the caller.

use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{Direction, DocumentStore, Query};
use crate::infrastructure::viewer::{Principal, ViewerContext};
use crate::models::{timestamp, Document, Post, PostContent, Record};
use crate::services::annotate::{annotate, annotate_all, Annotated};

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 100;

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn DocumentStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, vc, heading, description), fields(request_id = %vc.request_id))]
    pub async fn create_post(
        &self,
        vc: &ViewerContext,
        heading: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Annotated<Post>> {
        let principal = vc.principal()?;
        let (heading, description) = require_content(heading, description)?;

        let mut post = Post {
            post_id: String::new(),
            author_id: principal.id.clone(),
            content: PostContent::new(heading, description),
            created_at: timestamp::now(),
            updated_at: None,
        };
        post.post_id = self.store.insert(Post::COLLECTION, post.encode()?).await?;

        info!(post_id = %post.post_id, author = %post.author_id, "post created");
        Ok(annotate(post, principal))
    }

    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn get_post(&self, vc: &ViewerContext, post_id: &str) -> AppResult<Annotated<Post>> {
        let principal = vc.principal()?;
        let post = self.load(post_id).await?;
        Ok(annotate(post, principal))
    }

    /// All posts, newest first. `limit` defaults to [`DEFAULT_LIST_LIMIT`] and
    /// is capped at [`MAX_LIST_LIMIT`].
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn list_posts(
        &self,
        vc: &ViewerContext,
        limit: Option<usize>,
    ) -> AppResult<Vec<Annotated<Post>>> {
        let principal = vc.principal()?;
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

        let query = Query::new(Post::COLLECTION)
            .order_by(Post::CREATED_AT_FIELD, Direction::Descending)
            .limit(limit);
        let posts = self
            .store
            .query(&query)
            .await?
            .into_iter()
            .map(|row| Post::decode(&row.id, row.data))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(annotate_all(posts, principal))
    }

    /// Replace heading and description. Only the author may update.
    #[instrument(skip(self, vc, heading, description), fields(request_id = %vc.request_id))]
    pub async fn update_post(
        &self,
        vc: &ViewerContext,
        post_id: &str,
        heading: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Annotated<Post>> {
        let principal = vc.principal()?;
        let (heading, description) = require_content(heading, description)?;

        let mut post = self.load(post_id).await?;
        ensure_author(&post, principal, "update")?;

        let updated_at = timestamp::now();
        let patch = as_document(json!({
            "content": { "heading": heading, "description": description },
            "updatedAt": timestamp::format(&updated_at),
        }));
        if !self.store.update(Post::COLLECTION, post_id, patch).await? {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        post.content.heading = heading;
        post.content.description = description;
        post.updated_at = Some(updated_at);

        info!(post_id = %post_id, "post updated");
        Ok(annotate(post, principal))
    }

    /// Only the author may delete.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn delete_post(&self, vc: &ViewerContext, post_id: &str) -> AppResult<()> {
        let principal = vc.principal()?;

        let post = self.load(post_id).await?;
        ensure_author(&post, principal, "delete")?;

        if !self.store.delete(Post::COLLECTION, post_id).await? {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        info!(post_id = %post_id, "post deleted");
        Ok(())
    }

    async fn load(&self, post_id: &str) -> AppResult<Post> {
        let row = self
            .store
            .get(Post::COLLECTION, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;
        Post::decode(&row.id, row.data)
    }
}

fn require_content(
    heading: Option<&str>,
    description: Option<&str>,
) -> AppResult<(String, String)> {
    let heading = non_blank(heading).ok_or(AppError::MissingField("heading"))?;
    let description = non_blank(description).ok_or(AppError::MissingField("description"))?;
    Ok((heading, description))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn ensure_author(post: &Post, principal: &Principal, action: &str) -> AppResult<()> {
    if post.author_id != principal.id {
        return Err(AppError::NotAuthorized(format!(
            "only the author may {} post {}",
            action, post.post_id
        )));
    }
    Ok(())
}

fn as_document(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(doc) => doc,
        _ => Document::new(),
    }
}
