#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use social_graph::{
    app_state::AppState,
    infrastructure::{
        DocumentStore, JwtVerifier, MemoryStore, Principal, Query, StoredDocument, ViewerContext,
    },
    models::{Document, Post, PostContent, Record, UserProfile},
    services::{LogNotifier, PushMessage, PushNotifier},
    AppError, AppResult,
};

pub const SECRET: &str = "integration-secret";

pub fn viewer(uid: &str) -> ViewerContext {
    ViewerContext::authenticated(Principal::new(uid), format!("test-{}", uid))
}

pub fn anonymous() -> ViewerContext {
    ViewerContext::anonymous("test-anon")
}

pub fn state_with(store: Arc<dyn DocumentStore>, notifier: Arc<dyn PushNotifier>) -> AppState {
    AppState::from_parts(
        store,
        Arc::new(JwtVerifier::new(SECRET, None, None)),
        notifier,
    )
}

/// State over a memory store with the given `In` limit.
pub fn memory_state(max_in_values: usize) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(max_in_values));
    let state = state_with(store.clone(), Arc::new(LogNotifier));
    (state, store)
}

pub fn token_for(uid: &str) -> String {
    let claims = json!({
        "sub": uid,
        "email": format!("{}@example.com", uid),
        "exp": Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn at_minute(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
}

pub async fn seed_profile(store: &dyn DocumentStore, uid: &str, display_name: &str) {
    let profile = UserProfile {
        uid: uid.to_string(),
        email: Some(format!("{}@example.com", uid)),
        display_name: display_name.to_string(),
        phone_number: None,
        created_at: at_minute(0),
        updated_at: None,
    };
    store
        .put(UserProfile::COLLECTION, uid, profile.encode().unwrap())
        .await
        .unwrap();
}

/// Insert a post with a fixed creation time and return its id.
pub async fn seed_post(store: &dyn DocumentStore, author: &str, heading: &str, minute: i64) -> String {
    let post = Post {
        post_id: String::new(),
        author_id: author.to_string(),
        content: PostContent::new(heading.to_string(), format!("{} body", heading)),
        created_at: at_minute(minute),
        updated_at: None,
    };
    store
        .insert(Post::COLLECTION, post.encode().unwrap())
        .await
        .unwrap()
}

/// Forwards every push message to a channel.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<PushMessage>,
}

impl RecordingNotifier {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PushMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl PushNotifier for RecordingNotifier {
    async fn send(&self, message: PushMessage) -> anyhow::Result<()> {
        self.tx.send(message)?;
        Ok(())
    }
}

/// Always fails delivery.
pub struct FailingNotifier {
    pub attempts: Mutex<u32>,
}

#[async_trait]
impl PushNotifier for FailingNotifier {
    async fn send(&self, _message: PushMessage) -> anyhow::Result<()> {
        *self.attempts.lock().await += 1;
        anyhow::bail!("push gateway unavailable")
    }
}

/// Store whose every call fails, as an unreachable database would.
pub struct FailingStore;

fn store_down<T>() -> AppResult<T> {
    Err(AppError::Storage(anyhow::anyhow!("database unavailable")))
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert(&self, _collection: &str, _doc: Document) -> AppResult<String> {
        store_down()
    }

    async fn insert_unique(
        &self,
        _collection: &str,
        _unique_key: &str,
        _doc: Document,
    ) -> AppResult<Option<String>> {
        store_down()
    }

    async fn put(&self, _collection: &str, _id: &str, _doc: Document) -> AppResult<()> {
        store_down()
    }

    async fn get(&self, _collection: &str, _id: &str) -> AppResult<Option<StoredDocument>> {
        store_down()
    }

    async fn get_many(&self, _collection: &str, _ids: &[String]) -> AppResult<Vec<StoredDocument>> {
        store_down()
    }

    async fn query(&self, _query: &Query) -> AppResult<Vec<StoredDocument>> {
        store_down()
    }

    async fn update(&self, _collection: &str, _id: &str, _patch: Document) -> AppResult<bool> {
        store_down()
    }

    async fn delete(&self, _collection: &str, _id: &str) -> AppResult<bool> {
        store_down()
    }

    fn max_in_values(&self) -> usize {
        10
    }
}
