use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::{
    config::Config,
    infrastructure::{
        database::DocumentStore,
        identity::{IdentityVerifier, JwtVerifier, TokenGate},
        memory_database::MemoryStore,
        middleware::HasTokenGate,
        sqlite_database::SqliteStore,
    },
    services::{
        FeedAssembler, FollowGraphStore, GraphQueryEngine, LogNotifier, PostService,
        ProfileService, PushNotifier,
    },
};

/// Everything a request handler can reach. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub gate: TokenGate,
    pub follows: FollowGraphStore,
    pub graph: GraphQueryEngine,
    pub feed: FeedAssembler,
    pub posts: PostService,
    pub profiles: ProfileService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = if config.database.url == "memory" {
            info!("using in-memory document store");
            Arc::new(MemoryStore::new(config.database.max_in_values))
        } else {
            info!(url = %config.database.url, "using SQLite document store");
            ensure_database_dir(&config.database.url).await?;
            Arc::new(
                SqliteStore::connect(&config.database.url, config.database.max_in_values).await?,
            )
        };

        let verifier = Arc::new(JwtVerifier::new(
            &config.auth.jwt_secret,
            config.auth.issuer.as_deref(),
            config.auth.audience.as_deref(),
        ));

        Ok(Self::from_parts(store, verifier, Arc::new(LogNotifier)))
    }

    /// Wire the services over explicit collaborators.
    pub fn from_parts(
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn PushNotifier>,
    ) -> Self {
        let graph = GraphQueryEngine::new(store.clone());
        Self {
            gate: TokenGate::new(verifier),
            follows: FollowGraphStore::new(store.clone(), notifier),
            feed: FeedAssembler::new(store.clone(), graph.clone()),
            graph,
            posts: PostService::new(store.clone()),
            profiles: ProfileService::new(store),
        }
    }
}

/// Create the parent directory of a file-backed SQLite URL.
async fn ensure_database_dir(url: &str) -> anyhow::Result<()> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

impl HasTokenGate for AppState {
    fn token_gate(&self) -> &TokenGate {
        &self.gate
    }
}
