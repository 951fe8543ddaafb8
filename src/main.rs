// Social graph server

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use social_graph::{api::create_api_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("social_graph=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;
    let app = create_api_router(app_state);

    let listener = TcpListener::bind(config.server_address()).await?;
    info!("social graph server listening on http://{}", listener.local_addr()?);
    info!("  GET    /health");
    info!("  GET    /api/v1/users/profile              PUT  /api/v1/users/profile");
    info!("  PUT    /api/v1/users/push-token");
    info!("  POST   /api/v1/users/follow/{{followee_id}} DELETE same");
    info!("  GET    /api/v1/users/{{user_id}}/followers  GET  /api/v1/users/{{user_id}}/following");
    info!("  GET    /api/v1/users/feed");
    info!("  GET    /api/v1/posts                      POST /api/v1/posts");
    info!("  GET|PUT|DELETE /api/v1/posts/{{post_id}}");

    axum::serve(listener, app).await?;

    Ok(())
}
