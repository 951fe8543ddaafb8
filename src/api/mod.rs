// REST surface - every route under /api/v1 passes through the token gate.

pub mod error;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{app_state::AppState, infrastructure::middleware::viewer_context_middleware};

pub fn create_api_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/users/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/users/push-token", put(handlers::register_push_token))
        .route(
            "/users/follow/{followee_id}",
            post(handlers::follow).delete(handlers::unfollow),
        )
        .route("/users/feed", get(handlers::feed))
        .route("/users/{user_id}/followers", get(handlers::followers))
        .route("/users/{user_id}/following", get(handlers::following))
        .route(
            "/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/posts/{post_id}",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
