// Request handlers - thin adapters from HTTP to the services.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    error::AppResult,
    infrastructure::middleware::Vc,
    models::{FollowEdge, Post, UserProfile},
    services::{Annotated, FeedEntry, ProfileUpdate},
};

#[derive(Debug, Deserialize)]
pub struct PostBody {
    pub heading: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PushTokenBody {
    pub token: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// Profile

pub async fn get_profile(State(state): State<AppState>, vc: Vc) -> AppResult<Json<UserProfile>> {
    Ok(Json(state.profiles.get_profile(&vc).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    vc: Vc,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(state.profiles.upsert_profile(&vc, update).await?))
}

pub async fn register_push_token(
    State(state): State<AppState>,
    vc: Vc,
    Json(body): Json<PushTokenBody>,
) -> AppResult<StatusCode> {
    state
        .profiles
        .register_push_token(&vc, body.token.as_deref().unwrap_or_default())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Follow graph

pub async fn follow(
    State(state): State<AppState>,
    vc: Vc,
    Path(followee_id): Path<String>,
) -> AppResult<(StatusCode, Json<Annotated<FollowEdge>>)> {
    let edge = state.follows.follow(&vc, &followee_id).await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

pub async fn unfollow(
    State(state): State<AppState>,
    vc: Vc,
    Path(followee_id): Path<String>,
) -> AppResult<StatusCode> {
    state.follows.unfollow(&vc, &followee_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn followers(
    State(state): State<AppState>,
    vc: Vc,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Annotated<UserProfile>>>> {
    Ok(Json(state.graph.followers(&vc, &user_id).await?))
}

pub async fn following(
    State(state): State<AppState>,
    vc: Vc,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Annotated<UserProfile>>>> {
    Ok(Json(state.graph.following(&vc, &user_id).await?))
}

pub async fn feed(State(state): State<AppState>, vc: Vc) -> AppResult<Json<Vec<FeedEntry>>> {
    Ok(Json(state.feed.feed(&vc).await?))
}

// Posts

pub async fn list_posts(
    State(state): State<AppState>,
    vc: Vc,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Annotated<Post>>>> {
    Ok(Json(state.posts.list_posts(&vc, params.limit).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    vc: Vc,
    Json(body): Json<PostBody>,
) -> AppResult<(StatusCode, Json<Annotated<Post>>)> {
    let post = state
        .posts
        .create_post(&vc, body.heading.as_deref(), body.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<Json<Annotated<Post>>> {
    Ok(Json(state.posts.get_post(&vc, &post_id).await?))
}

pub async fn update_post(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
    Json(body): Json<PostBody>,
) -> AppResult<Json<Annotated<Post>>> {
    let post = state
        .posts
        .update_post(
            &vc,
            &post_id,
            body.heading.as_deref(),
            body.description.as_deref(),
        )
        .await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<StatusCode> {
    state.posts.delete_post(&vc, &post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
