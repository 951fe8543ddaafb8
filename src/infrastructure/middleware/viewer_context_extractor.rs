// Vc extractor - hands handlers the request's ViewerContext.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::error::AppError;
use crate::infrastructure::viewer::ViewerContext;

/// Cheaply clonable handle to the request's [`ViewerContext`].
///
/// ```ignore
/// async fn handler(State(state): State<AppState>, vc: Vc) -> AppResult<Json<Value>> {
///     let feed = state.feed.feed(&vc).await?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Without the middleware in front there is no viewer, which is treated the
// same as a request without a credential.
impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let vc = parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or(AppError::Unauthenticated);

        async move { vc }
    }
}
