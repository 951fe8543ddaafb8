// Runs the token gate on every request and injects the ViewerContext into
// request extensions for handlers.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::infrastructure::identity::TokenGate;

/// Application state that carries the token gate.
pub trait HasTokenGate {
    fn token_gate(&self) -> &TokenGate;
}

/// Resolves the caller from the `Authorization` header. Requests without a
/// credential continue as anonymous viewers; gated operations reject them.
/// A credential the verifier refuses ends the request with `InvalidToken`.
pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    T: HasTokenGate + Clone + Send + Sync + 'static,
{
    let viewer_context = app_state
        .token_gate()
        .resolve_viewer(request.headers())
        .await?;

    request.extensions_mut().insert(Arc::new(viewer_context));

    Ok(next.run(request).await)
}
