// HTTP rendering of AppError. Status codes live here and nowhere else.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::AppError;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::SelfFollow | AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyFollowing => StatusCode::CONFLICT,
            AppError::NotFollowing | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Storage(err) => {
                tracing::error!("Storage error: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
