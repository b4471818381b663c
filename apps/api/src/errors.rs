use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::oauth::OAuthError;
use crate::chat::orchestrator::ChatError;
use crate::remote::RemoteError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::MessageNotFound(_) => AppError::NotFound(e.to_string()),
            ChatError::NoSnapshot(_) => AppError::Validation(e.to_string()),
            ChatError::Busy => AppError::Conflict(e.to_string()),
        }
    }
}

impl From<OAuthError> for AppError {
    fn from(e: OAuthError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Remote(e) => {
                tracing::warn!("Remote error: {e}");
                match e.status() {
                    Some(401) => (
                        StatusCode::UNAUTHORIZED,
                        "UNAUTHORIZED",
                        "Authentication required".to_string(),
                    ),
                    Some(429) => (
                        StatusCode::TOO_MANY_REQUESTS,
                        "RATE_LIMITED",
                        e.to_string(),
                    ),
                    _ => (
                        StatusCode::BAD_GATEWAY,
                        "REMOTE_ERROR",
                        crate::chat::classify::friendly_message(e).to_string(),
                    ),
                }
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_errors_map_to_statuses() {
        let busy: AppError = ChatError::Busy.into();
        assert_eq!(busy.into_response().status(), StatusCode::CONFLICT);

        let missing: AppError = ChatError::MessageNotFound("m1".to_string()).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let no_snapshot: AppError = ChatError::NoSnapshot("m1".to_string()).into();
        assert_eq!(no_snapshot.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_remote_errors_map_to_statuses() {
        let unauthorized = AppError::Remote(RemoteError::Status {
            status: 401,
            message: "expired".to_string(),
        });
        assert_eq!(unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);

        let down = AppError::Remote(RemoteError::Network("refused".to_string()));
        assert_eq!(down.into_response().status(), StatusCode::BAD_GATEWAY);

        let internal = AppError::Internal("task panicked".to_string());
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
