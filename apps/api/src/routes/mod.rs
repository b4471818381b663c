pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::auth::handlers as auth;
use crate::chat::handlers as chat;
use crate::files::handlers as files;
use crate::session::handlers as session;
use crate::state::AppState;

/// Multipart uploads may carry several files at the policy's size limit.
const UPLOAD_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat
        .route("/api/v1/chat", get(chat::handle_get_chat))
        .route("/api/v1/chat/submit", post(chat::handle_submit))
        .route("/api/v1/chat/revert", post(chat::handle_revert))
        .route("/api/v1/chat/title", patch(chat::handle_update_title))
        // Document
        .route("/api/v1/document", put(chat::handle_set_document))
        .route("/api/v1/document/rewrite", post(chat::handle_rewrite))
        // Attachments
        .route(
            "/api/v1/attachments",
            post(files::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/attachments/:id",
            delete(files::handle_remove_attachment),
        )
        .route("/api/v1/uploads-config", get(files::handle_uploads_config))
        // Session and auth
        .route("/api/v1/session/bootstrap", post(session::handle_bootstrap))
        .route("/api/v1/session/login", post(auth::handle_login))
        .route("/api/v1/session/logout", post(auth::handle_logout))
        .route("/api/v1/auth/oauth-url", get(auth::handle_oauth_url))
        .route("/api/v1/credits/checkout", post(session::handle_checkout))
        .with_state(state)
}
