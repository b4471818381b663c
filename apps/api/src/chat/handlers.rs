use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chat::orchestrator::SubmitOutcome;
use crate::errors::AppError;
use crate::models::chat::ChatStateView;
use crate::session::store::{self, StoreKey};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub result: SubmitOutcome,
    pub state: ChatStateView,
}

/// GET /api/v1/chat
pub async fn handle_get_chat(State(state): State<AppState>) -> Json<ChatStateView> {
    Json(state.session.snapshot())
}

/// POST /api/v1/chat/submit
/// Sends the message together with whatever attachments are pending.
pub async fn handle_submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let attachments = state.session.pending_attachments();
    if req.message.trim().is_empty() && attachments.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    // The turn runs in its own task so a client disconnect cannot cancel it
    // halfway through.
    let session = state.session.clone();
    let message = req.message.trim().to_string();
    let result = tokio::spawn(async move { session.submit(&message, attachments).await })
        .await
        .map_err(|e| AppError::Internal(format!("chat turn task failed: {e}")))?;
    Ok(Json(SubmitResponse {
        result,
        state: state.session.snapshot(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertRequest {
    pub message_id: String,
}

/// POST /api/v1/chat/revert
pub async fn handle_revert(
    State(state): State<AppState>,
    Json(req): Json<RevertRequest>,
) -> Result<Json<ChatStateView>, AppError> {
    state.session.revert_to(&req.message_id)?;
    Ok(Json(state.session.snapshot()))
}

#[derive(Deserialize, Serialize)]
pub struct TitleBody {
    pub title: String,
}

/// PATCH /api/v1/chat/title
/// The local title changes immediately; the backend copy is best-effort.
pub async fn handle_update_title(
    State(state): State<AppState>,
    Json(req): Json<TitleBody>,
) -> Result<Json<TitleBody>, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    state.session.set_title(title.to_string());

    if let Some(chat_id) = store::read(state.store.as_ref(), StoreKey::ChatId).await {
        match state.backend.update_chat_title(&chat_id, title).await {
            Ok(saved) => state.session.set_title(saved),
            Err(e) => warn!("Failed to persist title for chat {chat_id}: {e}"),
        }
    }
    Ok(Json(TitleBody {
        title: state.session.title(),
    }))
}

#[derive(Deserialize)]
pub struct DocumentBody {
    pub markdown: String,
}

/// PUT /api/v1/document
/// Manual edit from the editor pane. Not recorded in the chat log.
pub async fn handle_set_document(
    State(state): State<AppState>,
    Json(req): Json<DocumentBody>,
) -> Json<ChatStateView> {
    state.session.set_document(req.markdown);
    Json(state.session.snapshot())
}

#[derive(Deserialize)]
pub struct RewriteRequest {
    pub selection: String,
}

#[derive(Serialize)]
pub struct RewriteResponse {
    pub text: String,
}

/// POST /api/v1/document/rewrite
pub async fn handle_rewrite(
    State(state): State<AppState>,
    Json(req): Json<RewriteRequest>,
) -> Result<Json<RewriteResponse>, AppError> {
    if req.selection.trim().is_empty() {
        return Err(AppError::Validation("selection must not be empty".to_string()));
    }
    let text = state.backend.rewrite(&req.selection).await?;
    Ok(Json(RewriteResponse { text }))
}
