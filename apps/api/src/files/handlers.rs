use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::files::reader::read_to_attachment;
use crate::files::validator::{rejection_notice, validate_files, RawFile, UploadsConfig};
use crate::models::chat::FileAttachment;
use crate::state::AppState;

/// The backend's upload policy, fetched once. A failed fetch falls back to
/// the built-in defaults for the rest of the process.
pub async fn current_uploads_config(state: &AppState) -> UploadsConfig {
    state
        .uploads
        .get_or_init(|| async {
            match state.backend.uploads_config().await {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("Using default upload policy, fetch failed: {e}");
                    UploadsConfig::default()
                }
            }
        })
        .await
        .clone()
}

/// GET /api/v1/uploads-config
pub async fn handle_uploads_config(State(state): State<AppState>) -> Json<UploadsConfig> {
    Json(current_uploads_config(&state).await)
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub pending: Vec<FileAttachment>,
    pub rejections: Vec<String>,
}

/// POST /api/v1/attachments
/// Accepts any number of `file` parts. Files are validated as one batch and
/// read in the order they arrived.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let mime = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))?;
        files.push(RawFile {
            name,
            size: bytes.len() as u64,
            mime,
            bytes,
        });
    }
    if files.is_empty() {
        return Err(AppError::Validation("No files in upload".to_string()));
    }

    let cfg = current_uploads_config(&state).await;
    let validation = validate_files(files, &cfg);
    let rejections: Vec<String> = validation
        .rejected
        .iter()
        .map(|r| rejection_notice(r, &cfg))
        .collect();

    let accepted: Vec<FileAttachment> = validation
        .accepted
        .into_iter()
        .map(read_to_attachment)
        .collect();
    info!(
        "Upload batch: {} accepted, {} rejected",
        accepted.len(),
        rejections.len()
    );

    let pending = state.session.add_pending(accepted, cfg.max_files);
    Ok(Json(UploadResponse {
        pending,
        rejections,
    }))
}

/// DELETE /api/v1/attachments/:id
pub async fn handle_remove_attachment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.session.remove_pending(&id) {
        return Err(AppError::NotFound(format!("Attachment {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
