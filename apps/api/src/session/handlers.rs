use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::session::bootstrap::{run_bootstrap, BootstrapOutcome};
use crate::state::AppState;

/// POST /api/v1/session/bootstrap
pub async fn handle_bootstrap(
    State(state): State<AppState>,
) -> Result<Json<BootstrapOutcome>, AppError> {
    let outcome = run_bootstrap(
        state.backend.as_ref(),
        state.store.as_ref(),
        &state.events,
        &state.session,
    )
    .await?
    .ok_or_else(|| AppError::Conflict("Session is closed".to_string()))?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub plan_id: String,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// POST /api/v1/credits/checkout
pub async fn handle_checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    if req.plan_id.trim().is_empty() {
        return Err(AppError::Validation("planId must not be empty".to_string()));
    }
    let url = state.backend.create_checkout_session(&req.plan_id).await?;
    info!("Created checkout session for plan {}", req.plan_id);
    Ok(Json(CheckoutResponse { url }))
}
