use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::oauth::{build_oauth_url, OAuthProvider};
use crate::errors::AppError;
use crate::models::session::AuthTokens;
use crate::session::events::AppEvent;
use crate::session::store::{self, StoreKey};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OAuthUrlQuery {
    pub provider: OAuthProvider,
    pub redirect_uri: String,
}

#[derive(Serialize)]
pub struct OAuthUrlResponse {
    pub url: String,
}

/// GET /api/v1/auth/oauth-url
pub async fn handle_oauth_url(
    State(state): State<AppState>,
    Query(params): Query<OAuthUrlQuery>,
) -> Result<Json<OAuthUrlResponse>, AppError> {
    let url = build_oauth_url(params.provider, &params.redirect_uri, &state.config.oauth)?;
    Ok(Json(OAuthUrlResponse { url }))
}

/// POST /api/v1/session/login
/// Stores the token pair from an OAuth callback; the bootstrap listener
/// reloads the session on the resulting event.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(tokens): Json<AuthTokens>,
) -> Result<StatusCode, AppError> {
    if tokens.jwt_token.trim().is_empty() {
        return Err(AppError::Validation("jwtToken must not be empty".to_string()));
    }
    let store = state.store.as_ref();
    store::write(store, StoreKey::JwtToken, &tokens.jwt_token).await;
    store::write(store, StoreKey::RefreshToken, &tokens.refresh_token).await;

    info!("User logged in");
    state.events.publish(AppEvent::AuthLoggedIn);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/session/logout
pub async fn handle_logout(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = state.backend.logout().await {
        warn!("Backend logout failed, clearing local session anyway: {e}");
    }

    let store = state.store.as_ref();
    for key in [
        StoreKey::JwtToken,
        StoreKey::RefreshToken,
        StoreKey::TemporaryUserId,
        StoreKey::ChatId,
        StoreKey::CreditsRemaining,
        StoreKey::IsGuestSession,
    ] {
        store::forget(store, key).await;
    }
    state.session.reset();

    info!("User logged out");
    state.events.publish(AppEvent::AuthLoggedOut);
    StatusCode::NO_CONTENT
}
