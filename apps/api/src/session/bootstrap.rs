//! Session bootstrap: resolves the guest or authenticated identity, persists
//! the issued ids and tokens, then seeds the chat session from the backend.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::chat::orchestrator::ChatSession;
use crate::models::session::BootstrapBundle;
use crate::remote::{ChatBackend, RemoteError};
use crate::session::events::{AppEvent, EventBus};
use crate::session::store::{self, SessionStore, StoreKey};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapOutcome {
    pub is_guest: bool,
    pub chat_id: String,
    pub messages_loaded: usize,
}

/// Runs the bootstrap flow against `backend`.
///
/// Returns `Ok(None)` when the session was closed while a request was in
/// flight; nothing is applied to it in that case. History fetch failures are
/// logged and leave the log untouched.
pub async fn run_bootstrap(
    backend: &dyn ChatBackend,
    store: &dyn SessionStore,
    events: &EventBus,
    session: &ChatSession,
) -> Result<Option<BootstrapOutcome>, RemoteError> {
    let existing_guest = store::read(store, StoreKey::TemporaryUserId).await;
    let bundle = backend.bootstrap(existing_guest.as_deref()).await?;
    if !session.is_active() {
        return Ok(None);
    }

    let (is_guest, credits, title) = match &bundle {
        BootstrapBundle::Guest(guest) => {
            store::write(store, StoreKey::TemporaryUserId, &guest.temporary_user_id).await;
            store::write(store, StoreKey::ChatId, &guest.chat_id).await;
            store::write(store, StoreKey::IsGuestSession, "true").await;
            if let Some(jwt) = &guest.jwt_token {
                store::write(store, StoreKey::JwtToken, jwt).await;
            }
            if let Some(refresh) = &guest.refresh_token {
                store::write(store, StoreKey::RefreshToken, refresh).await;
            }
            (true, guest.credits, guest.chat_title.clone())
        }
        BootstrapBundle::Authenticated(auth) => {
            if auth.is_guest_user {
                // Guest-backed JWT: the temporary id stays so the identity survives.
                store::write(store, StoreKey::IsGuestSession, "true").await;
            } else {
                store::forget(store, StoreKey::TemporaryUserId).await;
                store::forget(store, StoreKey::IsGuestSession).await;
            }
            store::write(store, StoreKey::ChatId, &auth.chat_id).await;
            (auth.is_guest_user, auth.credits, auth.chat_title.clone())
        }
    };
    events.publish(AppEvent::GuestSessionChanged { is_guest });

    if let Some(credits) = credits {
        session.set_credits(credits);
        store::write(store, StoreKey::CreditsRemaining, &credits.to_string()).await;
    }
    if let Some(title) = title {
        session.set_title(title);
    }

    let chat_id = bundle.chat_id().to_string();
    info!("Bootstrapped {} session for chat {chat_id}", if is_guest { "guest" } else { "user" });

    let mut messages_loaded = 0;
    match backend.chat_history(&chat_id, existing_guest.as_deref()).await {
        Ok(history) if session.is_active() => {
            messages_loaded = history.len();
            session.load_history(history);
        }
        Ok(_) => return Ok(None),
        Err(e) => warn!("Failed to load chat history for {chat_id}: {e}"),
    }

    Ok(Some(BootstrapOutcome {
        is_guest,
        chat_id,
        messages_loaded,
    }))
}

/// Re-runs the bootstrap whenever the user logs in or out. Stops at the
/// first auth event after the session has been closed.
pub fn spawn_auth_watcher(
    backend: Arc<dyn ChatBackend>,
    store: Arc<dyn SessionStore>,
    events: EventBus,
    session: Arc<ChatSession>,
) -> JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(AppEvent::AuthLoggedIn | AppEvent::AuthLoggedOut) => {
                    if !session.is_active() {
                        break;
                    }
                    if let Err(e) =
                        run_bootstrap(backend.as_ref(), store.as_ref(), &events, &session).await
                    {
                        warn!("Bootstrap after auth change failed: {e}");
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!("Auth watcher skipped {skipped} events"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}
