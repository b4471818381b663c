mod auth;
mod chat;
mod config;
mod errors;
mod files;
mod models;
mod remote;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::OnceCell;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::orchestrator::ChatSession;
use crate::config::Config;
use crate::remote::{ChatBackend, RemoteClient};
use crate::routes::build_router;
use crate::session::bootstrap::{run_bootstrap, spawn_auth_watcher};
use crate::session::events::EventBus;
use crate::session::store::{MemoryStore, RedisStore, SessionStore};
use crate::state::AppState;

const REDIS_KEY_PREFIX: &str = "resume-chat";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-chat v{}", env!("CARGO_PKG_VERSION"));

    // Session store: Redis when configured, process memory otherwise
    let store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Session store: Redis");
            Arc::new(RedisStore::new(client, REDIS_KEY_PREFIX))
        }
        None => {
            info!("Session store: in-memory");
            Arc::new(MemoryStore::new())
        }
    };

    let events = EventBus::default();

    // Remote backend client
    let backend: Arc<dyn ChatBackend> = Arc::new(RemoteClient::new(
        &config.resume_api_url,
        config.remote_timeout(),
        store.clone(),
        events.clone(),
    )?);
    info!("Resume backend: {}", config.resume_api_url);

    let session = Arc::new(ChatSession::new(backend.clone(), config.session_settings()));

    // Initial bootstrap runs in the background; the UI can poll /api/v1/chat meanwhile
    {
        let (backend, store, events, session) =
            (backend.clone(), store.clone(), events.clone(), session.clone());
        tokio::spawn(async move {
            match run_bootstrap(backend.as_ref(), store.as_ref(), &events, &session).await {
                Ok(Some(outcome)) => info!(
                    "Initial bootstrap loaded {} message(s) for chat {}",
                    outcome.messages_loaded, outcome.chat_id
                ),
                Ok(None) => {}
                Err(e) => warn!("Initial bootstrap failed: {e}"),
            }
        });
    }
    spawn_auth_watcher(backend.clone(), store.clone(), events.clone(), session.clone());

    // Build app state
    let state = AppState {
        session: session.clone(),
        backend,
        store,
        events,
        config: config.clone(),
        uploads: Arc::new(OnceCell::new()),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.close();
    info!("Session closed, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
