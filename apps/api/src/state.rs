use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::chat::orchestrator::ChatSession;
use crate::config::Config;
use crate::files::validator::UploadsConfig;
use crate::remote::ChatBackend;
use crate::session::events::EventBus;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<ChatSession>,
    /// Pluggable backend. Default: RemoteClient against RESUME_API_URL.
    pub backend: Arc<dyn ChatBackend>,
    pub store: Arc<dyn SessionStore>,
    pub events: EventBus,
    pub config: Config,
    /// Upload policy, fetched from the backend once per process.
    pub uploads: Arc<OnceCell<UploadsConfig>>,
}
