//! Remote client: the single point of entry for all calls to the resume-AI backend.
//!
//! The backend performs the actual resume editing; this module only shapes
//! requests, attaches credentials and decodes replies. A 401 triggers one
//! re-authentication attempt (refresh token, then guest reissue) and a
//! single retry. Nothing else is retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::files::validator::UploadsConfig;
use crate::models::chat::ChatMessage;
use crate::models::session::BootstrapBundle;
use crate::session::events::{AppEvent, EventBus, RateLimitNotice};
use crate::session::store::{self, SessionStore, StoreKey};

pub mod types;

pub use types::{ChatReply, ChatRequest};

use types::{
    ChatBody, ChatResponse, CheckoutResponse, ErrorBody, RefreshResponse, RewriteResponse,
    TitleResponse,
};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("Failed to process chat request")]
    Empty,

    #[error("operation not supported by this backend")]
    Unsupported,
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::Parse(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown error").to_string(),
            }
        } else {
            RemoteError::Network(e.to_string())
        }
    }
}

/// The backend seam. `RemoteClient` is the production implementation;
/// tests swap in fakes.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, RemoteError>;

    async fn bootstrap(
        &self,
        _temporary_user_id: Option<&str>,
    ) -> Result<BootstrapBundle, RemoteError> {
        Err(RemoteError::Unsupported)
    }

    async fn chat_history(
        &self,
        _chat_id: &str,
        _temporary_user_id: Option<&str>,
    ) -> Result<Vec<ChatMessage>, RemoteError> {
        Err(RemoteError::Unsupported)
    }

    async fn uploads_config(&self) -> Result<UploadsConfig, RemoteError> {
        Err(RemoteError::Unsupported)
    }

    async fn update_chat_title(&self, _chat_id: &str, _title: &str) -> Result<String, RemoteError> {
        Err(RemoteError::Unsupported)
    }

    async fn rewrite(&self, _selection: &str) -> Result<String, RemoteError> {
        Err(RemoteError::Unsupported)
    }

    async fn logout(&self) -> Result<(), RemoteError> {
        Err(RemoteError::Unsupported)
    }

    async fn create_checkout_session(&self, _plan_id: &str) -> Result<String, RemoteError> {
        Err(RemoteError::Unsupported)
    }
}

#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    events: EventBus,
}

impl RemoteClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn SessionStore>,
        events: EventBus,
    ) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            events,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read(&self, key: StoreKey) -> Option<String> {
        store::read(self.store.as_ref(), key).await
    }

    /// Guest id to pass as a query parameter when there is no JWT to send.
    async fn guest_query(&self) -> Option<String> {
        if self.read(StoreKey::JwtToken).await.is_some() {
            return None;
        }
        self.read(StoreKey::TemporaryUserId).await
    }

    /// Sends a request built by `build`, attaching the stored bearer token.
    /// `build` is called again for the retry after a successful re-auth.
    async fn send<F>(&self, build: F) -> Result<Response, RemoteError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let token = self.read(StoreKey::JwtToken).await;
        let response = with_bearer(build(), token.as_deref()).send().await?;

        match response.status().as_u16() {
            401 => match self.reauthenticate().await {
                Some(jwt) => {
                    info!("Re-authenticated after 401, retrying request");
                    Ok(with_bearer(build(), Some(&jwt)).send().await?)
                }
                None => Ok(response),
            },
            429 => {
                let notice: RateLimitNotice = response.json().await.unwrap_or_default();
                let message = notice
                    .message
                    .clone()
                    .unwrap_or_else(|| "Too Many Requests".to_string());
                warn!("Backend rate limited the session: {message}");
                self.events.publish(AppEvent::RateLimited(notice));
                Err(RemoteError::Status {
                    status: 429,
                    message,
                })
            }
            500 => {
                let body = response.text().await.unwrap_or_default();
                if let Some(message) = wrapped_auth_error(&body) {
                    self.events.publish(AppEvent::AuthError {
                        message: message.clone(),
                    });
                    return Err(RemoteError::Status {
                        status: 401,
                        message,
                    });
                }
                Err(RemoteError::Status {
                    status: 500,
                    message: error_message(&body, "Internal Server Error"),
                })
            }
            _ => Ok(response),
        }
    }

    /// Refresh-token exchange first, then a bootstrap reissue for the stored
    /// guest id. Returns the new JWT when either succeeds.
    async fn reauthenticate(&self) -> Option<String> {
        if let Some(refresh) = self.read(StoreKey::RefreshToken).await {
            match self
                .http
                .post(self.url("/api/auth/refresh"))
                .bearer_auth(&refresh)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<RefreshResponse>().await {
                        Ok(RefreshResponse { auth: Some(tokens) }) => {
                            store::write(self.store.as_ref(), StoreKey::JwtToken, &tokens.jwt_token)
                                .await;
                            store::write(
                                self.store.as_ref(),
                                StoreKey::RefreshToken,
                                &tokens.refresh_token,
                            )
                            .await;
                            return Some(tokens.jwt_token);
                        }
                        Ok(_) => debug!("Refresh response carried no tokens"),
                        Err(e) => warn!("Failed to decode refresh response: {e}"),
                    }
                }
                Ok(resp) => debug!("Token refresh rejected with {}", resp.status()),
                Err(e) => warn!("Token refresh failed: {e}"),
            }
        }

        let temporary_user_id = self.read(StoreKey::TemporaryUserId).await?;
        let resp = match self
            .http
            .get(self.url("/api/bootstrap"))
            .query(&[("temporaryUserId", temporary_user_id.as_str())])
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!("Guest reissue rejected with {}", resp.status());
                return None;
            }
            Err(e) => {
                warn!("Guest reissue failed: {e}");
                return None;
            }
        };

        let boot: Value = resp.json().await.ok()?;
        let jwt = boot.get("jwtToken").and_then(Value::as_str)?.to_string();
        let refresh = boot.get("refreshToken").and_then(Value::as_str)?.to_string();

        let store = self.store.as_ref();
        store::write(store, StoreKey::JwtToken, &jwt).await;
        store::write(store, StoreKey::RefreshToken, &refresh).await;
        if let Some(id) = boot.get("temporaryUserId").and_then(id_value) {
            store::write(store, StoreKey::TemporaryUserId, &id).await;
        }
        if let Some(id) = boot.get("chatId").and_then(id_value) {
            store::write(store, StoreKey::ChatId, &id).await;
        }
        Some(jwt)
    }
}

#[async_trait]
impl ChatBackend for RemoteClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, RemoteError> {
        let chat_id = self.read(StoreKey::ChatId).await;
        let guest = self.guest_query().await;
        let url = self.url("/api/ai/chat");

        let uploads: Vec<_> = request
            .files
            .iter()
            .filter_map(|a| a.file.as_ref().map(|bytes| (a.name.as_str(), a.mime.as_str(), bytes)))
            .collect();

        let response = if uploads.is_empty() {
            let body = ChatBody {
                user_message: &request.user_message,
                current_resume_markdown: &request.current_resume_markdown,
                chat_history: &request.chat_history,
                chat_id: chat_id.as_deref(),
            };
            self.send(|| with_guest(self.http.post(&url), guest.as_deref()).json(&body))
                .await?
        } else {
            let history_json = serde_json::to_string(&request.chat_history)
                .map_err(|e| RemoteError::Parse(e.to_string()))?;
            debug!("Uploading {} file(s) with chat turn", uploads.len());
            self.send(|| {
                let mut form = Form::new()
                    .text("user_message", request.user_message.clone())
                    .text("current_resume_markdown", request.current_resume_markdown.clone())
                    .text("chat_history", history_json.clone());
                if let Some(id) = &chat_id {
                    form = form.text("chatId", id.clone());
                }
                for (name, mime, bytes) in &uploads {
                    form = form.part("files", file_part(name, mime, bytes));
                }
                with_guest(self.http.post(&url), guest.as_deref()).multipart(form)
            })
            .await?
        };

        let parsed: Option<ChatResponse> = decode(response).await?;
        let parsed = parsed.ok_or(RemoteError::Empty)?;
        Ok(parsed.into_reply(&request.current_resume_markdown))
    }

    async fn bootstrap(
        &self,
        temporary_user_id: Option<&str>,
    ) -> Result<BootstrapBundle, RemoteError> {
        let url = self.url("/api/bootstrap");
        let response = self
            .send(|| {
                let req = self.http.get(&url);
                match temporary_user_id {
                    Some(id) => req.query(&[("temporaryUserId", id)]),
                    None => req,
                }
            })
            .await?;
        decode(response).await
    }

    async fn chat_history(
        &self,
        chat_id: &str,
        temporary_user_id: Option<&str>,
    ) -> Result<Vec<ChatMessage>, RemoteError> {
        let url = self.url("/api/ai/chat/history");
        let response = self
            .send(|| {
                let req = self.http.get(&url).query(&[("chatId", chat_id)]);
                match temporary_user_id {
                    Some(id) => req.query(&[("temporaryUserId", id)]),
                    None => req,
                }
            })
            .await?;
        let history: Option<Vec<ChatMessage>> = decode(response).await?;
        Ok(history.unwrap_or_default())
    }

    async fn uploads_config(&self) -> Result<UploadsConfig, RemoteError> {
        let url = self.url("/api/uploads-config");
        let response = self.send(|| self.http.get(&url)).await?;
        decode(response).await
    }

    async fn update_chat_title(&self, chat_id: &str, title: &str) -> Result<String, RemoteError> {
        let url = self.url("/api/ai/chat/title");
        let body = json!({ "chatId": chat_id, "title": title });
        let response = self.send(|| self.http.patch(&url).json(&body)).await?;
        let parsed: TitleResponse = decode(response).await?;
        Ok(parsed.title)
    }

    async fn rewrite(&self, selection: &str) -> Result<String, RemoteError> {
        let url = self.url("/api/ai/rewrite");
        let body = json!({ "selection": selection });
        let response = self.send(|| self.http.post(&url).json(&body)).await?;
        let parsed: RewriteResponse = decode(response).await?;
        Ok(parsed.text)
    }

    async fn logout(&self) -> Result<(), RemoteError> {
        let refresh = self.read(StoreKey::RefreshToken).await;
        let url = self.url("/api/auth/logout");
        let body = json!({ "refreshToken": refresh });
        let response = self.send(|| self.http.post(&url).json(&body)).await?;
        let _: Value = decode(response).await?;
        Ok(())
    }

    async fn create_checkout_session(&self, plan_id: &str) -> Result<String, RemoteError> {
        let url = self.url("/api/payments/create-checkout-session");
        let response = self
            .send(|| self.http.post(&url).query(&[("plan", plan_id)]))
            .await?;
        let parsed: CheckoutResponse = decode(response).await?;
        Ok(parsed.url)
    }
}

fn with_bearer(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => req.bearer_auth(token),
        None => req,
    }
}

fn with_guest(req: RequestBuilder, temporary_user_id: Option<&str>) -> RequestBuilder {
    match temporary_user_id {
        Some(id) => req.query(&[("temporaryUserId", id)]),
        None => req,
    }
}

fn file_part(name: &str, mime: &str, bytes: &bytes::Bytes) -> Part {
    let part = || Part::bytes(bytes.to_vec()).file_name(name.to_string());
    if mime.is_empty() {
        return part();
    }
    part().mime_str(mime).unwrap_or_else(|_| part())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(RemoteError::Status {
            status: status.as_u16(),
            message: error_message(&body, status.canonical_reason().unwrap_or("Unknown error")),
        });
    }
    serde_json::from_str(&body).map_err(|e| RemoteError::Parse(e.to_string()))
}

/// The backend's `{"error": "..."}` message, or `fallback`.
fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| fallback.to_string())
}

/// Some upstream auth failures arrive as a 500 whose `message` is itself a
/// JSON document with `status: "401"`.
fn wrapped_auth_error(body: &str) -> Option<String> {
    let outer: Value = serde_json::from_str(body).ok()?;
    if !is_401(outer.get("status")?) {
        return None;
    }
    let inner: Value = serde_json::from_str(outer.get("message")?.as_str()?).ok()?;
    if !is_401(inner.get("status")?) {
        return None;
    }
    Some(
        inner
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Authentication required")
            .to_string(),
    )
}

fn is_401(status: &Value) -> bool {
    match status {
        Value::String(s) => s == "401",
        Value::Number(n) => n.as_u64() == Some(401),
        _ => false,
    }
}

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::{Multipart, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};

    use super::*;
    use crate::chat::history::{HistoryItem, Role};
    use crate::models::chat::{new_id, FileAttachment};
    use crate::session::store::MemoryStore;

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str, store: Arc<MemoryStore>, events: EventBus) -> RemoteClient {
        RemoteClient::new(base_url, Duration::from_secs(5), store, events).unwrap()
    }

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            user_message: message.to_string(),
            current_resume_markdown: "# Old".to_string(),
            chat_history: vec![HistoryItem {
                role: Role::User,
                content: "earlier".to_string(),
            }],
            files: vec![],
        }
    }

    fn bearer(headers: &HeaderMap) -> String {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn test_chat_posts_json_with_bearer_and_chat_id() {
        let router = Router::new().route(
            "/api/ai/chat",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(bearer(&headers), "Bearer t1");
                assert_eq!(body["chatId"], "c-1");
                assert_eq!(body["current_resume_markdown"], "# Old");
                assert_eq!(body["chat_history"][0]["role"], "user");
                Json(json!({
                    "reply": format!("echo: {}", body["user_message"].as_str().unwrap()),
                    "resume_updates": {"has_updates": true},
                    "output_resume_markdown": "# New"
                }))
            }),
        );
        let base = spawn_backend(router).await;
        let store = Arc::new(MemoryStore::new());
        store.set(StoreKey::JwtToken, "t1").await.unwrap();
        store.set(StoreKey::ChatId, "c-1").await.unwrap();

        let reply = client(&base, store, EventBus::default())
            .chat(request("tighten summary"))
            .await
            .unwrap();
        assert_eq!(reply.reply, "echo: tighten summary");
        assert_eq!(reply.updated_markdown, "# New");
        assert!(reply.has_updates);
    }

    #[tokio::test]
    async fn test_guest_id_sent_as_query_without_jwt() {
        let router = Router::new().route(
            "/api/ai/chat",
            post(
                |Query(q): Query<std::collections::HashMap<String, String>>| async move {
                    Json(json!({
                        "reply": q.get("temporaryUserId").cloned().unwrap_or_default(),
                        "resume_updates": {"has_updates": false},
                        "output_resume_markdown": ""
                    }))
                },
            ),
        );
        let base = spawn_backend(router).await;
        let store = Arc::new(MemoryStore::new());
        store.set(StoreKey::TemporaryUserId, "guest-9").await.unwrap();

        let reply = client(&base, store, EventBus::default())
            .chat(request("hi"))
            .await
            .unwrap();
        assert_eq!(reply.reply, "guest-9");
        assert_eq!(reply.updated_markdown, "# Old");
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_token_and_retries_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chat_calls = calls.clone();
        let router = Router::new()
            .route(
                "/api/ai/chat",
                post(move |headers: HeaderMap| {
                    let calls = chat_calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        if bearer(&headers) != "Bearer fresh" {
                            return Err(StatusCode::UNAUTHORIZED);
                        }
                        Ok(Json(json!({
                            "reply": "ok",
                            "resume_updates": {"has_updates": false},
                            "output_resume_markdown": ""
                        })))
                    }
                }),
            )
            .route(
                "/api/auth/refresh",
                post(|headers: HeaderMap| async move {
                    assert_eq!(bearer(&headers), "Bearer r1");
                    Json(json!({"auth": {"jwtToken": "fresh", "refreshToken": "r2"}}))
                }),
            );
        let base = spawn_backend(router).await;
        let store = Arc::new(MemoryStore::new());
        store.set(StoreKey::JwtToken, "stale").await.unwrap();
        store.set(StoreKey::RefreshToken, "r1").await.unwrap();

        let reply = client(&base, store.clone(), EventBus::default())
            .chat(request("hi"))
            .await
            .unwrap();
        assert_eq!(reply.reply, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            store.get(StoreKey::JwtToken).await.unwrap().as_deref(),
            Some("fresh")
        );
        assert_eq!(
            store.get(StoreKey::RefreshToken).await.unwrap().as_deref(),
            Some("r2")
        );
    }

    #[tokio::test]
    async fn test_unauthorized_falls_back_to_guest_reissue() {
        let router = Router::new()
            .route(
                "/api/ai/chat",
                post(|headers: HeaderMap| async move {
                    if bearer(&headers) != "Bearer reissued" {
                        return Err(StatusCode::UNAUTHORIZED);
                    }
                    Ok(Json(json!({"reply": "ok", "resume_updates": {"has_updates": false}})))
                }),
            )
            .route(
                "/api/bootstrap",
                get(|| async {
                    Json(json!({
                        "isAuthenticated": false,
                        "temporaryUserId": "guest-1",
                        "chatId": 77,
                        "jwtToken": "reissued",
                        "refreshToken": "r-new"
                    }))
                }),
            );
        let base = spawn_backend(router).await;
        let store = Arc::new(MemoryStore::new());
        store.set(StoreKey::JwtToken, "stale").await.unwrap();
        store.set(StoreKey::TemporaryUserId, "guest-1").await.unwrap();

        let reply = client(&base, store.clone(), EventBus::default())
            .chat(request("hi"))
            .await
            .unwrap();
        assert_eq!(reply.reply, "ok");
        assert_eq!(
            store.get(StoreKey::ChatId).await.unwrap().as_deref(),
            Some("77")
        );
    }

    #[tokio::test]
    async fn test_unauthorized_without_credentials_surfaces_status() {
        let router = Router::new().route(
            "/api/ai/chat",
            post(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid token"}))) }),
        );
        let base = spawn_backend(router).await;
        let err = client(&base, Arc::new(MemoryStore::new()), EventBus::default())
            .chat(request("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "HTTP 401: Invalid token");
    }

    #[tokio::test]
    async fn test_rate_limit_publishes_event() {
        let router = Router::new().route(
            "/api/ai/chat",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"count": 5, "limit": 5, "message": "Daily limit reached"})),
                )
            }),
        );
        let base = spawn_backend(router).await;
        let events = EventBus::default();
        let mut rx = events.subscribe();

        let err = client(&base, Arc::new(MemoryStore::new()), events)
            .chat(request("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(429));
        match rx.recv().await.unwrap() {
            AppEvent::RateLimited(notice) => {
                assert_eq!(notice.limit, Some(5));
                assert_eq!(notice.message.as_deref(), Some("Daily limit reached"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrapped_auth_error_in_500_publishes_auth_error() {
        let router = Router::new().route(
            "/api/ai/chat",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "status": "401",
                        "message": "{\"status\":\"401\",\"message\":\"Session expired\"}"
                    })),
                )
            }),
        );
        let base = spawn_backend(router).await;
        let events = EventBus::default();
        let mut rx = events.subscribe();

        let err = client(&base, Arc::new(MemoryStore::new()), events)
            .chat(request("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            rx.recv().await.unwrap(),
            AppEvent::AuthError {
                message: "Session expired".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_files_are_sent_as_multipart() {
        let router = Router::new().route(
            "/api/ai/chat",
            post(|mut multipart: Multipart| async move {
                let mut seen = Vec::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    let label = match field.file_name() {
                        Some(file_name) => format!("{name}={file_name}"),
                        None => name,
                    };
                    seen.push(label);
                }
                Json(json!({
                    "reply": seen.join(","),
                    "resume_updates": {"has_updates": false}
                }))
            }),
        );
        let base = spawn_backend(router).await;
        let store = Arc::new(MemoryStore::new());
        store.set(StoreKey::ChatId, "c-2").await.unwrap();

        let mut req = request("import this");
        req.files.push(FileAttachment {
            id: new_id(),
            name: "resume.pdf".to_string(),
            size: 4,
            mime: "application/pdf".to_string(),
            content: None,
            file: Some(bytes::Bytes::from_static(b"%PDF")),
        });

        let reply = client(&base, store, EventBus::default())
            .chat(req)
            .await
            .unwrap();
        assert_eq!(
            reply.reply,
            "user_message,current_resume_markdown,chat_history,chatId,files=resume.pdf"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let err = client("http://127.0.0.1:1", Arc::new(MemoryStore::new()), EventBus::default())
            .chat(request("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));
    }

    #[tokio::test]
    async fn test_chat_history_null_is_empty() {
        let router = Router::new().route("/api/ai/chat/history", get(|| async { Json(Value::Null) }));
        let base = spawn_backend(router).await;
        let history = client(&base, Arc::new(MemoryStore::new()), EventBus::default())
            .chat_history("c-1", None)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_wrapped_auth_error_requires_both_levels() {
        assert_eq!(wrapped_auth_error(r#"{"status": "500", "message": "x"}"#), None);
        assert_eq!(wrapped_auth_error("not json"), None);
        assert_eq!(
            wrapped_auth_error(r#"{"status": 401, "message": "{\"status\": \"401\"}"}"#).as_deref(),
            Some("Authentication required")
        );
    }
}
