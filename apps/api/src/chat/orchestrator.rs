//! Chat orchestration. `ChatSession` is the single owner of a session's
//! document and message log.
//!
//! All bookkeeping for a turn happens under the lock before the backend is
//! contacted. At most one submission is in flight; extra submits while
//! processing are dropped, not queued. Every accepted submission ends with
//! exactly one system message: the assistant reply (with a full document
//! snapshot) or a classified error notice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chat::classify::{classify, ErrorCategory, OUT_OF_CREDITS_MESSAGE};
use crate::chat::heuristics::apply_offline_heuristics;
use crate::chat::history::{build_history_payload, DEFAULT_HISTORY_WINDOW};
use crate::chat::ProcessingResult;
use crate::files::reader::merge_pending;
use crate::models::chat::{ChatMessage, ChatStateView, FileAttachment, DEFAULT_DOCUMENT_TITLE};
use crate::remote::{ChatBackend, ChatRequest};

#[derive(Debug, Error, PartialEq)]
pub enum ChatError {
    #[error("Message {0} not found")]
    MessageNotFound(String),

    #[error("Message {0} has no resume snapshot")]
    NoSnapshot(String),

    #[error("A message is still being processed")]
    Busy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The backend (or the offline fallback) produced a reply.
    Replied { message: ChatMessage },
    /// Both the backend and the fallback failed; a notice was appended.
    Failed {
        message: ChatMessage,
        category: ErrorCategory,
    },
    /// No credits left; only the exhaustion notice was appended.
    OutOfCredits,
    /// Another submission was in flight; nothing happened.
    Dropped,
    /// The session was reset or reloaded while the turn was in flight; the
    /// backend result was discarded.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub history_window: usize,
    /// Pause between marking the session busy and calling the backend, so the
    /// UI can render the processing state first. Zero disables it.
    pub submit_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            submit_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    document: String,
    log: Vec<ChatMessage>,
    pending: Vec<FileAttachment>,
    processing: bool,
    credits: u32,
    title: String,
    /// Bumped whenever the log is replaced wholesale. A turn only applies its
    /// result to the epoch it started in.
    epoch: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            document: String::new(),
            log: Vec::new(),
            pending: Vec::new(),
            processing: false,
            credits: 0,
            title: DEFAULT_DOCUMENT_TITLE.to_string(),
            epoch: 0,
        }
    }
}

/// Settles a turn whose future was dropped before it finished, so the session
/// never stays stuck in processing.
struct TurnGuard<'a> {
    session: &'a ChatSession,
    epoch: u64,
    settled: bool,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.session.lock();
        if state.epoch != self.epoch {
            return;
        }
        warn!("Turn abandoned before completion");
        state
            .log
            .push(ChatMessage::notice(ErrorCategory::Generic.template()));
        state.processing = false;
        state.pending.clear();
    }
}

pub struct ChatSession {
    state: Mutex<SessionState>,
    backend: Arc<dyn ChatBackend>,
    settings: SessionSettings,
    active: AtomicBool,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, settings: SessionSettings) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            backend,
            settings,
            active: AtomicBool::new(true),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Turn processing
    // ────────────────────────────────────────────────────────────────────────

    pub async fn submit(&self, message: &str, attachments: Vec<FileAttachment>) -> SubmitOutcome {
        let (document_before, chat_history, epoch) = {
            let mut state = self.lock();
            if state.credits == 0 {
                info!("Submission blocked: no credits remaining");
                state.log.push(ChatMessage::notice(OUT_OF_CREDITS_MESSAGE));
                return SubmitOutcome::OutOfCredits;
            }
            if state.processing {
                debug!("Submission dropped: another turn is in flight");
                return SubmitOutcome::Dropped;
            }

            let chat_history =
                build_history_payload(&state.log, self.settings.history_window, true);
            state.log.push(ChatMessage::user(message, attachments.clone()));
            state.credits = state.credits.saturating_sub(1);
            state.pending.clear();
            state.processing = true;
            (state.document.clone(), chat_history, state.epoch)
        };
        let mut guard = TurnGuard {
            session: self,
            epoch,
            settled: false,
        };

        if !self.settings.submit_delay.is_zero() {
            tokio::time::sleep(self.settings.submit_delay).await;
        }

        let request = ChatRequest {
            user_message: message.to_string(),
            current_resume_markdown: document_before.clone(),
            chat_history,
            files: attachments,
        };

        let result = match self.backend.chat(request).await {
            Ok(reply) => {
                if let Some(credits) = reply.credits {
                    debug!("Backend reports {credits} credits remaining");
                }
                Ok(ProcessingResult {
                    updated_markdown: reply.updated_markdown,
                    response_message: reply.reply,
                    has_updates: Some(reply.has_updates),
                })
            }
            Err(err) => {
                warn!("Chat request failed: {err}");
                match apply_offline_heuristics(message, &document_before) {
                    Some(result) => {
                        info!("Applied offline edit in place of backend reply");
                        Ok(result)
                    }
                    None => Err(err),
                }
            }
        };

        let mut state = self.lock();
        guard.settled = true;
        if state.epoch != epoch {
            info!("Session was reset during the turn, discarding its result");
            return SubmitOutcome::Superseded;
        }
        let outcome = match result {
            Ok(result) => {
                let resume_updated = result.updated_markdown != document_before;
                state.document = result.updated_markdown.clone();
                let reply = ChatMessage::assistant_with_snapshot(
                    result.response_message,
                    result.updated_markdown,
                    resume_updated,
                );
                state.log.push(reply.clone());
                SubmitOutcome::Replied { message: reply }
            }
            Err(err) => {
                let category = classify(&err);
                let notice = ChatMessage::notice(category.template());
                state.log.push(notice.clone());
                SubmitOutcome::Failed {
                    message: notice,
                    category,
                }
            }
        };
        state.processing = false;
        state.pending.clear();
        outcome
    }

    /// Restores the document to the snapshot carried by `message_id` and drops
    /// every later message. Destructive: discarded turns are not kept.
    pub fn revert_to(&self, message_id: &str) -> Result<(), ChatError> {
        let mut state = self.lock();
        if state.processing {
            return Err(ChatError::Busy);
        }
        let idx = state
            .log
            .iter()
            .position(|m| m.id() == message_id)
            .ok_or_else(|| ChatError::MessageNotFound(message_id.to_string()))?;
        let snapshot = state.log[idx]
            .resume_snapshot()
            .map(str::to_string)
            .ok_or_else(|| ChatError::NoSnapshot(message_id.to_string()))?;

        let discarded = state.log.len() - idx - 1;
        state.document = snapshot;
        state.log.truncate(idx + 1);
        info!("Reverted to message {message_id}, discarded {discarded} later message(s)");
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────────
    // State access
    // ────────────────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> ChatStateView {
        let state = self.lock();
        ChatStateView {
            markdown_content: state.document.clone(),
            chat_history: state.log.clone(),
            pending_files: state.pending.clone(),
            is_processing: state.processing,
            credits_remaining: state.credits,
            document_title: state.title.clone(),
        }
    }

    #[cfg(test)]
    pub fn document(&self) -> String {
        self.lock().document.clone()
    }

    pub fn set_document(&self, markdown: String) {
        self.lock().document = markdown;
    }

    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    pub fn set_title(&self, title: String) {
        self.lock().title = title;
    }

    #[cfg(test)]
    pub fn credits(&self) -> u32 {
        self.lock().credits
    }

    pub fn set_credits(&self, credits: u32) {
        self.lock().credits = credits;
    }

    #[cfg(test)]
    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    /// Replaces the log with history fetched from the backend. The document is
    /// taken from the latest snapshot, when there is one. A turn in flight is
    /// superseded.
    pub fn load_history(&self, log: Vec<ChatMessage>) {
        let mut state = self.lock();
        state.epoch += 1;
        state.processing = false;
        if let Some(snapshot) = log.iter().rev().find_map(|m| m.resume_snapshot()) {
            state.document = snapshot.to_string();
        }
        state.log = log;
    }

    pub fn pending_attachments(&self) -> Vec<FileAttachment> {
        self.lock().pending.clone()
    }

    pub fn add_pending(&self, accepted: Vec<FileAttachment>, max_files: usize) -> Vec<FileAttachment> {
        let mut state = self.lock();
        let pending = std::mem::take(&mut state.pending);
        state.pending = merge_pending(pending, accepted, max_files);
        state.pending.clone()
    }

    pub fn remove_pending(&self, attachment_id: &str) -> bool {
        let mut state = self.lock();
        let before = state.pending.len();
        state.pending.retain(|a| a.id != attachment_id);
        state.pending.len() != before
    }

    /// Clears the chat after logout. Credits are left for the next bootstrap.
    /// A turn in flight is superseded.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.epoch += 1;
        state.processing = false;
        state.log.clear();
        state.document.clear();
        state.pending.clear();
        state.title = DEFAULT_DOCUMENT_TITLE.to_string();
    }

    pub fn close(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
