//! Compact conversation context sent to the backend with every turn.
//!
//! Only the most recent `limit` messages are kept; older turns are dropped
//! without summarization. The backend works from the current document plus
//! these recent turns.

use serde::{Deserialize, Serialize};

use crate::models::chat::ChatMessage;

pub const DEFAULT_HISTORY_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub role: Role,
    pub content: String,
}

/// Builds the `{role, content}` payload from the last `limit` messages.
///
/// Assistant turns are stored with the `system` tag; with
/// `map_system_to_assistant` they are sent as `assistant`.
pub fn build_history_payload(
    log: &[ChatMessage],
    limit: usize,
    map_system_to_assistant: bool,
) -> Vec<HistoryItem> {
    let start = log.len().saturating_sub(limit);
    log[start..]
        .iter()
        .map(|m| HistoryItem {
            role: match m {
                ChatMessage::User(_) => Role::User,
                ChatMessage::Assistant(_) if map_system_to_assistant => Role::Assistant,
                ChatMessage::Assistant(_) => Role::System,
            },
            content: m.message().to_string(),
        })
        .collect()
}
