use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_DOCUMENT_TITLE: &str = "Untitled Resume";

/// Time-ordered unique id for messages and attachments.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// A file the user attached to a turn.
///
/// `content` carries inline text for text-like files; `file` holds the raw
/// bytes that are uploaded to the backend and is never sent to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip)]
    pub file: Option<Bytes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTurn {
    pub id: String,
    pub message: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<FileAttachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantTurn {
    pub id: String,
    pub message: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Full copy of the document right after this turn was processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_snapshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_updated: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<String>,
}

/// One entry in the chat log. Serialized with the `type` discriminator the
/// backend uses (`user` / `system`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatMessage {
    #[serde(rename = "user")]
    User(UserTurn),
    #[serde(rename = "system")]
    Assistant(AssistantTurn),
}

impl ChatMessage {
    pub fn user(message: impl Into<String>, attachments: Vec<FileAttachment>) -> Self {
        ChatMessage::User(UserTurn {
            id: new_id(),
            message: message.into(),
            timestamp: Utc::now(),
            attachments,
        })
    }

    /// Assistant message without a snapshot (errors, credit notices).
    pub fn notice(message: impl Into<String>) -> Self {
        ChatMessage::Assistant(AssistantTurn {
            id: new_id(),
            message: message.into(),
            timestamp: Utc::now(),
            resume_snapshot: None,
            resume_updated: None,
            suggested_actions: Vec::new(),
        })
    }

    pub fn assistant_with_snapshot(
        message: impl Into<String>,
        snapshot: String,
        resume_updated: bool,
    ) -> Self {
        ChatMessage::Assistant(AssistantTurn {
            id: new_id(),
            message: message.into(),
            timestamp: Utc::now(),
            resume_snapshot: Some(snapshot),
            resume_updated: Some(resume_updated),
            suggested_actions: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            ChatMessage::User(turn) => &turn.id,
            ChatMessage::Assistant(turn) => &turn.id,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ChatMessage::User(turn) => &turn.message,
            ChatMessage::Assistant(turn) => &turn.message,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, ChatMessage::User(_))
    }

    pub fn resume_snapshot(&self) -> Option<&str> {
        match self {
            ChatMessage::User(_) => None,
            ChatMessage::Assistant(turn) => turn.resume_snapshot.as_deref(),
        }
    }
}

/// Read-only view of a session's chat state, as rendered by the UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStateView {
    pub markdown_content: String,
    pub chat_history: Vec<ChatMessage>,
    pub pending_files: Vec<FileAttachment>,
    pub is_processing: bool,
    pub credits_remaining: u32,
    pub document_title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_turn_serializes_with_user_tag() {
        let msg = ChatMessage::user("hello", vec![]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "user");
        assert_eq!(json["message"], "hello");
        assert!(json.get("attachments").is_none());
    }

    #[test]
    fn test_backend_history_entry_deserializes_as_assistant() {
        let raw = r##"{
            "id": "1717000000000",
            "message": "Updated your summary",
            "timestamp": "2024-05-29T10:00:00Z",
            "type": "system",
            "resumeSnapshot": "# Jane",
            "resumeUpdated": true
        }"##;
        let msg: ChatMessage = serde_json::from_str(raw).unwrap();
        assert!(!msg.is_user());
        assert_eq!(msg.id(), "1717000000000");
        assert_eq!(msg.resume_snapshot(), Some("# Jane"));
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let raw = r#"{"id": "a", "message": "hi", "type": "user"}"#;
        let msg: ChatMessage = serde_json::from_str(raw).unwrap();
        assert!(msg.is_user());
        assert_eq!(msg.resume_snapshot(), None);
    }

    #[test]
    fn test_attachment_bytes_are_not_serialized() {
        let attachment = FileAttachment {
            id: new_id(),
            name: "cv.pdf".to_string(),
            size: 3,
            mime: "application/pdf".to_string(),
            content: None,
            file: Some(Bytes::from_static(b"%PD")),
        };
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["type"], "application/pdf");
        assert!(json.get("file").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
