use serde::{Deserialize, Serialize};

use crate::chat::history::HistoryItem;
use crate::models::chat::FileAttachment;

/// One user turn as handed to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub user_message: String,
    pub current_resume_markdown: String,
    pub chat_history: Vec<HistoryItem>,
    pub files: Vec<FileAttachment>,
}

/// The parts of a chat response the session acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub updated_markdown: String,
    pub has_updates: bool,
    pub credits: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatBody<'a> {
    pub user_message: &'a str,
    pub current_resume_markdown: &'a str,
    pub chat_history: &'a [HistoryItem],
    #[serde(rename = "chatId")]
    pub chat_id: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeUpdates {
    #[serde(default)]
    pub has_updates: bool,
    #[serde(default)]
    pub update_trigger: Option<String>,
    #[serde(default)]
    pub sections_changed: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Backend chat contract.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(default)]
    pub resume_updates: ResumeUpdates,
    #[serde(default)]
    pub output_resume_markdown: String,
    #[serde(default)]
    pub credits: Option<f64>,
}

impl ChatResponse {
    /// Adopts the returned document only when the backend flags an update and
    /// actually sent one.
    pub fn into_reply(self, current_markdown: &str) -> ChatReply {
        let has_updates = self.resume_updates.has_updates;
        let updated_markdown = if has_updates && !self.output_resume_markdown.is_empty() {
            self.output_resume_markdown
        } else {
            current_markdown.to_string()
        };
        ChatReply {
            reply: self.reply,
            updated_markdown,
            has_updates,
            credits: self.credits.map(|c| c.max(0.0) as u32),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub auth: Option<crate::models::session::AuthTokens>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TitleResponse {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RewriteResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckoutResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_adopts_output_when_flagged() {
        let raw = r##"{
            "reply": "Tightened your summary.",
            "resume_updates": {
                "has_updates": true,
                "update_trigger": "explicit_request",
                "sections_changed": ["summary"],
                "reason": "user asked"
            },
            "output_resume_markdown": "# New",
            "credits": 4
        }"##;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        let reply = response.into_reply("# Old");
        assert_eq!(reply.updated_markdown, "# New");
        assert!(reply.has_updates);
        assert_eq!(reply.credits, Some(4));
    }

    #[test]
    fn test_reply_keeps_current_without_update_flag() {
        let raw = r##"{"reply": "Looks good", "resume_updates": {"has_updates": false}, "output_resume_markdown": "# Other"}"##;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.into_reply("# Old").updated_markdown, "# Old");
    }

    #[test]
    fn test_reply_keeps_current_when_output_empty() {
        let raw = r#"{"reply": "Done", "resume_updates": {"has_updates": true}, "output_resume_markdown": ""}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.into_reply("# Old").updated_markdown, "# Old");
    }
}
