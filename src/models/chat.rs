//! Chat Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use superlearn_tools::ToolCall;

/// Title given to chats before their first user message
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Characters of the first user message kept in an auto-generated title
pub const AUTO_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Tool turn that produced this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: None,
            turn_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.tool_calls = Some(calls);
        self
    }

    pub fn with_turn_id(mut self, turn_id: impl Into<String>) -> Self {
        self.turn_id = Some(turn_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Free-form settings such as model or temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Chat {
    pub fn new(title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("chat-{}", uuid::Uuid::new_v4()),
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string()),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            metadata: None,
        }
    }

    /// Append a message, retitling an untitled chat from its first user message
    pub fn push_message(&mut self, message: ChatMessage) {
        let retitle = self.title == DEFAULT_CHAT_TITLE
            && message.role == MessageRole::User
            && self.messages.is_empty();
        if retitle {
            self.title = auto_title(&message.content);
        }
        self.messages.push(message);
        self.updated_at = Utc::now();
    }
}

/// First `AUTO_TITLE_CHARS` characters, with "..." when truncated
pub fn auto_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(AUTO_TITLE_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// One tool invocation requested in a chat turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool: String,
    #[serde(default)]
    pub parameters: Value,
}
