use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to sessions whose first message is empty.
pub const DEFAULT_TITLE: &str = "New Chat";
const TITLE_MAX_CHARS: usize = 50;
const TITLE_KEEP_CHARS: usize = 47;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            role,
            content: content.into(),
            created_at: Utc::now(),
            attachments: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Empty assistant turn that fragments are appended to.
    pub fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Owner in the hosted store; absent for local history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ChatSession {
    pub fn new(first_message: &str, messages: Vec<Message>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: derive_title(first_message),
            messages,
            created_at: now,
            updated_at: now,
            user_id: None,
        }
    }
}

/// Session title from the first user message: long messages keep their first
/// 47 characters plus `...`.
pub fn derive_title(first_message: &str) -> String {
    if first_message.trim().is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    if first_message.chars().count() > TITLE_MAX_CHARS {
        let prefix: String = first_message.chars().take(TITLE_KEEP_CHARS).collect();
        format!("{prefix}...")
    } else {
        first_message.to_string()
    }
}
