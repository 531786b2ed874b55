use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Tutor,
}

/// One turn of a tutoring conversation about a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            sent_at,
        }
    }

    #[must_use]
    pub fn tutor(text: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            role: ChatRole::Tutor,
            text: text.into(),
            sent_at,
        }
    }
}
