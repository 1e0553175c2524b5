//! Chat message model

use serde::{Deserialize, Serialize};

use super::{ChatRole, ConversationId, MessageId};

/// A message in an assistant conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: ChatRole,
    pub content: String,
    /// Unix ms; orders messages within a conversation
    pub sent_at: i64,
    /// Stored locally but not yet answered by a reply backend
    pub pending_create: bool,
}

impl ChatMessage {
    /// A message typed by the user, pending until a reply arrives
    #[must_use]
    pub fn from_user(conversation_id: ConversationId, content: impl Into<String>, now: i64) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: ChatRole::User,
            content: content.into(),
            sent_at: now,
            pending_create: true,
        }
    }

    #[must_use]
    pub fn from_assistant(
        conversation_id: ConversationId,
        content: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: ChatRole::Assistant,
            content: content.into(),
            sent_at: now,
            pending_create: false,
        }
    }
}
