//! Chat message repository implementation

use libsql::{params, Connection, Row};

use super::rows::{flag, id, variant};
use crate::error::{Error, Result};
use crate::models::{ChatMessage, ConversationId, MessageId};

const MESSAGE_COLUMNS: &str = "id, conversation_id, role, content, sent_at, pending_create";

/// Trait for chat message storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ChatRepository {
    /// Messages of a conversation in send order
    async fn list_conversation(&self, conversation_id: &ConversationId) -> Result<Vec<ChatMessage>>;

    /// Store a message
    async fn insert(&self, message: &ChatMessage) -> Result<()>;

    /// Clear the pending flag once a reply has been produced
    async fn mark_sent(&self, id: &MessageId) -> Result<()>;

    /// User messages of a conversation still waiting for a reply, oldest first
    async fn list_pending(&self, conversation_id: &ConversationId) -> Result<Vec<ChatMessage>>;

    /// Remove every message of a conversation
    async fn delete_conversation(&self, conversation_id: &ConversationId) -> Result<u64>;
}

/// libSQL implementation of `ChatRepository`
pub struct LibSqlChatRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlChatRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_message(row: &Row) -> Result<ChatMessage> {
        Ok(ChatMessage {
            id: id(row, 0)?,
            conversation_id: id(row, 1)?,
            role: variant(row, 2)?,
            content: row.get(3)?,
            sent_at: row.get(4)?,
            pending_create: flag(row, 5)?,
        })
    }

    async fn query_messages(
        &self,
        sql: &str,
        args: impl libsql::params::IntoParams,
    ) -> Result<Vec<ChatMessage>> {
        let mut rows = self.conn.query(sql, args).await?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next().await? {
            messages.push(Self::parse_message(&row)?);
        }
        Ok(messages)
    }
}

impl ChatRepository for LibSqlChatRepository<'_> {
    async fn list_conversation(&self, conversation_id: &ConversationId) -> Result<Vec<ChatMessage>> {
        self.query_messages(
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM chat_messages
                 WHERE conversation_id = ?
                 ORDER BY sent_at ASC, id ASC"
            ),
            [conversation_id.as_str()],
        )
        .await
    }

    async fn insert(&self, message: &ChatMessage) -> Result<()> {
        self.conn
            .execute(
                &format!("INSERT INTO chat_messages ({MESSAGE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"),
                params![
                    message.id.as_str(),
                    message.conversation_id.as_str(),
                    message.role.as_str(),
                    message.content.clone(),
                    message.sent_at,
                    i64::from(message.pending_create)
                ],
            )
            .await?;
        Ok(())
    }

    async fn mark_sent(&self, id: &MessageId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE chat_messages SET pending_create = 0 WHERE id = ?",
                [id.as_str()],
            )
            .await?;
        if rows == 0 {
            return Err(Error::NotFound(format!("Message {id}")));
        }
        Ok(())
    }

    async fn list_pending(&self, conversation_id: &ConversationId) -> Result<Vec<ChatMessage>> {
        self.query_messages(
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM chat_messages
                 WHERE conversation_id = ? AND pending_create = 1
                 ORDER BY sent_at ASC"
            ),
            [conversation_id.as_str()],
        )
        .await
    }

    async fn delete_conversation(&self, conversation_id: &ConversationId) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM chat_messages WHERE conversation_id = ?",
                [conversation_id.as_str()],
            )
            .await?;
        Ok(rows)
    }
}
