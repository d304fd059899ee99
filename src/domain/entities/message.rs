//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a message sent in a chat.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - chat_id: BIGINT NOT NULL REFERENCES chats(id)
/// - sender_id: BIGINT NOT NULL REFERENCES users(id)
/// - content: TEXT NOT NULL (non-empty)
/// - created_at / updated_at: TIMESTAMPTZ
///
/// Messages are created exactly once per send and are immutable afterwards;
/// there is no edit or delete path in this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Chat this message belongs to
    pub chat_id: i64,

    /// Sender user ID
    pub sender_id: i64,

    /// Message text (non-empty)
    pub content: String,

    /// Timestamp when the message was sent
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (equals created_at; messages are immutable)
    pub updated_at: DateTime<Utc>,
}

impl Default for Message {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            chat_id: 0,
            sender_id: 0,
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository trait for Message data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find a message by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError>;

    /// Find all messages in a chat, in creation order.
    async fn find_by_chat(&self, chat_id: i64) -> Result<Vec<Message>, AppError>;

    /// Create a new message and point the chat's `latest_message_id` at it,
    /// atomically with respect to the chat record. Under concurrent sends to
    /// the same chat the last writer by database ordering wins.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_default() {
        let message = Message::default();

        assert_eq!(message.id, 0);
        assert_eq!(message.chat_id, 0);
        assert_eq!(message.sender_id, 0);
        assert!(message.content.is_empty());
    }

    #[test]
    fn test_message_serialization() {
        let message = Message {
            id: 42,
            chat_id: 7,
            sender_id: 3,
            content: "hello there".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let serialized = serde_json::to_string(&message).expect("Failed to serialize message");

        assert!(serialized.contains("\"id\":42"));
        assert!(serialized.contains("\"chat_id\":7"));
        assert!(serialized.contains("\"content\":\"hello there\""));
    }
}
