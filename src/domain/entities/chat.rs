//! Chat entity and repository trait.
//!
//! Maps to the `chats` and `chat_members` tables in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a conversation between two or more users.
///
/// Maps to the `chats` table with membership in `chat_members`:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - chat_name: VARCHAR(100) NOT NULL (display label; ignored for 1:1 chats)
/// - is_group_chat: BOOLEAN NOT NULL DEFAULT FALSE
/// - group_admin_id: BIGINT NULL (set only for group chats)
/// - latest_message_id: BIGINT NULL (most recent message pointer)
/// - created_at / updated_at: TIMESTAMPTZ
///
/// Invariants:
/// - at most one non-group chat exists per unordered user pair
/// - a group chat has at least 3 members at creation (creator + 2)
/// - chats are never hard-deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Display label ("sender" placeholder for direct chats)
    pub chat_name: String,

    /// Whether this is a group chat
    pub is_group_chat: bool,

    /// Member user IDs (set semantics, order irrelevant)
    pub user_ids: Vec<i64>,

    /// Group admin user ID (group chats only)
    pub group_admin_id: Option<i64>,

    /// Reference to the most recent message, if any
    pub latest_message_id: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (bumped when a message arrives)
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Placeholder name stored for direct chats (display is derived
    /// client-side from the other participant).
    pub const DIRECT_CHAT_NAME: &'static str = "sender";

    /// Check whether the given user participates in this chat.
    pub fn has_member(&self, user_id: i64) -> bool {
        self.user_ids.contains(&user_id)
    }

    /// Number of participants.
    pub fn member_count(&self) -> usize {
        self.user_ids.len()
    }
}

impl Default for Chat {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            chat_name: String::new(),
            is_group_chat: false,
            user_ids: Vec::new(),
            group_admin_id: None,
            latest_message_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository trait for Chat data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Find a chat by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Chat>, AppError>;

    /// Find the non-group chat containing exactly the two given users,
    /// regardless of argument order.
    async fn find_direct_between(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> Result<Option<Chat>, AppError>;

    /// Find all chats the user participates in, most recently updated first.
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Chat>, AppError>;

    /// Create a new chat with its initial member set.
    async fn create(&self, chat: &Chat) -> Result<Chat, AppError>;

    /// Rename a chat. Returns None if the chat does not exist.
    async fn rename(&self, id: i64, name: &str) -> Result<Option<Chat>, AppError>;

    /// Add a member to a chat. Adding an existing member is a no-op.
    /// Returns None if the chat does not exist.
    async fn add_member(&self, id: i64, user_id: i64) -> Result<Option<Chat>, AppError>;

    /// Remove a member from a chat. Removing an absent ID is a no-op
    /// (set-pull semantics). Returns None if the chat does not exist.
    async fn remove_member(&self, id: i64, user_id: i64) -> Result<Option<Chat>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_chat(is_group: bool) -> Chat {
        Chat {
            id: 100,
            chat_name: if is_group { "weekend plans".into() } else { Chat::DIRECT_CHAT_NAME.into() },
            is_group_chat: is_group,
            user_ids: vec![1, 2, 3],
            group_admin_id: is_group.then_some(1),
            latest_message_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_chat_default() {
        let chat = Chat::default();

        assert_eq!(chat.id, 0);
        assert!(chat.chat_name.is_empty());
        assert!(!chat.is_group_chat);
        assert!(chat.user_ids.is_empty());
        assert!(chat.group_admin_id.is_none());
        assert!(chat.latest_message_id.is_none());
    }

    #[test]
    fn test_chat_has_member() {
        let chat = create_test_chat(true);

        assert!(chat.has_member(1));
        assert!(chat.has_member(3));
        assert!(!chat.has_member(42));
    }

    #[test]
    fn test_chat_member_count() {
        let chat = create_test_chat(true);
        assert_eq!(chat.member_count(), 3);
    }

    #[test]
    fn test_direct_chat_has_no_group_admin() {
        let chat = create_test_chat(false);
        assert!(chat.group_admin_id.is_none());
        assert_eq!(chat.chat_name, Chat::DIRECT_CHAT_NAME);
    }

    #[test]
    fn test_group_chat_has_group_admin() {
        let chat = create_test_chat(true);
        assert_eq!(chat.group_admin_id, Some(1));
        assert!(chat.is_group_chat);
    }
}
