//! Chat Service
//!
//! Conversation lifecycle: direct-chat dedup, group creation, rename, and
//! membership changes. Every operation returns the fully resolved chat —
//! participant identities, group admin, and latest message — never bare IDs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Chat, ChatRepository, Message, MessageRepository, User, UserRepository};
use crate::shared::snowflake::SnowflakeGenerator;

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Fetch the existing 1:1 chat between the caller and the other user,
    /// or create it if none exists (at most one per unordered pair).
    async fn find_or_create_direct(
        &self,
        me: i64,
        other_user_id: i64,
    ) -> Result<ChatView, ChatError>;

    /// All chats the caller participates in, most recently updated first.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ChatView>, ChatError>;

    /// Create a group chat. The creator joins automatically and becomes
    /// the group admin; at least 2 other members are required.
    async fn create_group(
        &self,
        creator_id: i64,
        name: &str,
        member_ids: Vec<i64>,
    ) -> Result<ChatView, ChatError>;

    /// Rename a chat.
    async fn rename(&self, chat_id: i64, name: &str) -> Result<ChatView, ChatError>;

    /// Add a user to a chat. Membership gaps from the source are kept:
    /// any participant may add, not only the group admin.
    async fn add_member(&self, chat_id: i64, user_id: i64) -> Result<ChatView, ChatError>;

    /// Remove a user from a chat. Removing an absent ID leaves the member
    /// set unchanged (set-pull semantics, no error).
    async fn remove_member(&self, chat_id: i64, user_id: i64) -> Result<ChatView, ChatError>;
}

/// Fully resolved chat returned by every operation.
#[derive(Debug, Clone)]
pub struct ChatView {
    pub id: i64,
    pub chat_name: String,
    pub is_group_chat: bool,
    pub users: Vec<User>,
    pub group_admin: Option<User>,
    pub latest_message: Option<MessageView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A message with its sender resolved.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub id: i64,
    pub sender: User,
    pub content: String,
    pub chat_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chat service errors
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat not found")]
    ChatNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// ChatService implementation
pub struct ChatServiceImpl<C, U, M>
where
    C: ChatRepository,
    U: UserRepository,
    M: MessageRepository,
{
    chat_repo: Arc<C>,
    user_repo: Arc<U>,
    message_repo: Arc<M>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<C, U, M> ChatServiceImpl<C, U, M>
where
    C: ChatRepository,
    U: UserRepository,
    M: MessageRepository,
{
    pub fn new(
        chat_repo: Arc<C>,
        user_repo: Arc<U>,
        message_repo: Arc<M>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            chat_repo,
            user_repo,
            message_repo,
            id_generator,
        }
    }

    /// Resolve member identities, group admin, and the latest message.
    async fn resolve(&self, chat: Chat) -> Result<ChatView, ChatError> {
        let users = self
            .user_repo
            .find_by_ids(&chat.user_ids)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        let group_admin = match chat.group_admin_id {
            Some(admin_id) => match users.iter().find(|u| u.id == admin_id) {
                Some(user) => Some(user.clone()),
                // The admin may have been removed from the member set
                None => self
                    .user_repo
                    .find_by_id(admin_id)
                    .await
                    .map_err(|e| ChatError::Internal(e.to_string()))?,
            },
            None => None,
        };

        let latest_message = match chat.latest_message_id {
            Some(message_id) => {
                let message = self
                    .message_repo
                    .find_by_id(message_id)
                    .await
                    .map_err(|e| ChatError::Internal(e.to_string()))?;
                match message {
                    Some(message) => Some(self.resolve_message(message, &users).await?),
                    None => None,
                }
            }
            None => None,
        };

        Ok(ChatView {
            id: chat.id,
            chat_name: chat.chat_name,
            is_group_chat: chat.is_group_chat,
            users,
            group_admin,
            latest_message,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        })
    }

    async fn resolve_message(
        &self,
        message: Message,
        known_users: &[User],
    ) -> Result<MessageView, ChatError> {
        let sender = match known_users.iter().find(|u| u.id == message.sender_id) {
            Some(user) => user.clone(),
            None => self
                .user_repo
                .find_by_id(message.sender_id)
                .await
                .map_err(|e| ChatError::Internal(e.to_string()))?
                .ok_or(ChatError::UserNotFound)?,
        };

        Ok(MessageView {
            id: message.id,
            sender,
            content: message.content,
            chat_id: message.chat_id,
            created_at: message.created_at,
            updated_at: message.updated_at,
        })
    }
}

#[async_trait]
impl<C, U, M> ChatService for ChatServiceImpl<C, U, M>
where
    C: ChatRepository + 'static,
    U: UserRepository + 'static,
    M: MessageRepository + 'static,
{
    async fn find_or_create_direct(
        &self,
        me: i64,
        other_user_id: i64,
    ) -> Result<ChatView, ChatError> {
        // The other participant must exist before any chat is created
        self.user_repo
            .find_by_id(other_user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::UserNotFound)?;

        let existing = self
            .chat_repo
            .find_direct_between(me, other_user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        if let Some(chat) = existing {
            return self.resolve(chat).await;
        }

        let now = Utc::now();
        let chat = Chat {
            id: self.id_generator.generate(),
            chat_name: Chat::DIRECT_CHAT_NAME.to_string(),
            is_group_chat: false,
            user_ids: vec![me, other_user_id],
            group_admin_id: None,
            latest_message_id: None,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .chat_repo
            .create(&chat)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        tracing::info!(chat_id = created.id, "Direct chat created");

        self.resolve(created).await
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ChatView>, ChatError> {
        let chats = self
            .chat_repo
            .find_by_user(user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        let mut views = Vec::with_capacity(chats.len());
        for chat in chats {
            views.push(self.resolve(chat).await?);
        }
        Ok(views)
    }

    async fn create_group(
        &self,
        creator_id: i64,
        name: &str,
        mut member_ids: Vec<i64>,
    ) -> Result<ChatView, ChatError> {
        if name.trim().is_empty() {
            return Err(ChatError::Validation("Please fill all the fields".into()));
        }
        if member_ids.len() < 2 {
            return Err(ChatError::Validation(
                "More than 2 users are required to form a group chat".into(),
            ));
        }

        // The creator is always part of the group
        if !member_ids.contains(&creator_id) {
            member_ids.push(creator_id);
        }

        let now = Utc::now();
        let chat = Chat {
            id: self.id_generator.generate(),
            chat_name: name.to_string(),
            is_group_chat: true,
            user_ids: member_ids,
            group_admin_id: Some(creator_id),
            latest_message_id: None,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .chat_repo
            .create(&chat)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        tracing::info!(
            chat_id = created.id,
            members = created.user_ids.len(),
            "Group chat created"
        );

        self.resolve(created).await
    }

    async fn rename(&self, chat_id: i64, name: &str) -> Result<ChatView, ChatError> {
        if name.trim().is_empty() {
            return Err(ChatError::Validation("Chat name must not be empty".into()));
        }

        let updated = self
            .chat_repo
            .rename(chat_id, name)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::ChatNotFound)?;

        self.resolve(updated).await
    }

    async fn add_member(&self, chat_id: i64, user_id: i64) -> Result<ChatView, ChatError> {
        let updated = self
            .chat_repo
            .add_member(chat_id, user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::ChatNotFound)?;

        self.resolve(updated).await
    }

    async fn remove_member(&self, chat_id: i64, user_id: i64) -> Result<ChatView, ChatError> {
        let updated = self
            .chat_repo
            .remove_member(chat_id, user_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::ChatNotFound)?;

        self.resolve(updated).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{MockChatRepository, MockMessageRepository, MockUserRepository};
    use crate::shared::snowflake::DEFAULT_EPOCH;
    use pretty_assertions::assert_eq;

    fn test_user(id: i64) -> User {
        User {
            id,
            name: format!("user-{id}"),
            email: format!("user{id}@example.com"),
            password_hash: "hash".into(),
            avatar_url: None,
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn direct_chat(id: i64, a: i64, b: i64) -> Chat {
        Chat {
            id,
            chat_name: Chat::DIRECT_CHAT_NAME.into(),
            is_group_chat: false,
            user_ids: vec![a, b],
            group_admin_id: None,
            latest_message_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(
        chat_repo: MockChatRepository,
        user_repo: MockUserRepository,
        message_repo: MockMessageRepository,
    ) -> ChatServiceImpl<MockChatRepository, MockUserRepository, MockMessageRepository> {
        ChatServiceImpl::new(
            Arc::new(chat_repo),
            Arc::new(user_repo),
            Arc::new(message_repo),
            Arc::new(SnowflakeGenerator::new(1, DEFAULT_EPOCH)),
        )
    }

    #[tokio::test]
    async fn test_find_or_create_direct_reuses_existing() {
        let mut chat_repo = MockChatRepository::new();
        let mut user_repo = MockUserRepository::new();
        let message_repo = MockMessageRepository::new();

        user_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(test_user(id))));
        user_repo
            .expect_find_by_ids()
            .returning(|ids| Ok(ids.iter().map(|&id| test_user(id)).collect()));
        chat_repo
            .expect_find_direct_between()
            .returning(|a, b| Ok(Some(direct_chat(500, a, b))));
        // create must never be called when a chat already exists
        chat_repo.expect_create().never();

        let service = service(chat_repo, user_repo, message_repo);

        let view = service.find_or_create_direct(1, 2).await.unwrap();
        assert_eq!(view.id, 500);
        assert!(!view.is_group_chat);
        assert_eq!(view.users.len(), 2);
    }

    #[tokio::test]
    async fn test_find_or_create_direct_creates_when_missing() {
        let mut chat_repo = MockChatRepository::new();
        let mut user_repo = MockUserRepository::new();
        let message_repo = MockMessageRepository::new();

        user_repo
            .expect_find_by_id()
            .returning(|id| Ok(Some(test_user(id))));
        user_repo
            .expect_find_by_ids()
            .returning(|ids| Ok(ids.iter().map(|&id| test_user(id)).collect()));
        chat_repo
            .expect_find_direct_between()
            .returning(|_, _| Ok(None));
        chat_repo
            .expect_create()
            .times(1)
            .returning(|chat| Ok(chat.clone()));

        let service = service(chat_repo, user_repo, message_repo);

        let view = service.find_or_create_direct(1, 2).await.unwrap();
        assert_eq!(view.chat_name, Chat::DIRECT_CHAT_NAME);
        assert_eq!(view.users.len(), 2);
    }

    #[tokio::test]
    async fn test_find_or_create_direct_unknown_user_fails() {
        let chat_repo = MockChatRepository::new();
        let mut user_repo = MockUserRepository::new();
        let message_repo = MockMessageRepository::new();

        user_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = service(chat_repo, user_repo, message_repo);

        let err = service.find_or_create_direct(1, 999).await.unwrap_err();
        assert!(matches!(err, ChatError::UserNotFound));
    }

    #[tokio::test]
    async fn test_create_group_requires_two_other_members() {
        let chat_repo = MockChatRepository::new();
        let user_repo = MockUserRepository::new();
        let message_repo = MockMessageRepository::new();

        let service = service(chat_repo, user_repo, message_repo);

        let err = service
            .create_group(1, "trio", vec![2])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_group_requires_name() {
        let chat_repo = MockChatRepository::new();
        let user_repo = MockUserRepository::new();
        let message_repo = MockMessageRepository::new();

        let service = service(chat_repo, user_repo, message_repo);

        let err = service
            .create_group(1, "  ", vec![2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_group_includes_creator_as_admin() {
        let mut chat_repo = MockChatRepository::new();
        let mut user_repo = MockUserRepository::new();
        let message_repo = MockMessageRepository::new();

        user_repo
            .expect_find_by_ids()
            .returning(|ids| Ok(ids.iter().map(|&id| test_user(id)).collect()));
        chat_repo
            .expect_create()
            .withf(|chat: &Chat| {
                chat.is_group_chat
                    && chat.user_ids.len() == 3
                    && chat.user_ids.contains(&1)
                    && chat.group_admin_id == Some(1)
            })
            .returning(|chat| Ok(chat.clone()));

        let service = service(chat_repo, user_repo, message_repo);

        let view = service.create_group(1, "trio", vec![2, 3]).await.unwrap();
        assert!(view.is_group_chat);
        assert_eq!(view.users.len(), 3);
        assert_eq!(view.group_admin.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_rename_missing_chat_is_not_found() {
        let mut chat_repo = MockChatRepository::new();
        let user_repo = MockUserRepository::new();
        let message_repo = MockMessageRepository::new();

        chat_repo.expect_rename().returning(|_, _| Ok(None));

        let service = service(chat_repo, user_repo, message_repo);

        let err = service.rename(404, "new name").await.unwrap_err();
        assert!(matches!(err, ChatError::ChatNotFound));
    }

    #[tokio::test]
    async fn test_rename_changes_only_name() {
        let mut chat_repo = MockChatRepository::new();
        let mut user_repo = MockUserRepository::new();
        let message_repo = MockMessageRepository::new();

        user_repo
            .expect_find_by_ids()
            .returning(|ids| Ok(ids.iter().map(|&id| test_user(id)).collect()));
        chat_repo.expect_rename().returning(|id, name| {
            let mut chat = direct_chat(id, 1, 2);
            chat.chat_name = name.to_string();
            Ok(Some(chat))
        });

        let service = service(chat_repo, user_repo, message_repo);

        let view = service.rename(500, "renamed").await.unwrap();
        assert_eq!(view.chat_name, "renamed");
        assert_eq!(view.users.len(), 2);
        assert!(view.latest_message.is_none());
    }

    #[tokio::test]
    async fn test_remove_member_missing_chat_is_not_found() {
        let mut chat_repo = MockChatRepository::new();
        let user_repo = MockUserRepository::new();
        let message_repo = MockMessageRepository::new();

        chat_repo.expect_remove_member().returning(|_, _| Ok(None));

        let service = service(chat_repo, user_repo, message_repo);

        let err = service.remove_member(404, 1).await.unwrap_err();
        assert!(matches!(err, ChatError::ChatNotFound));
    }
}
