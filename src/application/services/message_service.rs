//! Message Service
//!
//! Message creation and history. Sending a message also advances the chat's
//! latest-message pointer atomically (done inside the repository transaction),
//! which is what keeps chat lists ordered by recent activity.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{ChatRepository, Message, MessageRepository, User, UserRepository};
use crate::shared::snowflake::SnowflakeGenerator;

use super::chat_service::{ChatView, MessageView};

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Persist a message and return it fully resolved, including the target
    /// chat with its member identities (the caller fans this out to live
    /// connections).
    async fn send_message(
        &self,
        sender_id: i64,
        chat_id: i64,
        content: &str,
    ) -> Result<SentMessage, MessageError>;

    /// Full history of a chat in creation order.
    async fn list_messages(&self, chat_id: i64) -> Result<Vec<MessageView>, MessageError>;
}

/// A freshly created message together with its resolved chat.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: MessageView,
    pub chat: ChatView,
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Chat not found")]
    ChatNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// MessageService implementation
pub struct MessageServiceImpl<C, U, M>
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

impl<C, U, M> MessageServiceImpl<C, U, M>
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
}

#[async_trait]
impl<C, U, M> MessageService for MessageServiceImpl<C, U, M>
where
    C: ChatRepository + 'static,
    U: UserRepository + 'static,
    M: MessageRepository + 'static,
{
    async fn send_message(
        &self,
        sender_id: i64,
        chat_id: i64,
        content: &str,
    ) -> Result<SentMessage, MessageError> {
        if content.trim().is_empty() {
            return Err(MessageError::Validation(
                "Invalid data passed into request".into(),
            ));
        }

        let chat = self
            .chat_repo
            .find_by_id(chat_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
            .ok_or(MessageError::ChatNotFound)?;

        let sender = self
            .user_repo
            .find_by_id(sender_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
            .ok_or(MessageError::UserNotFound)?;

        let now = Utc::now();
        let message = Message {
            id: self.id_generator.generate(),
            chat_id,
            sender_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .message_repo
            .create(&message)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        let users = self
            .user_repo
            .find_by_ids(&chat.user_ids)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        let group_admin = chat
            .group_admin_id
            .and_then(|admin_id| users.iter().find(|u| u.id == admin_id).cloned());

        tracing::info!(
            message_id = created.id,
            chat_id,
            sender_id,
            "Message created"
        );

        // latest_message is left unset here: the caller already holds the
        // created message, and the chat list query re-resolves it anyway.
        let chat_view = ChatView {
            id: chat.id,
            chat_name: chat.chat_name,
            is_group_chat: chat.is_group_chat,
            users,
            group_admin,
            latest_message: None,
            created_at: chat.created_at,
            updated_at: created.created_at,
        };

        Ok(SentMessage {
            message: MessageView {
                id: created.id,
                sender,
                content: created.content,
                chat_id: created.chat_id,
                created_at: created.created_at,
                updated_at: created.updated_at,
            },
            chat: chat_view,
        })
    }

    async fn list_messages(&self, chat_id: i64) -> Result<Vec<MessageView>, MessageError> {
        self.chat_repo
            .find_by_id(chat_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
            .ok_or(MessageError::ChatNotFound)?;

        let messages = self
            .message_repo
            .find_by_chat(chat_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        let mut sender_ids: Vec<i64> = messages.iter().map(|m| m.sender_id).collect();
        sender_ids.sort_unstable();
        sender_ids.dedup();

        let senders: HashMap<i64, User> = self
            .user_repo
            .find_by_ids(&sender_ids)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut views = Vec::with_capacity(messages.len());
        for message in messages {
            let sender = senders
                .get(&message.sender_id)
                .cloned()
                .ok_or(MessageError::UserNotFound)?;
            views.push(MessageView {
                id: message.id,
                sender,
                content: message.content,
                chat_id: message.chat_id,
                created_at: message.created_at,
                updated_at: message.updated_at,
            });
        }
        Ok(views)
    }
}
