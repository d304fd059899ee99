//! Response DTOs
//!
//! Data structures for API response bodies. IDs serialize as decimal strings
//! and timestamps as RFC 3339; field names are camelCase to match the wire
//! contract clients already speak.

use serde::Serialize;

use crate::application::services::{ChatView, MessageView};
use crate::domain::User;

/// Public view of a user. Never carries credentials.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            avatar_url: user.avatar_url,
            is_admin: user.is_admin,
        }
    }
}

/// Chat response with resolved participants
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub id: String,

    #[serde(rename = "chatName")]
    pub chat_name: String,

    #[serde(rename = "isGroupChat")]
    pub is_group_chat: bool,

    pub users: Vec<UserResponse>,

    #[serde(rename = "groupAdmin", skip_serializing_if = "Option::is_none")]
    pub group_admin: Option<UserResponse>,

    #[serde(rename = "latestMessage")]
    pub latest_message: Option<Box<MessageResponse>>,

    #[serde(rename = "createdAt")]
    pub created_at: String,

    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl From<ChatView> for ChatResponse {
    fn from(view: ChatView) -> Self {
        Self {
            id: view.id.to_string(),
            chat_name: view.chat_name,
            is_group_chat: view.is_group_chat,
            users: view.users.into_iter().map(UserResponse::from).collect(),
            group_admin: view.group_admin.map(UserResponse::from),
            latest_message: view
                .latest_message
                .map(|m| Box::new(MessageResponse::from_view(m, None))),
            created_at: view.created_at.to_rfc3339(),
            updated_at: view.updated_at.to_rfc3339(),
        }
    }
}

/// Message response with resolved sender. The `chat` field is only present
/// on the send-message response; history entries omit it.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub sender: UserResponse,
    pub content: String,

    #[serde(rename = "chatId")]
    pub chat_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatResponse>,

    #[serde(rename = "createdAt")]
    pub created_at: String,

    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl MessageResponse {
    pub fn from_view(view: MessageView, chat: Option<ChatResponse>) -> Self {
        Self {
            id: view.id.to_string(),
            sender: UserResponse::from(view.sender),
            content: view.content,
            chat_id: view.chat_id.to_string(),
            chat,
            created_at: view.created_at.to_rfc3339(),
            updated_at: view.updated_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
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

    #[test]
    fn test_user_response_never_leaks_password() {
        let json = serde_json::to_string(&UserResponse::from(test_user(7))).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains(r#""id":"7""#));
    }

    #[test]
    fn test_chat_response_uses_camel_case() {
        let view = ChatView {
            id: 500,
            chat_name: "weekend plans".into(),
            is_group_chat: true,
            users: vec![test_user(1), test_user(2), test_user(3)],
            group_admin: Some(test_user(1)),
            latest_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&ChatResponse::from(view)).unwrap();
        assert!(json.contains(r#""chatName":"weekend plans""#));
        assert!(json.contains(r#""isGroupChat":true"#));
        assert!(json.contains(r#""groupAdmin""#));
        assert!(json.contains(r#""latestMessage":null"#));
    }

    #[test]
    fn test_message_response_omits_chat_when_absent() {
        let view = MessageView {
            id: 10,
            sender: test_user(1),
            content: "hello".into(),
            chat_id: 500,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&MessageResponse::from_view(view, None)).unwrap();
        assert!(!json.contains(r#""chat":"#));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&json).unwrap()["chatId"],
            "500"
        );
    }
}
