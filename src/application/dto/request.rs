//! Request DTOs
//!
//! Data structures for API request bodies. IDs arrive as decimal strings so
//! JavaScript clients never lose precision on 64-bit values; the fields the
//! source API checked explicitly stay `Option` so the handlers can return a
//! targeted 400 instead of a generic deserialization failure.

use serde::Deserialize;
use validator::Validate;

use crate::shared::error::AppError;

/// Open-or-create a direct chat with another user
#[derive(Debug, Deserialize)]
pub struct AccessChatRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Create a group chat. `users` is a JSON-encoded array of user ID strings,
/// matching the multipart-friendly shape of the original API.
#[derive(Debug, Deserialize)]
pub struct CreateGroupChatRequest {
    pub name: Option<String>,
    pub users: Option<String>,
}

/// Rename a chat
#[derive(Debug, Deserialize, Validate)]
pub struct RenameChatRequest {
    #[serde(rename = "chatId")]
    pub chat_id: String,

    #[serde(rename = "chatName")]
    #[validate(length(min = 1, max = 100, message = "Chat name must be 1-100 characters"))]
    pub chat_name: String,
}

/// Add or remove a chat member
#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    #[serde(rename = "chatId")]
    pub chat_id: String,

    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Send a message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: Option<String>,

    #[serde(rename = "chatId")]
    pub chat_id: Option<String>,
}

/// Parse a decimal string ID from a request body.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid ID: {raw}")))
}

/// Parse the JSON-encoded user list of a group-creation request.
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>, AppError> {
    let ids: Vec<String> = serde_json::from_str(raw)
        .map_err(|_| AppError::BadRequest("Invalid user list".to_string()))?;
    ids.iter().map(|id| parse_id(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_access_chat_accepts_missing_user_id() {
        let req: AccessChatRequest = serde_json::from_str("{}").unwrap();
        assert!(req.user_id.is_none());
    }

    #[test]
    fn test_camel_case_field_names() {
        let req: MembershipRequest =
            serde_json::from_str(r#"{"chatId": "500", "userId": "7"}"#).unwrap();
        assert_eq!(req.chat_id, "500");
        assert_eq!(req.user_id, "7");
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("7").is_ok());
        assert!(parse_id("abc").is_err());
    }

    #[test]
    fn test_parse_id_list() {
        let ids = parse_id_list(r#"["1", "2", "3"]"#).unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(parse_id_list("not json").is_err());
        assert!(parse_id_list(r#"["1", "x"]"#).is_err());
    }
}
