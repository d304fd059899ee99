//! WebSocket Event Types
//!
//! Tagged event schemas for the socket contract. Every frame is a JSON
//! object of the form `{"event": "<name>", "data": ...}`; payloads are
//! validated at this boundary before reaching any component, so nothing
//! downstream ever sees an untyped blob.
//!
//! IDs cross the wire as strings: snowflakes exceed the JavaScript
//! safe-integer range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serialize an i64 ID as a string; accept either form on the way in.
pub(crate) mod id_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(i64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Public user identity carried on the wire. Never includes credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(with = "id_str")]
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A chat-room scoped signal (join / typing / stop typing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomPayload {
    #[serde(rename = "chatId", with = "id_str")]
    pub chat_id: i64,
}

/// Chat shape as carried inside a message payload. `users` must be fully
/// resolved by the send path; an empty list aborts fanout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[serde(with = "id_str")]
    pub id: i64,
    pub chat_name: String,
    pub is_group_chat: bool,
    #[serde(default)]
    pub users: Vec<UserPayload>,
}

/// Full resolved message payload, as emitted by the sender's client after
/// the REST send succeeds and as delivered to every recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(with = "id_str")]
    pub id: i64,
    pub sender: UserPayload,
    pub content: String,
    pub chat: ChatPayload,
    pub created_at: DateTime<Utc>,
}

/// Events received from a client connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Bind this connection to the user's personal room
    #[serde(rename = "setup")]
    Setup(UserPayload),

    /// Subscribe this connection to a chat room
    #[serde(rename = "join chat")]
    JoinChat(RoomPayload),

    /// Ephemeral typing indicator for a chat room
    #[serde(rename = "typing")]
    Typing(RoomPayload),

    /// Typing indicator cleared
    #[serde(rename = "stop typing")]
    StopTyping(RoomPayload),

    /// A freshly persisted message, ready for fanout
    #[serde(rename = "new message")]
    NewMessage(MessagePayload),
}

/// Events sent to a client connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Setup acknowledgment, sent to the registering connection only
    #[serde(rename = "connected")]
    Connected,

    /// Message delivery into a recipient's personal room
    #[serde(rename = "message received")]
    MessageReceived(MessagePayload),

    /// Relayed typing indicator
    #[serde(rename = "typing")]
    Typing(RoomPayload),

    /// Relayed stop-typing indicator
    #[serde(rename = "stop typing")]
    StopTyping(RoomPayload),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_user(id: i64) -> UserPayload {
        UserPayload {
            id,
            name: format!("user-{id}"),
            email: format!("user{id}@example.com"),
            avatar_url: None,
        }
    }

    #[test]
    fn test_setup_event_parses() {
        let frame = r#"{"event":"setup","data":{"id":"42","name":"Ada","email":"ada@example.com"}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();

        match event {
            ClientEvent::Setup(user) => {
                assert_eq!(user.id, 42);
                assert_eq!(user.name, "Ada");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_join_chat_event_parses() {
        let frame = r#"{"event":"join chat","data":{"chatId":"7"}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        assert_eq!(event, ClientEvent::JoinChat(RoomPayload { chat_id: 7 }));
    }

    #[test]
    fn test_typing_events_parse() {
        let typing: ClientEvent =
            serde_json::from_str(r#"{"event":"typing","data":{"chatId":9}}"#).unwrap();
        let stop: ClientEvent =
            serde_json::from_str(r#"{"event":"stop typing","data":{"chatId":9}}"#).unwrap();

        assert_eq!(typing, ClientEvent::Typing(RoomPayload { chat_id: 9 }));
        assert_eq!(stop, ClientEvent::StopTyping(RoomPayload { chat_id: 9 }));
    }

    #[test]
    fn test_connected_serializes_tag_only() {
        let json = serde_json::to_string(&ServerEvent::Connected).unwrap();
        assert_eq!(json, r#"{"event":"connected"}"#);
    }

    #[test]
    fn test_message_received_roundtrip() {
        let payload = MessagePayload {
            id: 1,
            sender: sample_user(5),
            content: "hi".into(),
            chat: ChatPayload {
                id: 2,
                chat_name: "sender".into(),
                is_group_chat: false,
                users: vec![sample_user(5), sample_user(6)],
            },
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&ServerEvent::MessageReceived(payload.clone())).unwrap();
        assert!(json.contains(r#""event":"message received""#));
        assert!(json.contains(r#""chatName":"sender""#));

        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ServerEvent::MessageReceived(payload));
    }

    #[test]
    fn test_ids_serialize_as_strings() {
        let user = sample_user(9007199254740993); // beyond JS safe integers
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains(r#""id":"9007199254740993""#));
    }

    #[test]
    fn test_unresolved_chat_users_defaults_empty() {
        let frame = r#"{"event":"new message","data":{
            "id":"1",
            "sender":{"id":"5","name":"A","email":"a@example.com"},
            "content":"hi",
            "chat":{"id":"2","chatName":"sender","isGroupChat":false},
            "createdAt":"2024-01-01T00:00:00Z"
        }}"#;

        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        match event {
            ClientEvent::NewMessage(message) => assert!(message.chat.users.is_empty()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_is_an_error() {
        let frame = r#"{"event":"leave chat","data":{"chatId":"7"}}"#;
        assert!(serde_json::from_str::<ClientEvent>(frame).is_err());
    }
}
