//! Message Fanout Engine and Presence Relay
//!
//! Routes a freshly persisted message to every chat participant except the
//! sender, and relays ephemeral typing signals inside a chat room.

use std::sync::Arc;

use super::events::{MessagePayload, RoomPayload, ServerEvent};
use super::registry::RoomRegistry;

/// Fanout failure conditions. These are logged and swallowed by the caller:
/// the message itself already persisted, so they never surface to HTTP.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    /// The payload's chat arrived without a resolved participant list.
    /// Recipients cannot be recomputed from raw references, so the whole
    /// fanout is aborted rather than partially delivered.
    #[error("chat {chat_id} has no resolved participants; fanout aborted")]
    UnresolvedParticipants { chat_id: i64 },
}

/// Delivers one logical message event to the computed recipient set.
pub struct FanoutEngine {
    registry: Arc<RoomRegistry>,
}

impl FanoutEngine {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Fan a message out to all chat participants except the sender.
    ///
    /// Each recipient's personal room gets one `message received` event with
    /// the full payload; every live connection of that recipient receives it
    /// (multi-device), and offline recipients get zero — the message is
    /// already durable and will be seen on next fetch. Delivery order across
    /// recipients is unspecified.
    ///
    /// Returns the number of connections the event was delivered to.
    pub fn dispatch(&self, message: &MessagePayload) -> Result<usize, FanoutError> {
        if message.chat.users.is_empty() {
            return Err(FanoutError::UnresolvedParticipants {
                chat_id: message.chat.id,
            });
        }

        let event = ServerEvent::MessageReceived(message.clone());
        let mut delivered = 0;

        for user in &message.chat.users {
            if user.id == message.sender.id {
                continue;
            }
            delivered += self.registry.send_to_user(user.id, &event);
        }

        tracing::debug!(
            message_id = message.id,
            chat_id = message.chat.id,
            sender_id = message.sender.id,
            delivered = delivered,
            "Message fanned out"
        );

        Ok(delivered)
    }
}

/// Stateless pass-through for typing indicators. Nothing is persisted and
/// delivery is at-most-once: signals for rooms the recipient has not joined
/// are silently dropped.
pub struct PresenceRelay {
    registry: Arc<RoomRegistry>,
}

impl PresenceRelay {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Relay a typing signal to the chat room, excluding the origin.
    pub fn typing(&self, origin_connection: &str, chat_id: i64) -> usize {
        self.registry.broadcast_to_room_except(
            chat_id,
            origin_connection,
            &ServerEvent::Typing(RoomPayload { chat_id }),
        )
    }

    /// Relay a stop-typing signal to the chat room, excluding the origin.
    pub fn stop_typing(&self, origin_connection: &str, chat_id: i64) -> usize {
        self.registry.broadcast_to_room_except(
            chat_id,
            origin_connection,
            &ServerEvent::StopTyping(RoomPayload { chat_id }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::websocket::events::{ChatPayload, UserPayload};
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn user(id: i64) -> UserPayload {
        UserPayload {
            id,
            name: format!("user-{id}"),
            email: format!("user{id}@example.com"),
            avatar_url: None,
        }
    }

    fn message(sender: i64, participants: &[i64]) -> MessagePayload {
        MessagePayload {
            id: 1000,
            sender: user(sender),
            content: "hi".into(),
            chat: ChatPayload {
                id: 77,
                chat_name: "sender".into(),
                is_group_chat: participants.len() > 2,
                users: participants.iter().map(|&id| user(id)).collect(),
            },
            created_at: Utc::now(),
        }
    }

    fn connect(
        registry: &RoomRegistry,
        connection_id: &str,
        user_id: i64,
    ) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(connection_id, user_id, tx);
        rx
    }

    #[test]
    fn test_dispatch_excludes_sender() {
        let registry = Arc::new(RoomRegistry::new());
        let engine = FanoutEngine::new(registry.clone());

        let mut rx_sender = connect(&registry, "s", 1);
        let mut rx_p1 = connect(&registry, "p1", 2);
        let mut rx_p2 = connect(&registry, "p2", 3);

        let payload = message(1, &[1, 2, 3]);
        let delivered = engine.dispatch(&payload).unwrap();

        assert_eq!(delivered, 2);
        assert!(rx_sender.try_recv().is_err(), "sender must not get an echo");
        assert_eq!(
            rx_p1.try_recv().unwrap(),
            ServerEvent::MessageReceived(payload.clone())
        );
        assert_eq!(
            rx_p2.try_recv().unwrap(),
            ServerEvent::MessageReceived(payload)
        );
    }

    #[test]
    fn test_dispatch_reaches_every_device() {
        let registry = Arc::new(RoomRegistry::new());
        let engine = FanoutEngine::new(registry.clone());

        let mut rx_phone = connect(&registry, "phone", 2);
        let mut rx_laptop = connect(&registry, "laptop", 2);

        let payload = message(1, &[1, 2]);
        assert_eq!(engine.dispatch(&payload).unwrap(), 2);
        assert!(rx_phone.try_recv().is_ok());
        assert!(rx_laptop.try_recv().is_ok());
    }

    #[test]
    fn test_dispatch_offline_recipient_is_zero_deliveries() {
        let registry = Arc::new(RoomRegistry::new());
        let engine = FanoutEngine::new(registry);

        // Nobody is connected; the message is persisted regardless.
        let payload = message(1, &[1, 2]);
        assert_eq!(engine.dispatch(&payload).unwrap(), 0);
    }

    #[test]
    fn test_dispatch_aborts_on_unresolved_participants() {
        let registry = Arc::new(RoomRegistry::new());
        let engine = FanoutEngine::new(registry.clone());

        let mut rx = connect(&registry, "p1", 2);

        let payload = message(1, &[]);
        let err = engine.dispatch(&payload).unwrap_err();
        assert!(matches!(
            err,
            FanoutError::UnresolvedParticipants { chat_id: 77 }
        ));
        assert!(rx.try_recv().is_err(), "aborted fanout must deliver nothing");
    }

    #[test]
    fn test_presence_relay_excludes_origin() {
        let registry = Arc::new(RoomRegistry::new());
        let relay = PresenceRelay::new(registry.clone());

        let mut rx_a = connect(&registry, "a", 1);
        let mut rx_b = connect(&registry, "b", 2);
        registry.join_room("a", 5);
        registry.join_room("b", 5);

        assert_eq!(relay.typing("a", 5), 1);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(
            rx_b.try_recv().unwrap(),
            ServerEvent::Typing(RoomPayload { chat_id: 5 })
        );

        assert_eq!(relay.stop_typing("b", 5), 1);
        assert_eq!(
            rx_a.try_recv().unwrap(),
            ServerEvent::StopTyping(RoomPayload { chat_id: 5 })
        );
    }

    #[test]
    fn test_presence_relay_drops_for_unjoined_room() {
        let registry = Arc::new(RoomRegistry::new());
        let relay = PresenceRelay::new(registry.clone());

        let mut rx = connect(&registry, "a", 1);
        // "a" is registered but never joined chat 5.
        assert_eq!(relay.typing("someone-else", 5), 0);
        assert!(rx.try_recv().is_err());
    }
}
