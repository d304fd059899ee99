//! Live Room Registry
//!
//! The authoritative live mapping between connections, user identities, and
//! chat rooms. Owned by `AppState`, constructed once at startup, and mutated
//! only by the connection lifecycle handler; the fanout engine and presence
//! relay read it to route events.
//!
//! Two kinds of room exist:
//! - the **personal room**, keyed by user ID — every connection a user holds
//!   is a member, and message delivery targets it so the user receives
//!   events regardless of which chat window is open;
//! - **chat rooms**, keyed by chat ID — joined explicitly per connection and
//!   used to scope typing indicators.
//!
//! All delivery is fire-and-forget over each connection's unbounded mpsc
//! sender: at-most-once, best-effort, with closed receivers skipped silently.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::events::ServerEvent;

/// A registered connection with its outbound channel.
pub struct LiveConnection {
    pub connection_id: String,
    pub user_id: i64,
    /// Chat rooms this connection joined; rooms accumulate for the
    /// connection's lifetime (there is no leave signal) and the list is
    /// only read back at unregister time for cleanup.
    joined_chats: Mutex<Vec<i64>>,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Live room registry managing all connections.
pub struct RoomRegistry {
    /// Active connections by connection ID
    connections: DashMap<String, Arc<LiveConnection>>,
    /// Personal rooms: user ID -> connection IDs (multi-device)
    user_rooms: DashMap<i64, Vec<String>>,
    /// Chat rooms: chat ID -> connection IDs
    chat_rooms: DashMap<i64, Vec<String>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_rooms: DashMap::new(),
            chat_rooms: DashMap::new(),
        }
    }

    /// Bind a connection to a user's personal room.
    ///
    /// Idempotent per connection ID: re-registering an already bound
    /// connection leaves the existing binding untouched.
    pub fn register(
        &self,
        connection_id: &str,
        user_id: i64,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) {
        if self.connections.contains_key(connection_id) {
            tracing::debug!(
                connection_id = %connection_id,
                "Duplicate setup ignored"
            );
            return;
        }

        let connection = Arc::new(LiveConnection {
            connection_id: connection_id.to_string(),
            user_id,
            joined_chats: Mutex::new(Vec::new()),
            sender,
        });

        self.connections
            .insert(connection_id.to_string(), connection);
        self.user_rooms
            .entry(user_id)
            .or_default()
            .push(connection_id.to_string());

        tracing::info!(
            user_id = user_id,
            connection_id = %connection_id,
            "Connection registered"
        );
    }

    /// Subscribe a connection to a chat room. Additive: earlier joins are
    /// kept. Returns false (and does nothing) for an unregistered
    /// connection, so a join racing a disconnect cannot resurrect bindings.
    pub fn join_room(&self, connection_id: &str, chat_id: i64) -> bool {
        let Some(connection) = self.connections.get(connection_id) else {
            tracing::debug!(
                connection_id = %connection_id,
                chat_id = chat_id,
                "Join for unregistered connection dropped"
            );
            return false;
        };

        {
            let mut joined = connection.joined_chats.lock();
            if joined.contains(&chat_id) {
                return true;
            }
            joined.push(chat_id);
        }

        self.chat_rooms
            .entry(chat_id)
            .or_default()
            .push(connection_id.to_string());

        tracing::debug!(
            connection_id = %connection_id,
            chat_id = chat_id,
            "Connection joined chat room"
        );
        true
    }

    /// Remove all bindings for a connection. Safe to call for connections
    /// that never completed setup, and safe to call more than once.
    pub fn unregister(&self, connection_id: &str) {
        let Some((_, connection)) = self.connections.remove(connection_id) else {
            return;
        };

        // Drop the room key once its last member leaves, so the maps track
        // only live rooms instead of every id ever seen
        if let Some(mut members) = self.user_rooms.get_mut(&connection.user_id) {
            members.retain(|c| c != connection_id);
        }
        self.user_rooms
            .remove_if(&connection.user_id, |_, members| members.is_empty());

        for chat_id in connection.joined_chats.lock().iter() {
            if let Some(mut members) = self.chat_rooms.get_mut(chat_id) {
                members.retain(|c| c != connection_id);
            }
            self.chat_rooms
                .remove_if(chat_id, |_, members| members.is_empty());
        }

        tracing::info!(
            user_id = connection.user_id,
            connection_id = %connection_id,
            "Connection unregistered"
        );
    }

    /// Deliver an event to every connection in a user's personal room.
    /// Returns the number of connections the event was handed to.
    pub fn send_to_user(&self, user_id: i64, event: &ServerEvent) -> usize {
        let Some(connection_ids) = self.user_rooms.get(&user_id) else {
            return 0;
        };

        let mut delivered = 0;
        for connection_id in connection_ids.value() {
            if let Some(connection) = self.connections.get(connection_id) {
                if connection.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Deliver an event to every connection joined to a chat room, except
    /// the originating connection. Returns the delivery count.
    pub fn broadcast_to_room_except(
        &self,
        chat_id: i64,
        origin_connection: &str,
        event: &ServerEvent,
    ) -> usize {
        let Some(connection_ids) = self.chat_rooms.get(&chat_id) else {
            return 0;
        };

        let mut delivered = 0;
        for connection_id in connection_ids.value() {
            if connection_id == origin_connection {
                continue;
            }
            if let Some(connection) = self.connections.get(connection_id) {
                if connection.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// The user a connection is bound to, if it completed setup.
    pub fn user_of(&self, connection_id: &str) -> Option<i64> {
        self.connections.get(connection_id).map(|c| c.user_id)
    }

    /// Whether the user holds at least one live connection.
    pub fn is_user_online(&self, user_id: i64) -> bool {
        self.user_rooms
            .get(&user_id)
            .map(|members| !members.is_empty())
            .unwrap_or(false)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
