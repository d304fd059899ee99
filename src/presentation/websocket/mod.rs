//! WebSocket Gateway
//!
//! Real-time communication: live room registry, message fanout, and
//! presence relay over WebSocket connections.

pub mod connection;
pub mod events;
pub mod fanout;
pub mod handler;
pub mod registry;

pub use connection::ConnectionState;
pub use events::{ChatPayload, ClientEvent, MessagePayload, RoomPayload, ServerEvent, UserPayload};
pub use fanout::{FanoutEngine, FanoutError, PresenceRelay};
pub use handler::ws_handler;
pub use registry::RoomRegistry;
