//! # Domain Entities
//!
//! Core domain entities representing the main business objects in the chat
//! service. All entities map directly to their corresponding database tables.
//!
//! ## Entities
//!
//! - **User**: A registered account; created outside this core, read-only here
//! - **Chat**: A conversation — direct (1:1) or group — with its member set
//! - **Message**: A text message sent in a chat, immutable after creation
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access
//! operations. These traits are implemented in the infrastructure layer,
//! following the dependency inversion principle.

mod chat;
mod message;
mod user;

pub use chat::{Chat, ChatRepository};
pub use message::{Message, MessageRepository};
pub use user::{User, UserRepository};

#[cfg(test)]
pub use chat::MockChatRepository;
#[cfg(test)]
pub use message::MockMessageRepository;
#[cfg(test)]
pub use user::MockUserRepository;
