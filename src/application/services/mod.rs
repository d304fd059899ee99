//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **ChatService**: Conversation lifecycle and membership
//! - **MessageService**: Message creation and history

pub mod chat_service;
pub mod message_service;

// Re-export chat service types
pub use chat_service::{ChatError, ChatService, ChatServiceImpl, ChatView, MessageView};

// Re-export message service types
pub use message_service::{MessageError, MessageService, MessageServiceImpl, SentMessage};
