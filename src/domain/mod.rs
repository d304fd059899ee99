//! # Domain Layer
//!
//! Core business entities and repository traits.

pub mod entities;

pub use entities::{
    Chat, ChatRepository, Message, MessageRepository, User, UserRepository,
};
