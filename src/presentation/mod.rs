//! Presentation Layer
//!
//! HTTP routes and WebSocket handlers.

pub mod http;
pub mod middleware;
pub mod websocket;
