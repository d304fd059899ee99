//! HTTP Presentation
//!
//! REST routes and their handlers.

pub mod handlers;
pub mod routes;
