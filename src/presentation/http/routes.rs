//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use super::handlers;
use crate::presentation::middleware::auth_middleware;
use crate::presentation::websocket::ws_handler;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(state.clone()))
        // WebSocket endpoint; clients identify themselves in-band via setup
        .route("/ws", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .fallback(|| async { AppError::NotFound("Route not found".into()) })
        .with_state(state)
}

/// API routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/chat", chat_routes(state.clone()))
        .nest("/message", message_routes(state))
}

/// Chat routes (protected)
fn chat_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::chat::access_chat))
        .route("/", get(handlers::chat::fetch_chats))
        .route("/group", post(handlers::chat::create_group_chat))
        .route("/rename", put(handlers::chat::rename_group))
        .route("/groupadd", put(handlers::chat::add_to_group))
        .route("/groupremove", put(handlers::chat::remove_from_group))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Message routes (protected)
fn message_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::message::send_message))
        .route("/{chat_id}", get(handlers::message::get_messages))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
