//! WebSocket Connection Handler
//!
//! Drives the lifecycle of a single client connection:
//! Connected -> Identified (setup) -> (Joined)* -> Closed.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use uuid::Uuid;

use super::connection::ConnectionState;
use super::events::{ClientEvent, ServerEvent};
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let max_message_size = state.settings.websocket.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    let mut connection = ConnectionState::new(connection_id.clone());

    tracing::debug!(connection_id = %connection_id, "New WebSocket connection");

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Create channel for outgoing events
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Spawn task to forward events from the channel to the WebSocket
    let writer_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Idle-connection timeout (no inbound frames within the window)
    let idle_timeout_secs = state.settings.websocket.idle_timeout_secs;
    let mut idle_check = interval(Duration::from_secs(idle_timeout_secs.max(1)));
    idle_check.tick().await; // Skip first immediate tick

    // Main event loop
    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        connection.touch();
                        // A malformed or unknown frame is logged and the
                        // connection stays open.
                        if let Err(e) = handle_event(&text, &mut connection, &tx, &state) {
                            tracing::debug!(
                                connection_id = %connection_id,
                                error = %e,
                                "Error handling event"
                            );
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed");
                        break;
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Pong replies are handled automatically by axum
                        connection.touch();
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }

            _ = idle_check.tick() => {
                if connection.is_idle(idle_timeout_secs) {
                    tracing::info!(
                        connection_id = %connection_id,
                        "Idle timeout, closing connection"
                    );
                    break;
                }
            }
        }
    }

    // Cleanup: unregister is the final word for this connection. It runs
    // exactly once here, and is a no-op for connections that never sent
    // setup; a join racing this close cannot resurrect the bindings.
    state.registry.unregister(&connection_id);
    writer_task.abort();

    tracing::info!(
        connection_id = %connection_id,
        user_id = ?connection.user_id,
        "Connection closed and cleaned up"
    );
}

/// Handle a single incoming event frame
fn handle_event(
    text: &str,
    connection: &mut ConnectionState,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    state: &AppState,
) -> Result<(), String> {
    let event: ClientEvent =
        serde_json::from_str(text).map_err(|e| format!("Invalid event frame: {}", e))?;

    match event {
        ClientEvent::Setup(user) => {
            if connection.is_identified() {
                tracing::debug!(
                    connection_id = %connection.connection_id,
                    "Setup repeated on identified connection, ignoring"
                );
                return Ok(());
            }

            state
                .registry
                .register(&connection.connection_id, user.id, tx.clone());
            connection.identify(user.id);

            // Acknowledge to this connection only
            let _ = tx.send(ServerEvent::Connected);
        }

        ClientEvent::JoinChat(room) => {
            if !connection.is_identified() {
                return Err("Join before setup dropped".into());
            }
            // Fire-and-forget by contract: no acknowledgment
            state.registry.join_room(&connection.connection_id, room.chat_id);
        }

        ClientEvent::Typing(room) => {
            state.presence.typing(&connection.connection_id, room.chat_id);
        }

        ClientEvent::StopTyping(room) => {
            state
                .presence
                .stop_typing(&connection.connection_id, room.chat_id);
        }

        ClientEvent::NewMessage(message) => {
            match state.fanout.dispatch(&message) {
                Ok(delivered) => {
                    tracing::trace!(
                        connection_id = %connection.connection_id,
                        message_id = message.id,
                        delivered = delivered,
                        "New message dispatched"
                    );
                }
                // The message is already persisted; log and carry on.
                Err(e) => tracing::warn!(
                    connection_id = %connection.connection_id,
                    error = %e,
                    "Fanout aborted"
                ),
            }
        }
    }

    Ok(())
}
