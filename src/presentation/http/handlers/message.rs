//! Message Handlers
//!
//! Message creation and history endpoints. The send response carries the
//! fully resolved message; the sender's client then emits it as a
//! `new message` socket event, which is what fans it out to the other
//! participants' live connections.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{parse_id, SendMessageRequest};
use crate::application::dto::response::{ChatResponse, MessageResponse};
use crate::application::services::{MessageError, MessageService, MessageServiceImpl};
use crate::infrastructure::repositories::{
    PgChatRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn message_service(
    state: &AppState,
) -> MessageServiceImpl<PgChatRepository, PgUserRepository, PgMessageRepository> {
    MessageServiceImpl::new(
        Arc::new(PgChatRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgMessageRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_message_error(e: MessageError) -> AppError {
    match e {
        MessageError::ChatNotFound => AppError::NotFound("Chat not found".into()),
        MessageError::UserNotFound => AppError::NotFound("User not found".into()),
        MessageError::Validation(msg) => AppError::BadRequest(msg),
        MessageError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Persist a message and return it fully resolved. Fanout happens when the
/// sender's client echoes the response as a `new message` socket event, so
/// the REST path must not dispatch it a second time.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let (content, chat_id) = match (body.content, body.chat_id) {
        (Some(content), Some(chat_id)) => (content, chat_id),
        _ => {
            return Err(AppError::BadRequest(
                "Invalid data passed into request".into(),
            ))
        }
    };
    let chat_id = parse_id(&chat_id)?;

    let sent = message_service(&state)
        .send_message(auth.user_id, chat_id, &content)
        .await
        .map_err(map_message_error)?;

    let chat = ChatResponse::from(sent.chat);
    let response = MessageResponse::from_view(sent.message, Some(chat));

    Ok((StatusCode::CREATED, Json(response)))
}

/// Full message history of a chat, oldest first
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let chat_id = parse_id(&chat_id)?;

    let messages = message_service(&state)
        .list_messages(chat_id)
        .await
        .map_err(map_message_error)?;

    Ok(Json(
        messages
            .into_iter()
            .map(|m| MessageResponse::from_view(m, None))
            .collect(),
    ))
}
