//! Chat Handlers
//!
//! Conversation endpoints: direct-chat access, chat listing, group creation,
//! rename, and membership changes.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use validator::Validate;

use crate::application::dto::request::{
    parse_id, parse_id_list, AccessChatRequest, CreateGroupChatRequest, MembershipRequest,
    RenameChatRequest,
};
use crate::application::dto::response::ChatResponse;
use crate::application::services::{ChatError, ChatService, ChatServiceImpl};
use crate::infrastructure::repositories::{
    PgChatRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn chat_service(
    state: &AppState,
) -> ChatServiceImpl<PgChatRepository, PgUserRepository, PgMessageRepository> {
    ChatServiceImpl::new(
        Arc::new(PgChatRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgMessageRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_chat_error(e: ChatError) -> AppError {
    match e {
        ChatError::ChatNotFound => AppError::NotFound("Chat not found".into()),
        ChatError::UserNotFound => AppError::NotFound("User not found".into()),
        ChatError::Validation(msg) => AppError::BadRequest(msg),
        ChatError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Open the 1:1 chat with another user, creating it on first access
pub async fn access_chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<AccessChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let user_id = body
        .user_id
        .ok_or_else(|| AppError::BadRequest("UserId param not sent with request".into()))?;
    let other = parse_id(&user_id)?;

    let chat = chat_service(&state)
        .find_or_create_direct(auth.user_id, other)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(ChatResponse::from(chat)))
}

/// List the caller's chats, most recently active first
pub async fn fetch_chats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ChatResponse>>, AppError> {
    let chats = chat_service(&state)
        .list_for_user(auth.user_id)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(chats.into_iter().map(ChatResponse::from).collect()))
}

/// Create a group chat
pub async fn create_group_chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateGroupChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let (name, users) = match (body.name, body.users) {
        (Some(name), Some(users)) => (name, users),
        _ => return Err(AppError::BadRequest("Please fill all the fields".into())),
    };
    let member_ids = parse_id_list(&users)?;

    let chat = chat_service(&state)
        .create_group(auth.user_id, &name, member_ids)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(ChatResponse::from(chat)))
}

/// Rename a chat
pub async fn rename_group(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
    Json(body): Json<RenameChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    body.validate().map_err(validation_error)?;
    let chat_id = parse_id(&body.chat_id)?;

    let chat = chat_service(&state)
        .rename(chat_id, &body.chat_name)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(ChatResponse::from(chat)))
}

/// Add a user to a group chat
pub async fn add_to_group(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
    Json(body): Json<MembershipRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let chat_id = parse_id(&body.chat_id)?;
    let user_id = parse_id(&body.user_id)?;

    let chat = chat_service(&state)
        .add_member(chat_id, user_id)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(ChatResponse::from(chat)))
}

/// Remove a user from a group chat
pub async fn remove_from_group(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
    Json(body): Json<MembershipRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let chat_id = parse_id(&body.chat_id)?;
    let user_id = parse_id(&body.user_id)?;

    let chat = chat_service(&state)
        .remove_member(chat_id, user_id)
        .await
        .map_err(map_chat_error)?;

    Ok(Json(ChatResponse::from(chat)))
}
