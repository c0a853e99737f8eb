use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{Conversation, Message, MessageType, NewConversation, NewMessage, User};
use crate::relay::ServerEvent;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRequest {
    pub property_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
    #[serde(default)]
    pub message_type: Option<MessageType>,
}

/// Loads a conversation `user` takes part in. Anything else is reported as
/// missing.
async fn participant_conversation(
    state: &AppState,
    user: &User,
    conversation_id: i32,
) -> Result<Conversation, ApiError> {
    match state.store.get_conversation(conversation_id).await? {
        Some(conversation) if conversation.is_participant(user.id) => Ok(conversation),
        _ => Err(ApiError::NotFound("Conversation")),
    }
}

/// Stores a message from `sender` and nudges the other participant's open
/// sockets. Shared by the REST endpoint and the socket relay.
pub async fn post_message(
    state: &AppState,
    sender: &User,
    conversation_id: i32,
    request: SendMessageRequest,
) -> Result<Message, ApiError> {
    request.validate()?;
    let conversation = participant_conversation(state, sender, conversation_id).await?;
    let message = state
        .store
        .create_message(NewMessage {
            conversation_id,
            sender_id: sender.id,
            content: request.content,
            message_type: request.message_type.unwrap_or(MessageType::Text),
        })
        .await?;
    let recipient = conversation.counterpart(sender.id);
    let delivered = state
        .relay
        .notify(recipient, ServerEvent::NewMessage { conversation_id })
        .await;
    log::debug!(
        "Message {} in conversation {} nudged {} socket(s)",
        message.id,
        conversation_id,
        delivered
    );
    Ok(message)
}

pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    Ok(Json(state.store.conversations_for_user(user.id).await?))
}

/// Opens (or reopens) the caller's conversation with a listing's landlord.
pub async fn start_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<StartConversationRequest>,
) -> Result<(StatusCode, Json<Conversation>), ApiError> {
    let record = state
        .store
        .get_property(body.property_id)
        .await?
        .filter(|record| record.property.is_active)
        .ok_or(ApiError::NotFound("Property"))?;
    if record.property.landlord_id == user.id {
        return Err(ApiError::BadRequest(
            "You cannot start a conversation about your own listing".to_string(),
        ));
    }
    let conversation = state
        .store
        .find_or_create_conversation(NewConversation {
            property_id: record.property.id,
            landlord_id: record.property.landlord_id,
            renter_id: user.id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<i32>,
) -> Result<Json<Vec<Message>>, ApiError> {
    participant_conversation(&state, &user, conversation_id).await?;
    Ok(Json(state.store.messages_in_conversation(conversation_id).await?))
}

pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<i32>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = post_message(&state, &user, conversation_id, body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    participant_conversation(&state, &user, conversation_id).await?;
    let updated = state.store.mark_messages_read(conversation_id, user.id).await?;
    Ok(Json(json!({ "updated": updated })))
}
