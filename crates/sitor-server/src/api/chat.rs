use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use sitor_store::ChatMessage;

use super::{AppState, JsonBody};
use crate::auth::AuthUser;
use crate::error::ServerError;
use crate::services::chat;

#[derive(Serialize)]
pub(crate) struct ChatHistoryResponse {
    success: bool,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
pub(crate) struct ChatAppendResponse {
    success: bool,
    message: &'static str,
    entry: ChatMessage,
}

#[derive(Deserialize)]
pub(crate) struct ChatMessageRequest {
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    message: String,
}

pub(crate) async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ChatHistoryResponse>, ServerError> {
    let messages = state
        .store
        .run(move |db| chat::chat_messages(db, auth.user_id))
        .await?;
    Ok(Json(ChatHistoryResponse {
        success: true,
        messages,
    }))
}

pub(crate) async fn append(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<ChatMessageRequest>,
) -> Result<Json<ChatAppendResponse>, ServerError> {
    let sender = req
        .sender
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "user".to_string());
    let now = Utc::now();
    let entry = state
        .store
        .run(move |db| chat::add_chat_message(db, auth.user_id, sender, req.message, now))
        .await?;
    Ok(Json(ChatAppendResponse {
        success: true,
        message: "Message added",
        entry,
    }))
}
