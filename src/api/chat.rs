// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chat endpoints.

use axum::{extract::State, Json};

use crate::{
    error::ApiError,
    models::{ChatRequest, ChatResponse},
    state::AppState,
};

/// Produce the next reply in a conversation.
///
/// Consumes one message from the user's allowance before the model is called.
#[utoipa::path(
    post,
    path = "/api/v1/next-message",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 403, description = "Daily message limit reached"),
        (status = 404, description = "User not found")
    )
)]
pub async fn next_message(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let users = state.users.clone();
    let user_id = request.user_id.clone();
    tokio::task::spawn_blocking(move || users.check_and_increment(&user_id)).await??;

    let result = state.chat.next_message(&request.messages).await;
    Ok(Json(ChatResponse { result }))
}

/// Summarize a conversation. Does not count against the allowance.
#[utoipa::path(
    post,
    path = "/api/v1/summarize",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Conversation summary", body = ChatResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let users = state.users.clone();
    let user_id = request.user_id.clone();
    tokio::task::spawn_blocking(move || users.get_user(&user_id)).await??;

    let result = state.chat.summarize(&request.messages).await;
    Ok(Json(ChatResponse { result }))
}
