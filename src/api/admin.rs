// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! These endpoints require the `x-admin-key` header and provide:
//! - Subscription tier changes
//! - Chat model configuration
//! - System prompt replacement

use axum::{extract::State, Json};

use crate::{
    auth::AdminOnly,
    chat::ChatConfig,
    error::ApiError,
    models::{MessageResponse, SetEntitlementsRequest, UpdatePromptRequest},
    state::AppState,
};

/// Move a user to a subscription tier.
///
/// Premium raises the allowance and clears usage; free restores the free
/// allowance and keeps usage.
#[utoipa::path(
    post,
    path = "/api/v1/set-entitlements",
    tag = "Admin",
    request_body = SetEntitlementsRequest,
    security(("admin_key" = [])),
    responses(
        (status = 200, description = "Entitlements updated", body = MessageResponse),
        (status = 400, description = "Missing username"),
        (status = 403, description = "Admin key missing or wrong"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_entitlements(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<SetEntitlementsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let username = request.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::bad_request("username is required"));
    }

    let update = state.users.policy().tier_transition(request.subscription);
    let users = state.users.clone();
    tokio::task::spawn_blocking(move || users.set_entitlements(&username, update)).await??;

    Ok(Json(MessageResponse::new("Entitlements updated successfully")))
}

/// Replace the chat completion parameters.
#[utoipa::path(
    post,
    path = "/api/v1/update-config",
    tag = "Admin",
    request_body = ChatConfig,
    security(("admin_key" = [])),
    responses(
        (status = 200, description = "Config updated", body = MessageResponse),
        (status = 400, description = "Invalid config"),
        (status = 403, description = "Admin key missing or wrong")
    )
)]
pub async fn update_config(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Json(config): Json<ChatConfig>,
) -> Result<Json<MessageResponse>, ApiError> {
    if config.model.trim().is_empty() {
        return Err(ApiError::bad_request("model is required"));
    }
    if config.max_tokens == 0 {
        return Err(ApiError::bad_request("max_tokens must be positive"));
    }

    state.chat.update_config(config);
    Ok(Json(MessageResponse::new("Config updated successfully")))
}

/// Replace the system prompt used for replies.
#[utoipa::path(
    post,
    path = "/api/v1/update-prompt",
    tag = "Admin",
    request_body = UpdatePromptRequest,
    security(("admin_key" = [])),
    responses(
        (status = 200, description = "Prompt updated", body = MessageResponse),
        (status = 400, description = "Empty prompt"),
        (status = 403, description = "Admin key missing or wrong")
    )
)]
pub async fn update_prompt(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<UpdatePromptRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("prompt is required"));
    }

    state.chat.update_prompt(request.prompt);
    Ok(Json(MessageResponse::new("Prompt updated successfully")))
}
