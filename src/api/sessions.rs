// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints: guest and provider sign-in.
//!
//! Both resolve the caller to a stored user, creating one on first contact.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{AuthError, BearerToken},
    domain::AuthProvider,
    error::ApiError,
    models::{required, AuthRequest, GuestRequest, UserResponse},
    state::AppState,
};

fn created_or_ok(created: bool) -> StatusCode {
    if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

/// Start or resume an anonymous session.
///
/// The device id is the guest's username.
#[utoipa::path(
    post,
    path = "/api/v1/guest",
    tag = "Sessions",
    request_body = GuestRequest,
    responses(
        (status = 200, description = "Existing guest", body = UserResponse),
        (status = 201, description = "Guest created", body = UserResponse),
        (status = 400, description = "Missing device_id"),
        (status = 409, description = "device_id belongs to a provider account")
    )
)]
pub async fn guest_session(
    State(state): State<AppState>,
    Json(request): Json<GuestRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let device_id = required(request.device_id.as_deref())
        .ok_or_else(|| ApiError::bad_request("device_id is required"))?
        .to_string();

    let users = state.users.clone();
    let (user, created) = tokio::task::spawn_blocking(move || {
        users.get_or_create(AuthProvider::Guest, &device_id, "")
    })
    .await??;

    // Device ids share the username index with provider accounts.
    if user.auth_provider != AuthProvider::Guest {
        tracing::warn!(user_id = %user.id, "Guest session requested for a provider account");
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "device_id belongs to a signed-in account",
        ));
    }

    Ok((created_or_ok(created), Json(UserResponse { user })))
}

/// Sign in with an Apple or Google identity token.
///
/// `username` defaults to the token subject and `email` to its `email` claim.
#[utoipa::path(
    post,
    path = "/api/v1/auth",
    tag = "Sessions",
    request_body = AuthRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Existing user", body = UserResponse),
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Missing field or unsupported provider"),
        (status = 401, description = "Missing, malformed, invalid or expired token")
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Json(request): Json<AuthRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let provider_name = required(request.provider.as_deref())
        .ok_or_else(|| ApiError::bad_request("provider is required"))?;
    let provider: AuthProvider = provider_name
        .parse()
        .map_err(|_| AuthError::UnsupportedProvider(provider_name.to_string()))?;
    let device_id = required(request.device_id.as_deref())
        .ok_or_else(|| ApiError::bad_request("device_id is required"))?;

    let identity = state.verifier.verify(&token, provider).await?;

    let username = required(request.username.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| identity.claims.subject.clone());
    let email = required(request.email.as_deref())
        .map(str::to_string)
        .or_else(|| identity.claims.email.clone())
        .ok_or_else(|| ApiError::bad_request("email is required for authenticated sessions"))?;

    tracing::debug!(
        provider = %provider,
        device_id,
        subject = %identity.claims.subject,
        "Token verified"
    );

    let users = state.users.clone();
    let (user, created) =
        tokio::task::spawn_blocking(move || users.get_or_create(provider, &username, &email))
            .await??;

    Ok((created_or_ok(created), Json(UserResponse { user })))
}
