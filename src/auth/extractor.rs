// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for request credentials.
//!
//! The bearer token is only extracted here. Verifying it needs the provider
//! named in the request body, so handlers pass it on to the
//! [`TokenVerifier`](super::TokenVerifier) themselves:
//!
//! ```rust,ignore
//! async fn authenticate(
//!     State(state): State<AppState>,
//!     BearerToken(token): BearerToken,
//!     Json(request): Json<AuthRequest>,
//! ) -> Result<Json<AuthResponse>, ApiError> {
//!     let identity = state.verifier.verify(&token, provider).await?;
//!     // ...
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::AuthError;
use crate::state::AppState;

/// Header carrying the administrative key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Raw bearer token from the `Authorization` header.
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        Ok(BearerToken(token.to_string()))
    }
}

/// Extractor that requires the configured admin key.
///
/// Rejects every request when no admin key is configured.
pub struct AdminOnly;

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_key.as_deref() else {
            tracing::warn!("Admin request rejected: no admin key configured");
            return Err(AuthError::Forbidden);
        };

        let presented = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match presented {
            Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => Ok(AdminOnly),
            _ => {
                tracing::warn!(path = %parts.uri.path(), "Admin request rejected: bad admin key");
                Err(AuthError::Forbidden)
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
