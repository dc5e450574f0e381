// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive
//! `ToSchema` for the OpenAPI document.
//!
//! Required request members are declared as `Option` so that a missing
//! member is answered with a 400 and a readable message rather than the
//! extractor's generic rejection.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Subscription, User};

// =============================================================================
// Session Models
// =============================================================================

/// Request body for `POST /api/v1/guest`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GuestRequest {
    /// Stable device identifier; becomes the guest's username.
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Request body for `POST /api/v1/auth`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AuthRequest {
    /// `apple` or `google`.
    #[serde(default)]
    #[schema(example = "apple")]
    pub provider: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    /// Defaults to the token subject.
    #[serde(default)]
    pub username: Option<String>,
    /// Defaults to the token's `email` claim.
    #[serde(default)]
    pub email: Option<String>,
}

/// Response of the session endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user: User,
}

// =============================================================================
// Chat Models
// =============================================================================

/// Request body for `POST /api/v1/next-message` and `POST /api/v1/summarize`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub user_id: String,
    /// Conversation so far, alternating user / assistant, user first.
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub result: String,
}

// =============================================================================
// Admin Models
// =============================================================================

/// Request body for `POST /api/v1/set-entitlements`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetEntitlementsRequest {
    pub username: String,
    #[serde(default)]
    pub subscription: Subscription,
}

/// Request body for `POST /api/v1/update-prompt`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdatePromptRequest {
    pub prompt: String,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trimmed, non-empty value of an optional request member.
pub fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
