// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Model
//!
//! Users, their entitlements and subscription state. These are the records
//! owned by the identity store; everything else receives clones.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Auth Provider
// =============================================================================

/// Identity provider a user authenticated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Apple,
    /// Anonymous device session. Never carries a token.
    Guest,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Apple => "apple",
            AuthProvider::Guest => "guest",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(AuthProvider::Google),
            "apple" => Ok(AuthProvider::Apple),
            "guest" => Ok(AuthProvider::Guest),
            other => Err(format!("unknown auth provider: {other}")),
        }
    }
}

// =============================================================================
// Subscription
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    #[default]
    Free,
    Premium,
}

/// Store the subscription was purchased through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlatform {
    #[default]
    None,
    Apple,
    Google,
}

/// Subscription fields as reported by the purchase platform.
///
/// Stored verbatim; no billing logic runs on them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    #[serde(rename = "type", default)]
    pub kind: SubscriptionType,
    #[serde(default)]
    pub platform: SubscriptionPlatform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn is_premium(&self) -> bool {
        self.kind == SubscriptionType::Premium
    }
}

// =============================================================================
// Entitlements
// =============================================================================

/// Usage allowance and consumption for the current window.
///
/// After a successful increment `messages_used <= daily_message_limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Entitlements {
    pub daily_message_limit: u32,
    pub messages_used: u32,
    pub last_reset: DateTime<Utc>,
    #[serde(default)]
    pub subscription: Subscription,
}

impl Entitlements {
    /// Messages left in the current window.
    pub fn remaining(&self) -> u32 {
        self.daily_message_limit.saturating_sub(self.messages_used)
    }
}

/// Partial entitlement update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementsUpdate {
    pub daily_message_limit: Option<u32>,
    pub messages_used: Option<u32>,
    pub subscription: Option<Subscription>,
}

impl EntitlementsUpdate {
    pub fn apply_to(self, entitlements: &mut Entitlements) {
        if let Some(limit) = self.daily_message_limit {
            entitlements.daily_message_limit = limit;
        }
        if let Some(used) = self.messages_used {
            entitlements.messages_used = used;
        }
        if let Some(subscription) = self.subscription {
            entitlements.subscription = subscription;
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A user record.
///
/// `username` is the external lookup key (device id for guests, the
/// provider handle otherwise). `id` is a surrogate generated at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub auth_provider: AuthProvider,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub entitlements: Entitlements,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("Apple".parse::<AuthProvider>(), Ok(AuthProvider::Apple));
        assert_eq!("GOOGLE".parse::<AuthProvider>(), Ok(AuthProvider::Google));
        assert!("facebook".parse::<AuthProvider>().is_err());
    }

    #[test]
    fn subscription_type_serializes_under_type_key() {
        let subscription = Subscription {
            kind: SubscriptionType::Premium,
            platform: SubscriptionPlatform::Apple,
            original_transaction_id: Some("1000000123".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&subscription).unwrap();
        assert_eq!(json["type"], "premium");
        assert_eq!(json["platform"], "apple");
        assert!(json.get("expires_at").is_none());
    }

    #[test]
    fn empty_subscription_object_defaults_to_free() {
        let subscription: Subscription = serde_json::from_str("{}").unwrap();
        assert_eq!(subscription.kind, SubscriptionType::Free);
        assert_eq!(subscription.platform, SubscriptionPlatform::None);
    }

    #[test]
    fn partial_update_keeps_unset_fields() {
        let mut entitlements = Entitlements {
            daily_message_limit: 5,
            messages_used: 3,
            last_reset: Utc::now(),
            subscription: Subscription::default(),
        };
        EntitlementsUpdate {
            daily_message_limit: Some(20),
            ..Default::default()
        }
        .apply_to(&mut entitlements);

        assert_eq!(entitlements.daily_message_limit, 20);
        assert_eq!(entitlements.messages_used, 3);
        assert_eq!(entitlements.remaining(), 17);
    }
}
