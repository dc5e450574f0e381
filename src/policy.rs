// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Entitlement policy: reset window, default limits and tier transitions.
//!
//! The window is a plain duration measured from `last_reset`. It is not
//! aligned to calendar days.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{Entitlements, EntitlementsUpdate, Subscription};

/// Default usage window (1 minute).
pub const DEFAULT_RESET_WINDOW: Duration = Duration::from_secs(60);

/// Messages per window for free users.
pub const FREE_DAILY_MESSAGE_LIMIT: u32 = 5;

/// Messages per window for premium users.
pub const PREMIUM_DAILY_MESSAGE_LIMIT: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementPolicy {
    pub reset_window: Duration,
    pub free_daily_limit: u32,
    pub premium_daily_limit: u32,
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        Self {
            reset_window: DEFAULT_RESET_WINDOW,
            free_daily_limit: FREE_DAILY_MESSAGE_LIMIT,
            premium_daily_limit: PREMIUM_DAILY_MESSAGE_LIMIT,
        }
    }
}

impl EntitlementPolicy {
    /// Entitlements for a freshly created user.
    pub fn default_entitlements(&self, now: DateTime<Utc>) -> Entitlements {
        Entitlements {
            daily_message_limit: self.free_daily_limit,
            messages_used: 0,
            last_reset: now,
            subscription: Subscription::default(),
        }
    }

    /// Whether more than one full window has passed since `last_reset`.
    pub fn window_elapsed(&self, last_reset: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - last_reset).to_std() {
            Ok(elapsed) => elapsed > self.reset_window,
            // last_reset in the future (clock skew): not elapsed
            Err(_) => false,
        }
    }

    /// Zero the counter if the window rolled over. Returns true on reset.
    pub fn roll_window(&self, entitlements: &mut Entitlements, now: DateTime<Utc>) -> bool {
        if !self.window_elapsed(entitlements.last_reset, now) {
            return false;
        }
        entitlements.messages_used = 0;
        entitlements.last_reset = now;
        true
    }

    /// Build the update for moving a user onto `subscription`.
    ///
    /// Premium raises the limit to the premium ceiling and clears usage.
    /// Free restores the free limit and leaves usage as is.
    pub fn tier_transition(&self, subscription: Subscription) -> EntitlementsUpdate {
        if subscription.is_premium() {
            EntitlementsUpdate {
                daily_message_limit: Some(self.premium_daily_limit),
                messages_used: Some(0),
                subscription: Some(subscription),
            }
        } else {
            EntitlementsUpdate {
                daily_message_limit: Some(self.free_daily_limit),
                messages_used: None,
                subscription: Some(subscription),
            }
        }
    }
}
