// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity provider settings.

use super::AuthError;
use crate::domain::AuthProvider;

/// Apple's published key set.
pub const APPLE_KEYS_URL: &str = "https://appleid.apple.com/auth/keys";

/// Google's published key set.
pub const GOOGLE_KEYS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Where to find a provider's keys and which claims its tokens must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub key_set_url: String,
    /// Accepted `iss` values. Empty disables the issuer check.
    pub issuers: Vec<String>,
    /// Expected `aud`. `None` disables the audience check.
    pub audience: Option<String>,
}

impl ProviderSettings {
    pub fn apple() -> Self {
        Self {
            key_set_url: APPLE_KEYS_URL.to_string(),
            issuers: vec!["https://appleid.apple.com".to_string()],
            audience: None,
        }
    }

    pub fn google() -> Self {
        Self {
            key_set_url: GOOGLE_KEYS_URL.to_string(),
            issuers: vec![
                "https://accounts.google.com".to_string(),
                "accounts.google.com".to_string(),
            ],
            audience: None,
        }
    }

    pub fn with_key_set_url(mut self, url: impl Into<String>) -> Self {
        self.key_set_url = url.into();
        self
    }

    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience;
        self
    }
}

/// Settings for every provider that can present a token.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    pub apple: Option<ProviderSettings>,
    pub google: Option<ProviderSettings>,
}

impl ProviderRegistry {
    /// Both providers with their public key-set URLs.
    pub fn public() -> Self {
        Self {
            apple: Some(ProviderSettings::apple()),
            google: Some(ProviderSettings::google()),
        }
    }

    pub fn settings(&self, provider: AuthProvider) -> Result<&ProviderSettings, AuthError> {
        let settings = match provider {
            AuthProvider::Apple => self.apple.as_ref(),
            AuthProvider::Google => self.google.as_ref(),
            AuthProvider::Guest => None,
        };
        settings.ok_or_else(|| AuthError::UnsupportedProvider(provider.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_has_no_settings() {
        let registry = ProviderRegistry::public();
        assert_eq!(
            registry.settings(AuthProvider::Guest),
            Err(AuthError::UnsupportedProvider("guest".to_string()))
        );
    }

    #[test]
    fn unconfigured_provider_is_unsupported() {
        let registry = ProviderRegistry {
            apple: Some(ProviderSettings::apple()),
            google: None,
        };
        assert!(registry.settings(AuthProvider::Apple).is_ok());
        assert!(matches!(
            registry.settings(AuthProvider::Google),
            Err(AuthError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn google_accepts_both_issuer_forms() {
        let google = ProviderSettings::google();
        assert!(google.issuers.contains(&"accounts.google.com".to_string()));
        assert!(google
            .issuers
            .contains(&"https://accounts.google.com".to_string()));
    }
}
