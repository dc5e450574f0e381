// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity token verification.
//!
//! A token is checked against the cached key first. If that attempt fails
//! for any reason (missing key, stale key, bad signature, expired claims)
//! the provider's key set is fetched once and the token is checked against
//! the fresh set. There is no third attempt.
//!
//! Tokens whose header or claims segment cannot be read are rejected up
//! front and never reach the cache or the network.

use std::sync::Arc;
use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;

use super::fetcher::{FetchError, KeyFetcher};
use super::keys::{PublicKeyCache, PublicKeyEntry};
use super::provider::{ProviderRegistry, ProviderSettings};
use super::AuthError;
use crate::domain::AuthProvider;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Claims read from provider tokens.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    iss: String,
    exp: i64,
}

/// Claims of a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectClaims {
    pub subject: String,
    pub email: Option<String>,
    pub issuer: String,
    /// Expiration (unix seconds)
    pub expires_at: i64,
}

/// Result of a successful verification. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub provider: AuthProvider,
    pub claims: SubjectClaims,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// Key from the cache, no network.
    Cached,
    /// Key from a forced fetch of the provider's key set.
    Refreshed,
}

/// Why an attempt did not produce an identity.
#[derive(Debug)]
enum AttemptFailure {
    UnknownKey,
    StaleKey,
    ForeignKey,
    Fetch(FetchError),
    Rejected(jsonwebtoken::errors::Error),
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::UnknownKey => write!(f, "key id not found"),
            AttemptFailure::StaleKey => write!(f, "cached key is stale"),
            AttemptFailure::ForeignKey => write!(f, "key was published by another provider"),
            AttemptFailure::Fetch(e) => write!(f, "key-set fetch failed: {e}"),
            AttemptFailure::Rejected(e) => write!(f, "token rejected: {e}"),
        }
    }
}

/// Verifies provider tokens against cached, rotating public keys.
#[derive(Clone)]
pub struct TokenVerifier {
    cache: Arc<PublicKeyCache>,
    fetcher: KeyFetcher,
    providers: ProviderRegistry,
    ttl: Duration,
}

impl TokenVerifier {
    pub fn new(
        cache: Arc<PublicKeyCache>,
        fetcher: KeyFetcher,
        providers: ProviderRegistry,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            fetcher,
            providers,
            ttl,
        }
    }

    pub fn cache(&self) -> &Arc<PublicKeyCache> {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verify `token` as issued by `provider`.
    pub async fn verify(
        &self,
        token: &str,
        provider: AuthProvider,
    ) -> Result<VerifiedIdentity, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let key_id = header.kid.ok_or(AuthError::MalformedToken)?;
        if !matches!(
            header.alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
        ) {
            return Err(AuthError::MalformedToken);
        }
        check_claims_shape(token)?;

        let settings = self.providers.settings(provider)?;
        let validation = validation_for(header.alg, settings);

        let mut attempt = Attempt::Cached;
        loop {
            let outcome = match attempt {
                Attempt::Cached => {
                    let cached = self.cache.lookup(&key_id).await;
                    self.check_entry(cached.as_ref(), settings)
                        .and_then(|entry| decode_with(token, entry, &validation))
                }
                Attempt::Refreshed => match self.refresh(settings).await {
                    Ok(fetched) => {
                        let entry = fetched.iter().find(|entry| entry.key_id == key_id);
                        self.check_entry(entry, settings)
                            .and_then(|entry| decode_with(token, entry, &validation))
                    }
                    Err(e) => Err(AttemptFailure::Fetch(e)),
                },
            };

            match (outcome, attempt) {
                (Ok(claims), _) => {
                    return Ok(VerifiedIdentity {
                        provider,
                        claims: SubjectClaims {
                            subject: claims.sub,
                            email: claims.email,
                            issuer: claims.iss,
                            expires_at: claims.exp,
                        },
                    })
                }
                (Err(reason), Attempt::Cached) => {
                    tracing::debug!(
                        provider = %provider,
                        kid = %key_id,
                        %reason,
                        "Cached key did not verify token, forcing key refresh"
                    );
                    attempt = Attempt::Refreshed;
                }
                (Err(reason), Attempt::Refreshed) => {
                    match &reason {
                        AttemptFailure::Fetch(_) => tracing::warn!(
                            provider = %provider,
                            kid = %key_id,
                            %reason,
                            "Token verification failed after key refresh"
                        ),
                        _ => tracing::debug!(
                            provider = %provider,
                            kid = %key_id,
                            %reason,
                            "Token verification failed after key refresh"
                        ),
                    }
                    return Err(AuthError::InvalidOrExpiredToken);
                }
            }
        }
    }

    /// Fetch the provider's key set and store it in the cache.
    ///
    /// On error the cache is left untouched.
    async fn refresh(&self, settings: &ProviderSettings) -> Result<Vec<PublicKeyEntry>, FetchError> {
        let fetched = self.fetcher.fetch(&settings.key_set_url).await?;
        self.cache.replace(fetched.clone()).await;
        tracing::info!(
            url = %settings.key_set_url,
            keys = fetched.len(),
            "Refreshed provider keys"
        );
        Ok(fetched)
    }

    fn check_entry<'a>(
        &self,
        entry: Option<&'a PublicKeyEntry>,
        settings: &ProviderSettings,
    ) -> Result<&'a PublicKeyEntry, AttemptFailure> {
        let entry = entry.ok_or(AttemptFailure::UnknownKey)?;
        if entry.source != settings.key_set_url {
            return Err(AttemptFailure::ForeignKey);
        }
        if !entry.is_fresh(self.ttl) {
            return Err(AttemptFailure::StaleKey);
        }
        Ok(entry)
    }
}

/// Decode the claims segment without checking the signature.
///
/// A payload that cannot be read can never verify, so it is rejected
/// before any key lookup or fetch.
fn check_claims_shape(token: &str) -> Result<(), AuthError> {
    let payload = token.split('.').nth(1).ok_or(AuthError::MalformedToken)?;
    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('='))
        .map_err(|_| AuthError::MalformedToken)?;
    serde_json::from_slice::<TokenClaims>(&bytes)
        .map(|_| ())
        .map_err(|_| AuthError::MalformedToken)
}

fn validation_for(algorithm: Algorithm, settings: &ProviderSettings) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.leeway = CLOCK_SKEW_LEEWAY;

    if !settings.issuers.is_empty() {
        validation.set_issuer(&settings.issuers);
    }

    match &settings.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    validation
}

fn decode_with(
    token: &str,
    entry: &PublicKeyEntry,
    validation: &Validation,
) -> Result<TokenClaims, AttemptFailure> {
    decode::<TokenClaims>(token, &entry.decoding_key(), validation)
        .map(|data| data.claims)
        .map_err(AttemptFailure::Rejected)
}
