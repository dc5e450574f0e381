// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Verifies identity tokens issued by Apple and Google.
//!
//! ## Auth Flow
//!
//! 1. The app signs the user in with the provider
//! 2. The app sends `Authorization: Bearer <id token>` with the provider name
//! 3. The gateway:
//!    - Looks up the token's `kid` in the shared key cache
//!    - Verifies signature, expiry, issuer and audience
//!    - On any failure, fetches the provider's key set once and retries
//!    - Extracts `sub` and `email` for user lookup
//!
//! ## Security
//!
//! - Only RS256/RS384/RS512 tokens carrying a `kid` are accepted
//! - A key is only used for the provider whose key set published it
//! - Cached keys expire after a TTL (30 minutes by default)
//! - Clock skew tolerance is 60 seconds

pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod keys;
pub mod provider;
pub mod verifier;

pub use error::AuthError;
pub use extractor::{AdminOnly, BearerToken, ADMIN_KEY_HEADER};
pub use fetcher::{FetchError, KeyFetcher};
pub use keys::{PublicKeyCache, PublicKeyEntry};
pub use provider::{ProviderRegistry, ProviderSettings};
pub use verifier::{SubjectClaims, TokenVerifier, VerifiedIdentity};
