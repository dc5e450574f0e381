// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key-set fetching and decoding.
//!
//! Downloads a provider's published key set and turns each key's base64url
//! `n` / `e` members into numeric form. A fetch either yields every key of
//! the document or an error; callers never see a partial set.

use std::time::{Duration, Instant};

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;

use super::keys::PublicKeyEntry;

/// Default key-set request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("key-set request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("HTTP {0} from key-set endpoint")]
    Status(u16),

    #[error("malformed key-set document: {0}")]
    Document(String),

    #[error("malformed key {kid}: {reason}")]
    KeyEncoding { kid: String, reason: String },
}

/// Key-set document as published by the provider.
#[derive(Debug, Deserialize)]
struct KeySetDocument {
    keys: Vec<RawKey>,
}

#[derive(Debug, Deserialize)]
struct RawKey {
    kid: String,
    n: String,
    e: String,
}

/// HTTP client for provider key sets.
#[derive(Clone)]
pub struct KeyFetcher {
    client: reqwest::Client,
}

impl KeyFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Fetch and decode the key set at `url`.
    pub async fn fetch(&self, url: &str) -> Result<Vec<PublicKeyEntry>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        let entries = decode_key_set(&body, url, Instant::now())?;

        tracing::info!(url, keys = entries.len(), "Fetched provider key set");
        Ok(entries)
    }
}

/// Decode a key-set document into cache entries stamped with `fetched_at`.
pub fn decode_key_set(
    body: &[u8],
    source: &str,
    fetched_at: Instant,
) -> Result<Vec<PublicKeyEntry>, FetchError> {
    let document: KeySetDocument =
        serde_json::from_slice(body).map_err(|e| FetchError::Document(e.to_string()))?;

    document
        .keys
        .into_iter()
        .map(|key| {
            let modulus = decode_component(&key.kid, "n", &key.n)?;
            let modulus = strip_leading_zeros(&modulus).to_vec();
            if modulus.is_empty() {
                return Err(encoding_error(&key.kid, "modulus is zero"));
            }

            let exponent_bytes = decode_component(&key.kid, "e", &key.e)?;
            let exponent = big_endian_to_u64(&key.kid, &exponent_bytes)?;

            Ok(PublicKeyEntry {
                key_id: key.kid,
                source: source.to_string(),
                modulus,
                exponent,
                fetched_at,
            })
        })
        .collect()
}

fn decode_component(kid: &str, name: &str, value: &str) -> Result<Vec<u8>, FetchError> {
    Base64UrlUnpadded::decode_vec(value.trim_end_matches('='))
        .map_err(|e| encoding_error(kid, &format!("invalid base64url in `{name}`: {e}")))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

fn big_endian_to_u64(kid: &str, bytes: &[u8]) -> Result<u64, FetchError> {
    let significant = strip_leading_zeros(bytes);
    if significant.is_empty() {
        return Err(encoding_error(kid, "exponent is zero"));
    }
    if significant.len() > 8 {
        return Err(encoding_error(kid, "exponent does not fit in 64 bits"));
    }
    Ok(significant
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

fn encoding_error(kid: &str, reason: &str) -> FetchError {
    FetchError::KeyEncoding {
        kid: kid.to_string(),
        reason: reason.to_string(),
    }
}
