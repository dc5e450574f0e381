// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Provider signing keys and the shared key cache.
//!
//! The cache only stores and serves entries. Freshness is judged by the
//! caller (see [`PublicKeyEntry::is_fresh`]); the cache never expires
//! anything on its own.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use tokio::sync::RwLock;

/// Default key cache TTL (30 minutes).
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(30 * 60);

/// An RSA public key published by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyEntry {
    /// Key identifier (`kid`)
    pub key_id: String,
    /// Key-set URL the entry was fetched from
    pub source: String,
    /// Modulus as an unsigned big-endian integer
    pub modulus: Vec<u8>,
    /// Public exponent
    pub exponent: u64,
    pub fetched_at: Instant,
}

impl PublicKeyEntry {
    /// Age of the entry is within `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() <= ttl
    }

    /// Exponent as minimal big-endian bytes.
    pub fn exponent_bytes(&self) -> Vec<u8> {
        let bytes = self.exponent.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
        bytes[first..].to_vec()
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_rsa_raw_components(&self.modulus, &self.exponent_bytes())
    }
}

/// Signing keys keyed by `kid`.
///
/// Readers share the lock; [`replace`](Self::replace) is the only writer and
/// applies a whole fetched set under one write guard.
#[derive(Default)]
pub struct PublicKeyCache {
    entries: RwLock<HashMap<String, PublicKeyEntry>>,
}

impl PublicKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lookup(&self, key_id: &str) -> Option<PublicKeyEntry> {
        self.entries.read().await.get(key_id).cloned()
    }

    /// Overwrite the entry of every key id present in `entries`.
    ///
    /// Key ids absent from `entries` are left alone.
    pub async fn replace(&self, entries: Vec<PublicKeyEntry>) {
        let mut cache = self.entries.write().await;
        for entry in entries {
            cache.insert(entry.key_id.clone(), entry);
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Number of entries still within `ttl`.
    pub async fn fresh_count(&self, ttl: Duration) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.is_fresh(ttl))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kid: &str, modulus: &[u8]) -> PublicKeyEntry {
        PublicKeyEntry {
            key_id: kid.to_string(),
            source: "https://keys.example.com".to_string(),
            modulus: modulus.to_vec(),
            exponent: 65537,
            fetched_at: Instant::now(),
        }
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let cache = PublicKeyCache::new();
        assert!(cache.is_empty().await);
        assert!(cache.lookup("kid-1").await.is_none());
    }

    #[tokio::test]
    async fn replace_overwrites_present_kids_only() {
        let cache = PublicKeyCache::new();
        cache
            .replace(vec![entry("kid-1", &[1, 2]), entry("kid-2", &[3, 4])])
            .await;

        cache.replace(vec![entry("kid-1", &[9, 9])]).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.lookup("kid-1").await.unwrap().modulus, vec![9, 9]);
        assert_eq!(cache.lookup("kid-2").await.unwrap().modulus, vec![3, 4]);
    }

    #[tokio::test]
    async fn freshness_is_judged_by_caller_ttl() {
        let cache = PublicKeyCache::new();
        cache.replace(vec![entry("kid-1", &[1])]).await;

        std::thread::sleep(Duration::from_millis(5));

        let cached = cache.lookup("kid-1").await.unwrap();
        assert!(cached.is_fresh(Duration::from_secs(60)));
        assert!(!cached.is_fresh(Duration::from_millis(1)));
        assert_eq!(cache.fresh_count(Duration::from_millis(1)).await, 0);
    }

    #[test]
    fn exponent_bytes_are_minimal() {
        assert_eq!(entry("k", &[1]).exponent_bytes(), vec![0x01, 0x00, 0x01]);

        let mut small = entry("k", &[1]);
        small.exponent = 3;
        assert_eq!(small.exponent_bytes(), vec![0x03]);
    }
}
