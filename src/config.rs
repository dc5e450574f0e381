// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATABASE_PATH` | redb file holding users | `./data/users.redb` |
//! | `APPLE_KEYS_URL` | Apple key-set endpoint | `https://appleid.apple.com/auth/keys` |
//! | `GOOGLE_KEYS_URL` | Google key-set endpoint | `https://www.googleapis.com/oauth2/v3/certs` |
//! | `APPLE_AUDIENCE` | Expected `aud` of Apple tokens | Not checked |
//! | `GOOGLE_AUDIENCE` | Expected `aud` of Google tokens | Not checked |
//! | `KEY_CACHE_TTL_SECS` | Age after which a cached key is refetched | `1800` |
//! | `KEY_FETCH_TIMEOUT_SECS` | Key-set request timeout | `10` |
//! | `QUOTA_RESET_WINDOW_SECS` | Usage window length | `60` |
//! | `FREE_DAILY_LIMIT` | Messages per window, free tier | `5` |
//! | `PREMIUM_DAILY_LIMIT` | Messages per window, premium tier | `10000` |
//! | `OPENAI_API_KEY` | Chat completions API key | Required |
//! | `OPENAI_BASE_URL` | Chat completions base URL | `https://api.openai.com/v1` |
//! | `ADMIN_API_KEY` | Key for admin routes (`x-admin-key`) | Admin routes disabled |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::auth::provider::{ProviderRegistry, ProviderSettings, APPLE_KEYS_URL, GOOGLE_KEYS_URL};
use crate::chat::openai::DEFAULT_BASE_URL;
use crate::policy::{EntitlementPolicy, FREE_DAILY_MESSAGE_LIMIT, PREMIUM_DAILY_MESSAGE_LIMIT};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_PATH: &str = "./data/users.redb";
const DEFAULT_KEY_CACHE_TTL_SECS: u64 = 1800;
const DEFAULT_KEY_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RESET_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub providers: ProviderRegistry,
    pub key_cache_ttl: Duration,
    pub key_fetch_timeout: Duration,
    pub policy: EntitlementPolicy,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub admin_api_key: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("PORT", var("PORT"), DEFAULT_PORT)?;
        let database_path = var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let apple_keys_url = url_or("APPLE_KEYS_URL", var("APPLE_KEYS_URL"), APPLE_KEYS_URL)?;
        let google_keys_url = url_or("GOOGLE_KEYS_URL", var("GOOGLE_KEYS_URL"), GOOGLE_KEYS_URL)?;
        let providers = ProviderRegistry {
            apple: Some(
                ProviderSettings::apple()
                    .with_key_set_url(apple_keys_url)
                    .with_audience(var("APPLE_AUDIENCE")),
            ),
            google: Some(
                ProviderSettings::google()
                    .with_key_set_url(google_keys_url)
                    .with_audience(var("GOOGLE_AUDIENCE")),
            ),
        };

        let key_cache_ttl = Duration::from_secs(parse_or(
            "KEY_CACHE_TTL_SECS",
            var("KEY_CACHE_TTL_SECS"),
            DEFAULT_KEY_CACHE_TTL_SECS,
        )?);
        let key_fetch_timeout = Duration::from_secs(parse_or(
            "KEY_FETCH_TIMEOUT_SECS",
            var("KEY_FETCH_TIMEOUT_SECS"),
            DEFAULT_KEY_FETCH_TIMEOUT_SECS,
        )?);

        let policy = EntitlementPolicy {
            reset_window: Duration::from_secs(parse_or(
                "QUOTA_RESET_WINDOW_SECS",
                var("QUOTA_RESET_WINDOW_SECS"),
                DEFAULT_RESET_WINDOW_SECS,
            )?),
            free_daily_limit: parse_or(
                "FREE_DAILY_LIMIT",
                var("FREE_DAILY_LIMIT"),
                FREE_DAILY_MESSAGE_LIMIT,
            )?,
            premium_daily_limit: parse_or(
                "PREMIUM_DAILY_LIMIT",
                var("PREMIUM_DAILY_LIMIT"),
                PREMIUM_DAILY_MESSAGE_LIMIT,
            )?,
        };

        let openai_api_key = var("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let openai_base_url = url_or("OPENAI_BASE_URL", var("OPENAI_BASE_URL"), DEFAULT_BASE_URL)?;

        let log_format = match var("LOG_FORMAT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid("LOG_FORMAT"))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host,
            port,
            database_path,
            providers,
            key_cache_ttl,
            key_fetch_timeout,
            policy,
            openai_api_key,
            openai_base_url,
            admin_api_key: var("ADMIN_API_KEY"),
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

fn url_or(name: &'static str, value: Option<String>, default: &str) -> Result<String, ConfigError> {
    let Some(value) = value else {
        return Ok(default.to_string());
    };
    let parsed = Url::parse(&value).map_err(|_| ConfigError::Invalid(name))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(name));
    }
    Ok(value)
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
