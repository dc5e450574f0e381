// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chat Gateway - Authentication & Entitlement Service
//!
//! Signs users in with Apple / Google identity tokens (or as anonymous
//! guests) and meters their use of a chat completion model with a durable
//! per-user message quota.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Identity token verification against rotating provider keys
//! - `chat` - Chat completion boundary
//! - `policy` - Quota window, limits and subscription tiers
//! - `storage` - User ledger (redb)

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod policy;
pub mod state;
pub mod storage;
