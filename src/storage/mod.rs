// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Durable state of the gateway: users and their entitlements, kept in a
//! single redb file.
//!
//! ## Storage Layout
//!
//! ```text
//! users.redb
//!   users           # user id -> User (JSON)
//!   username_index  # username -> user id
//! ```
//!
//! All calls are synchronous. Async callers run them on the blocking pool.

pub mod users;

pub use users::{StoreError, StoreResult, UserStore};
