// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user ledger backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized User (JSON bytes)
//! - `username_index`: username → user id
//!
//! Every mutation runs inside one redb write transaction. redb admits a
//! single writer at a time, so find-or-insert and check-and-increment are
//! atomic with respect to each other and to themselves.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
};

use crate::domain::{AuthProvider, Entitlements, EntitlementsUpdate, User};
use crate::policy::EntitlementPolicy;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user id → serialized User (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: username → user id.
const USERNAME_INDEX: TableDefinition<&str, &str> = TableDefinition::new("username_index");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user not found")]
    UserNotFound,

    #[error("daily message limit reached")]
    DailyLimitReached,

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Row Helpers
// =============================================================================

type UserTable<'txn> = Table<'txn, &'static str, &'static [u8]>;

fn read_user(table: &UserTable<'_>, id: &str) -> StoreResult<Option<User>> {
    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn write_user(table: &mut UserTable<'_>, user: &User) -> StoreResult<()> {
    let json = serde_json::to_vec(user)?;
    table.insert(user.id.as_str(), json.as_slice())?;
    Ok(())
}

// =============================================================================
// UserStore
// =============================================================================

/// Durable user and entitlement ledger.
pub struct UserStore {
    db: Database,
    policy: EntitlementPolicy,
}

impl UserStore {
    /// Open (or create) the ledger at the given path.
    pub fn open(path: &Path, policy: EntitlementPolicy) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAME_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db, policy })
    }

    pub fn policy(&self) -> &EntitlementPolicy {
        &self.policy
    }

    // =========================================================================
    // Lookup / creation
    // =========================================================================

    /// Find a user by username, creating one with default entitlements if
    /// none exists. Returns the user and whether it was created.
    ///
    /// An existing user whose window has elapsed is returned with the reset
    /// applied and persisted.
    pub fn get_or_create(
        &self,
        provider: AuthProvider,
        username: &str,
        email: &str,
    ) -> StoreResult<(User, bool)> {
        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let (user, created) = {
            let mut users = write_txn.open_table(USERS)?;
            let mut index = write_txn.open_table(USERNAME_INDEX)?;

            let existing_id = index.get(username)?.map(|v| v.value().to_string());

            match existing_id {
                Some(id) => {
                    let mut user = read_user(&users, &id)?.ok_or(StoreError::UserNotFound)?;
                    if self.policy.roll_window(&mut user.entitlements, now) {
                        write_user(&mut users, &user)?;
                    }
                    (user, false)
                }
                None => {
                    let user = User {
                        id: uuid::Uuid::new_v4().to_string(),
                        auth_provider: provider,
                        username: username.to_string(),
                        email: email.to_string(),
                        created_at: now,
                        last_active: now,
                        entitlements: self.policy.default_entitlements(now),
                    };
                    write_user(&mut users, &user)?;
                    index.insert(username, user.id.as_str())?;
                    (user, true)
                }
            }
        };
        write_txn.commit()?;

        if created {
            tracing::info!(
                user_id = %user.id,
                provider = %provider,
                "Created user"
            );
        }
        Ok((user, created))
    }

    /// Look up a user by surrogate id.
    pub fn get_user(&self, id: &str) -> StoreResult<User> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::UserNotFound),
        }
    }

    /// Look up a user by username.
    pub fn get_user_by_username(&self, username: &str) -> StoreResult<User> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USERNAME_INDEX)?;
        let id = index
            .get(username)?
            .map(|v| v.value().to_string())
            .ok_or(StoreError::UserNotFound)?;

        let table = read_txn.open_table(USERS)?;
        match table.get(id.as_str())? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::UserNotFound),
        }
    }

    /// Number of stored users.
    pub fn user_count(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        Ok(table.len()?)
    }

    // =========================================================================
    // Quota
    // =========================================================================

    /// Consume one message from the user's allowance.
    pub fn check_and_increment(&self, user_id: &str) -> StoreResult<Entitlements> {
        self.check_and_increment_at(user_id, Utc::now())
    }

    /// [`check_and_increment`](Self::check_and_increment) with an explicit clock.
    ///
    /// A window reset is committed even when the limit check then fails.
    /// The increment itself is all-or-nothing.
    pub fn check_and_increment_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Entitlements> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(USERS)?;
            let mut user = match read_user(&table, user_id)? {
                Some(user) => user,
                None => {
                    drop(table);
                    write_txn.abort()?;
                    return Err(StoreError::UserNotFound);
                }
            };

            let reset = self.policy.roll_window(&mut user.entitlements, now);
            let entitlements = &mut user.entitlements;

            if entitlements.messages_used >= entitlements.daily_message_limit {
                if reset {
                    write_user(&mut table, &user)?;
                }
                Err(reset)
            } else {
                entitlements.messages_used += 1;
                user.last_active = now;
                write_user(&mut table, &user)?;
                Ok(user.entitlements)
            }
        };

        match outcome {
            Ok(entitlements) => {
                write_txn.commit()?;
                tracing::debug!(
                    user_id,
                    used = entitlements.messages_used,
                    limit = entitlements.daily_message_limit,
                    remaining = entitlements.remaining(),
                    "Message counted"
                );
                Ok(entitlements)
            }
            Err(reset) => {
                if reset {
                    write_txn.commit()?;
                } else {
                    write_txn.abort()?;
                }
                tracing::debug!(user_id, "Daily message limit reached");
                Err(StoreError::DailyLimitReached)
            }
        }
    }

    // =========================================================================
    // Administrative updates
    // =========================================================================

    /// Apply a partial entitlement update to an existing user.
    pub fn set_entitlements(&self, username: &str, update: EntitlementsUpdate) -> StoreResult<User> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let index = write_txn.open_table(USERNAME_INDEX)?;
            let id = index.get(username)?.map(|v| v.value().to_string());
            drop(index);

            let mut table = write_txn.open_table(USERS)?;
            let existing = match &id {
                Some(id) => read_user(&table, id)?,
                None => None,
            };
            let Some(mut user) = existing else {
                drop(table);
                write_txn.abort()?;
                return Err(StoreError::UserNotFound);
            };

            update.apply_to(&mut user.entitlements);
            write_user(&mut table, &user)?;
            user
        };
        write_txn.commit()?;

        tracing::info!(
            user_id = %user.id,
            limit = user.entitlements.daily_message_limit,
            subscription = ?user.entitlements.subscription.kind,
            "Entitlements updated"
        );
        Ok(user)
    }
}

// =============================================================================
// Tests
// =============================================================================
