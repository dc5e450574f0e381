// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::chat::ConfigurableChatService;
use crate::storage::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub users: Arc<UserStore>,
    pub chat: Arc<dyn ConfigurableChatService>,
    /// Required `x-admin-key` value; `None` disables admin routes.
    pub admin_key: Option<String>,
}

impl AppState {
    pub fn new(
        verifier: TokenVerifier,
        users: UserStore,
        chat: Arc<dyn ConfigurableChatService>,
    ) -> Self {
        Self {
            verifier: Arc::new(verifier),
            users: Arc::new(users),
            chat,
            admin_key: None,
        }
    }

    pub fn with_admin_key(mut self, admin_key: Option<String>) -> Self {
        self.admin_key = admin_key;
        self
    }
}
