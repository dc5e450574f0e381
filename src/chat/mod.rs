// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Chat Boundary
//!
//! The conversational model behind the quota. Handlers only see the
//! [`ChatService`] capability; administrative routes additionally use
//! [`ConfigurableChatService`].

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use openai::OpenAiChatService;

/// Completion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatConfig {
    #[schema(example = "gpt-4o")]
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 1000,
            temperature: 0.5,
            presence_penalty: 0.5,
            frequency_penalty: 0.2,
        }
    }
}

/// Produces replies and summaries for a conversation.
///
/// Messages alternate user / assistant, starting with the user. Neither
/// operation fails: implementations degrade to a canned reply.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn summarize(&self, messages: &[String]) -> String;

    async fn next_message(&self, messages: &[String]) -> String;
}

/// A chat service whose parameters can be changed at runtime.
pub trait ConfigurableChatService: ChatService {
    fn update_config(&self, config: ChatConfig);

    fn update_prompt(&self, prompt: String);

    fn config(&self) -> ChatConfig;
}
