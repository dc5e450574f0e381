// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenAI-compatible chat completions client.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ChatConfig, ChatService, ConfigurableChatService};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ATTEMPTS: usize = 3;
const NO_SUMMARY: &str = "No summary generated";
const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that provides concise summaries.";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a direct, confident advisor. Cut through excuses and \
give practical, high-impact advice on business, finance and personal development. Use bold \
analogies and counterintuitive insights, keep a conversational flow, and challenge the user to \
take ownership. Keep replies short: never more than two paragraphs, usually less.";

/// Replies used when the model cannot be reached.
const FALLBACK_REPLIES: &[&str] = &[
    "I like where you're going with this. Keep pushing forward!",
    "That's a great start. Let's refine it together.",
    "You're on the right track. Keep thinking big!",
    "I hear you! Every great journey starts with clarity. Let's find yours.",
    "This has potential. Let's keep building on it.",
    "You've got something here. Let's sharpen the vision.",
    "Success is in the details. Can we focus a bit more?",
    "Great energy! Let's channel that into something actionable.",
    "Big ideas like this need time. Let's shape it step by step.",
    "You're closer than you think. Let's refine it together.",
    "There's something powerful in what you're saying. Let's dig deeper.",
    "Every obstacle is an opportunity. Let's turn this into one.",
    "I like the ambition. Let's make it even clearer.",
    "You're showing real insight here. Let's elevate it.",
    "Momentum is key. Keep this up and you'll see results.",
    "This is the kind of thinking that leads to breakthroughs!",
    "You're on the verge of something big. Let's keep at it.",
    "Sometimes clarity comes with persistence. Stay the course.",
    "This is how successful people think. Let's keep brainstorming!",
    "I'm seeing the potential here. Let's turn it into action.",
];

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Request(String),

    #[error("chat endpoint returned HTTP {0}")]
    Status(u16),

    #[error("chat response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
struct Settings {
    config: ChatConfig,
    system_prompt: String,
}

pub struct OpenAiChatService {
    http: Client,
    base_url: String,
    api_key: String,
    settings: RwLock<Settings>,
}

impl OpenAiChatService {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChatError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            settings: RwLock::new(Settings {
                config: ChatConfig::default(),
                system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            }),
        })
    }

    pub fn system_prompt(&self) -> String {
        self.snapshot().system_prompt
    }

    fn snapshot(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<Option<String>, ChatError> {
        let response = self
            .http
            .post(format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChatError::Status(response.status().as_u16()));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl ChatService for OpenAiChatService {
    async fn summarize(&self, messages: &[String]) -> String {
        let settings = self.snapshot();
        let prompt = format!(
            "Please provide a concise summary of the following conversation:\n\n{}",
            messages.join("\n")
        );
        let request = CompletionRequest {
            model: &settings.config.model,
            messages: vec![
                CompletionMessage {
                    role: "system",
                    content: SUMMARY_SYSTEM_PROMPT,
                },
                CompletionMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: settings.config.max_tokens,
            temperature: None,
            presence_penalty: None,
            frequency_penalty: None,
        };

        match self.complete(&request).await {
            Ok(Some(summary)) => summary,
            Ok(None) => NO_SUMMARY.to_string(),
            Err(e) => {
                warn!(error = %e, "Summary request failed");
                NO_SUMMARY.to_string()
            }
        }
    }

    async fn next_message(&self, messages: &[String]) -> String {
        let settings = self.snapshot();
        let request = CompletionRequest {
            model: &settings.config.model,
            messages: conversation(&settings.system_prompt, messages),
            max_tokens: settings.config.max_tokens,
            temperature: Some(settings.config.temperature),
            presence_penalty: Some(settings.config.presence_penalty),
            frequency_penalty: Some(settings.config.frequency_penalty),
        };

        for attempt in 1..=MAX_ATTEMPTS {
            match self.complete(&request).await {
                Ok(Some(reply)) => return reply,
                Ok(None) => warn!(attempt, "Chat completion returned no choices"),
                Err(e) => warn!(attempt, error = %e, "Chat completion failed"),
            }
        }

        fallback_reply().to_string()
    }
}

impl ConfigurableChatService for OpenAiChatService {
    fn update_config(&self, config: ChatConfig) {
        let mut settings = self
            .settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        settings.config = config;
        info!(model = %settings.config.model, "Chat config updated");
    }

    fn update_prompt(&self, prompt: String) {
        let mut settings = self
            .settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        settings.system_prompt = prompt;
        info!("Chat system prompt updated");
    }

    fn config(&self) -> ChatConfig {
        self.snapshot().config
    }
}

/// System prompt followed by the history, alternating user / assistant.
fn conversation<'a>(system_prompt: &'a str, messages: &'a [String]) -> Vec<CompletionMessage<'a>> {
    std::iter::once(CompletionMessage {
        role: "system",
        content: system_prompt,
    })
    .chain(messages.iter().enumerate().map(|(i, content)| CompletionMessage {
        role: if i % 2 == 0 { "user" } else { "assistant" },
        content: content.as_str(),
    }))
    .collect()
}

fn fallback_reply() -> &'static str {
    let index = Utc::now().timestamp_subsec_nanos() as usize % FALLBACK_REPLIES.len();
    FALLBACK_REPLIES[index]
}
