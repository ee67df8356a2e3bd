// ABOUTME: Chat proxy: records activity, builds context from recent turns and calls the LLM
// ABOUTME: Persists every completed turn so it shows up in history and daily summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use crate::activity::{validate_user_id, ActivityRegistry};
use crate::clock::Clock;
use crate::config::LlmConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::llm::{get_sommer_system_prompt, ChatMessage, ChatRequest, LlmProvider};
use sommer_core::models::ConversationTurn;
use std::sync::Arc;
use tracing::{debug, info};

/// Turns returned by the history endpoint
pub const HISTORY_PAGE_SIZE: u32 = 10;

/// Completion parameters
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion length cap
    pub max_tokens: u32,
    /// Previous turns sent as context
    pub history_turns: u32,
}

impl From<&LlmConfig> for ChatSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            history_turns: config.history_turns,
        }
    }
}

/// Proxies prompts to the language model
#[derive(Clone)]
pub struct ChatService {
    database: Arc<Database>,
    llm: Option<Arc<dyn LlmProvider>>,
    registry: Arc<ActivityRegistry>,
    clock: Arc<dyn Clock>,
    settings: ChatSettings,
}

impl ChatService {
    /// Create the service; `llm = None` makes every prompt fail with a config error
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        llm: Option<Arc<dyn LlmProvider>>,
        registry: Arc<ActivityRegistry>,
        clock: Arc<dyn Clock>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            database,
            llm,
            registry,
            clock,
            settings,
        }
    }

    /// Answer `prompt` for `user_id` and store the turn
    ///
    /// Activity is recorded before any I/O, so a sweep that runs while the
    /// model is answering still sees the user as active.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty input, a configuration error
    /// when no model is configured, or the provider/database error
    pub async fn send(&self, user_id: &str, prompt: &str) -> AppResult<String> {
        let user_id = validate_user_id(user_id)?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::missing_field("prompt"));
        }

        self.registry.record_activity(user_id, self.clock.now());

        let llm = self.llm.as_ref().ok_or_else(|| {
            AppError::new(
                ErrorCode::ConfigMissing,
                "No language model is configured (set OPENAI_API_KEY)",
            )
        })?;

        let mut history = self
            .database
            .recent_turns(user_id, self.settings.history_turns)
            .await?;
        history.reverse();
        debug!(user.id = %user_id, context.turns = history.len(), "Building chat context");

        let request = ChatRequest::new(build_messages(&history, prompt))
            .with_model(self.settings.model.clone())
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        let response = llm.complete(&request).await?;

        let turn = ConversationTurn::new(user_id, prompt, &response.content, self.clock.now());
        self.database.insert_turn(&turn).await?;

        info!(
            user.id = %user_id,
            llm.model = %response.model,
            llm.total_tokens = response.usage.map(|u| u.total_tokens),
            "Chat turn completed"
        );
        Ok(response.content)
    }

    /// Latest turns for `user_id`, newest first
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty user id or a database error
    pub async fn history(&self, user_id: &str) -> AppResult<Vec<ConversationTurn>> {
        let user_id = validate_user_id(user_id)?;
        self.database.recent_turns(user_id, HISTORY_PAGE_SIZE).await
    }
}

/// System prompt, then each past turn as a user/assistant pair, then the new prompt
fn build_messages(history: &[ConversationTurn], prompt: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(get_sommer_system_prompt()));
    for turn in history {
        messages.push(ChatMessage::user(turn.prompt.as_str()));
        messages.push(ChatMessage::assistant(turn.response.as_str()));
    }
    messages.push(ChatMessage::user(prompt));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;
    use chrono::Utc;

    #[test]
    fn test_build_messages_orders_context() {
        let now = Utc::now();
        let history = vec![
            ConversationTurn::new("ana", "first", "uno", now),
            ConversationTurn::new("ana", "second", "dos", now),
        ];

        let messages = build_messages(&history, "third");
        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
            ]
        );
        assert_eq!(messages[1].content, "first");
        assert_eq!(messages[4].content, "dos");
        assert_eq!(messages[5].content, "third");
    }
}
