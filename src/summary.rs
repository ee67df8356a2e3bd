// ABOUTME: Renders a user's conversation turns within a time window as a plain-text digest
// ABOUTME: Pure rendering plus a thin builder that fetches turns from the conversation store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use crate::errors::AppResult;
use crate::store::ConversationStore;
use chrono::{DateTime, Utc};
use sommer_core::models::ConversationTurn;
use std::sync::Arc;

/// Body used when the window holds no turns
pub const NO_CONVERSATION_PLACEHOLDER: &str = "no conversation recorded for this period";

const PROMPT_MARKER: &str = "🗨️";
const RESPONSE_MARKER: &str = "💬";

/// Render turns inside `[start, end]` oldest first, one two-line block per turn
///
/// Turns outside the window are ignored. Equal timestamps keep their input
/// order, which is the store's insertion order.
#[must_use]
pub fn render_summary(
    turns: &[ConversationTurn],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    let mut in_window: Vec<&ConversationTurn> = turns
        .iter()
        .filter(|turn| turn.created_at >= start && turn.created_at <= end)
        .collect();

    if in_window.is_empty() {
        return NO_CONVERSATION_PLACEHOLDER.to_owned();
    }

    // stable sort
    in_window.sort_by_key(|turn| turn.created_at);

    in_window
        .iter()
        .map(|turn| {
            format!(
                "{PROMPT_MARKER} {}\n{RESPONSE_MARKER} {}",
                turn.prompt, turn.response
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds summaries from the conversation store
#[derive(Clone)]
pub struct SummaryBuilder {
    store: Arc<dyn ConversationStore>,
}

impl SummaryBuilder {
    /// Create a builder reading from `store`
    #[must_use]
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Fetch and render the turns of `user_id` in `[start, end]`
    ///
    /// # Errors
    ///
    /// Returns the store error when the history cannot be read
    pub async fn build(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<String> {
        let turns = self.store.find(user_id, start, end).await?;
        Ok(render_summary(&turns, start, end))
    }
}
