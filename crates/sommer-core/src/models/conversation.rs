// ABOUTME: Conversation turn model: one prompt and the assistant's response
// ABOUTME: Persisted by the chat proxy and read back when building summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single prompt/response exchange between a user and the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Unique turn ID
    pub id: String,
    /// Owner of the turn
    pub user_id: String,
    /// What the user asked
    pub prompt: String,
    /// What the assistant answered
    pub response: String,
    /// When the turn was persisted
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a new turn stamped with the given time
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        prompt: impl Into<String>,
        response: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            prompt: prompt.into(),
            response: response.into(),
            created_at,
        }
    }
}
