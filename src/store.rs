// ABOUTME: Read-side interfaces the summary pipeline depends on
// ABOUTME: Conversation history lookup by window and user contact resolution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use crate::errors::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sommer_core::models::{ContactAddress, ConversationTurn};

/// Persisted conversation history
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Turns for `user_id` with `start <= created_at <= end`, oldest first
    ///
    /// # Errors
    ///
    /// Returns a database error when the history cannot be read
    async fn find(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ConversationTurn>>;
}

/// Resolves users to where their notifications go
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Contact address for `user_id`, or `None` if the user is unknown or has none
    ///
    /// # Errors
    ///
    /// Returns a database error when the lookup itself fails
    async fn find_address(&self, user_id: &str) -> AppResult<Option<ContactAddress>>;
}
