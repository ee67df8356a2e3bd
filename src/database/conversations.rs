// ABOUTME: Conversation turn persistence for the chat proxy and summary emails
// ABOUTME: Stores prompt/response pairs and reads them back by recency or time window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use super::{format_timestamp, parse_timestamp, Database};
use crate::errors::{AppError, AppResult};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sommer_core::models::ConversationTurn;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    /// Create the conversations table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_conversations(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                prompt TEXT NOT NULL,
                response TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_user_created ON conversations(user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist one prompt/response turn
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn insert_turn(&self, turn: &ConversationTurn) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO conversations (id, user_id, prompt, response, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&turn.id)
        .bind(&turn.user_id)
        .bind(&turn.prompt)
        .bind(&turn.response)
        .bind(format_timestamp(turn.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save conversation turn: {e}")))?;

        Ok(())
    }

    /// Most recent turns for `user_id`, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn recent_turns(&self, user_id: &str, limit: u32) -> AppResult<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, prompt, response, created_at
            FROM conversations
            WHERE user_id = $1
            ORDER BY created_at DESC, rowid DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load conversation history: {e}")))?;

        rows.iter().map(row_to_turn).collect()
    }

    /// Turns for `user_id` with `start <= created_at <= end`, oldest first
    ///
    /// Turns sharing a timestamp come back in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn turns_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, prompt, response, created_at
            FROM conversations
            WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3
            ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(user_id)
        .bind(format_timestamp(start))
        .bind(format_timestamp(end))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load conversation window: {e}")))?;

        rows.iter().map(row_to_turn).collect()
    }
}

fn row_to_turn(row: &SqliteRow) -> AppResult<ConversationTurn> {
    let created_at: String = row.get("created_at");
    Ok(ConversationTurn {
        id: row.get("id"),
        user_id: row.get("user_id"),
        prompt: row.get("prompt"),
        response: row.get("response"),
        created_at: parse_timestamp(&created_at)?,
    })
}
