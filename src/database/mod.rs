// ABOUTME: SQLite persistence for users and conversation turns
// ABOUTME: Connects the pool, runs idempotent migrations and implements the summary read traits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! # Database Management
//!
//! A single [`Database`] wraps the sqlx pool. User and conversation
//! operations live in their own submodules as `impl Database` blocks.

mod conversations;
mod users;

use crate::config::DatabaseUrl;
use crate::errors::{AppError, AppResult};
use crate::store::{ConversationStore, UserDirectory};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sommer_core::models::{ContactAddress, ConversationTurn};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

/// Database manager for users and conversation history
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to `database_url` and run migrations
    ///
    /// File databases are created if missing. `sqlite::memory:` pins a single
    /// connection that is never recycled, so every query sees the same data.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn new(database_url: &str) -> Result<Self> {
        let url = DatabaseUrl::parse_url(database_url);

        let pool = if url.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(&url.to_connection_string())
                .await?
        } else {
            if let DatabaseUrl::SQLite { path } = &url {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            SqlitePoolOptions::new()
                .connect(&format!("{}?mode=rwc", url.to_connection_string()))
                .await?
        };

        let db = Self { pool };
        db.migrate().await?;
        info!(database = %url, "Database ready");
        Ok(db)
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_conversations().await?;
        debug!("Database migrations applied");
        Ok(())
    }
}

/// Fixed-width text form so lexical order matches chronological order
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp '{raw}': {e}")))
}

#[async_trait]
impl ConversationStore for Database {
    async fn find(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ConversationTurn>> {
        self.turns_between(user_id, start, end).await
    }
}

#[async_trait]
impl UserDirectory for Database {
    async fn find_address(&self, user_id: &str) -> AppResult<Option<ContactAddress>> {
        let email: Option<String> =
            sqlx::query_scalar("SELECT email FROM users WHERE id = $1 OR email = $1 LIMIT 1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to resolve user address: {e}")))?;

        Ok(email.as_deref().and_then(ContactAddress::parse))
    }
}
