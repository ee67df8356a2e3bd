// ABOUTME: Chat route handlers for prompting the assistant and reading history
// ABOUTME: Every prompt counts as session activity for the idle sweeper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! Chat routes
//!
//! `POST /api/chat` proxies one prompt to the language model and stores the
//! turn; `GET /api/chat/history/:user_id` returns the latest turns.

use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Prompt submission
#[derive(Debug, Deserialize)]
pub struct ChatPromptRequest {
    /// Sender
    #[serde(default)]
    pub user_id: String,
    /// What the user asked
    #[serde(default)]
    pub prompt: String,
}

/// Assistant answer
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatPromptResponse {
    /// Generated text
    pub response: String,
}

/// One turn in the history listing
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Turn ID
    pub id: String,
    /// What the user asked
    pub prompt: String,
    /// What the assistant answered
    pub response: String,
    /// When the turn was stored
    pub created_at: DateTime<Utc>,
}

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat", post(Self::send_prompt))
            .route("/api/chat/history/:user_id", get(Self::history))
            .with_state(resources)
    }

    async fn send_prompt(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ChatPromptRequest>,
    ) -> Result<Response, AppError> {
        let response = resources
            .chat
            .send(&request.user_id, &request.prompt)
            .await?;
        Ok((StatusCode::OK, Json(ChatPromptResponse { response })).into_response())
    }

    async fn history(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<String>,
    ) -> Result<Response, AppError> {
        let entries: Vec<HistoryEntry> = resources
            .chat
            .history(&user_id)
            .await?
            .into_iter()
            .map(|turn| HistoryEntry {
                id: turn.id,
                prompt: turn.prompt,
                response: turn.response,
                created_at: turn.created_at,
            })
            .collect();
        Ok((StatusCode::OK, Json(entries)).into_response())
    }
}
