// ABOUTME: Explicit logout endpoint that closes the session and mails today's summary
// ABOUTME: Relays whether the summary was sent, skipped or failed to the caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::session::{CloseReason, JobOutcome, SkipReason};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Logout request
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    /// User ending the session
    #[serde(default)]
    pub user_id: String,
}

/// Logout result
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// True unless the summary job failed
    pub success: bool,
    /// `sent`, `skipped` or `failed`
    pub outcome: String,
    /// Human-readable detail
    pub message: String,
}

impl From<&JobOutcome> for LogoutResponse {
    fn from(outcome: &JobOutcome) -> Self {
        let message = match outcome {
            JobOutcome::Sent => "Session closed, conversation summary sent".to_owned(),
            JobOutcome::Skipped(SkipReason::NoContactAddress) => {
                "Session closed, no contact address on file for a summary".to_owned()
            }
            JobOutcome::Skipped(SkipReason::NoTrackedActivity) => {
                "Session closed, no active session to summarize".to_owned()
            }
            JobOutcome::Failed(failure) => {
                format!("Session closed, but the summary could not be sent: {failure}")
            }
        };

        Self {
            success: !matches!(outcome, JobOutcome::Failed(_)),
            outcome: outcome.as_str().to_owned(),
            message,
        }
    }
}

/// Session lifecycle routes
pub struct SessionRoutes;

impl SessionRoutes {
    /// Create all session routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat/logout", post(Self::logout))
            .with_state(resources)
    }

    async fn logout(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LogoutRequest>,
    ) -> Result<Response, AppError> {
        let outcome = resources
            .session
            .close(&request.user_id, CloseReason::ExplicitLogout)
            .await?;

        let status = if matches!(outcome, JobOutcome::Failed(_)) {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::OK
        };
        Ok((status, Json(LogoutResponse::from(&outcome))).into_response())
    }
}
