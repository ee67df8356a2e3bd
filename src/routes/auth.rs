// ABOUTME: Account route handlers for registration, login and user listing
// ABOUTME: Thin wrappers over AuthService; login also starts session tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::{LoginRequest, RegisterRequest};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

/// Account routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all account routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/chat/users",
                post(Self::register).get(Self::list_users),
            )
            .route("/api/chat/login", post(Self::login))
            .with_state(resources)
    }

    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let response = resources.auth.register(request).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let response = resources.auth.login(request).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    async fn list_users(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let users = resources.auth.list_users().await?;
        Ok((StatusCode::OK, Json(users)).into_response())
    }
}
