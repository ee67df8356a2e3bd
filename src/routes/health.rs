// ABOUTME: Service status endpoints for monitoring and the web client
// ABOUTME: Reports version, tracked sessions, sweeper state and LLM reachability
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use crate::resources::ServerResources;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/", get(Self::root))
            .route("/health", get(Self::health))
            .with_state(resources)
    }

    async fn root() -> Json<Value> {
        Json(json!({
            "service": crate::logging::SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "status": "running"
        }))
    }

    async fn health(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        let llm = match &resources.llm {
            Some(provider) => {
                let reachable = match provider.health_check().await {
                    Ok(reachable) => reachable,
                    Err(e) => {
                        warn!("{} health check failed: {e}", provider.display_name());
                        false
                    }
                };
                json!({
                    "configured": true,
                    "provider": provider.name(),
                    "reachable": reachable
                })
            }
            None => json!({ "configured": false, "reachable": false }),
        };

        Json(json!({
            "status": "healthy",
            "timestamp": resources.clock.now().to_rfc3339(),
            "sessions": {
                "active": resources.registry.len(),
                "sweeper_running": resources.sweeper.is_running()
            },
            "llm": llm
        }))
    }
}
