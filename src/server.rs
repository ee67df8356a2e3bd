// ABOUTME: HTTP server assembly and process lifecycle
// ABOUTME: Merges route groups, starts the sweeper, serves until a shutdown signal, then drains
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use crate::middleware::setup_cors;
use crate::resources::ServerResources;
use crate::routes::{AuthRoutes, ChatRoutes, HealthRoutes, SessionRoutes};
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the full application router
#[must_use]
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config.cors_origins);

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(ChatRoutes::routes(Arc::clone(&resources)))
        .merge(SessionRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve HTTP until SIGINT or SIGTERM
///
/// The inactivity sweeper runs for the lifetime of the listener and is
/// stopped after in-flight requests have completed.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let config = Arc::clone(&resources.config);
    let bind_address = format!("{}:{}", config.host, config.http_port);

    resources.sweeper.start();

    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            resources.sweeper.stop().await;
            return Err(e).with_context(|| format!("Failed to bind {bind_address}"));
        }
    };

    info!("HTTP server listening on http://{bind_address}");
    display_available_endpoints(&bind_address);

    let router = build_router(Arc::clone(&resources));
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Server shutting down gracefully...");
    resources.sweeper.stop().await;
    info!("Shutdown complete");

    served.context("HTTP server error")
}

fn display_available_endpoints(bind_address: &str) {
    info!("=== Available API Endpoints ===");
    info!("   Status:         GET  http://{bind_address}/");
    info!("   Health:         GET  http://{bind_address}/health");
    info!("   Register:       POST http://{bind_address}/api/chat/users");
    info!("   List Users:     GET  http://{bind_address}/api/chat/users");
    info!("   Login:          POST http://{bind_address}/api/chat/login");
    info!("   Chat:           POST http://{bind_address}/api/chat");
    info!("   History:        GET  http://{bind_address}/api/chat/history/{{user_id}}");
    info!("   Logout:         POST http://{bind_address}/api/chat/logout");
    info!("=== End of Endpoint List ===");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
