// ABOUTME: Route module organization for the Sommer HTTP API
// ABOUTME: Groups handlers by domain: accounts, chat, session lifecycle and health
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! HTTP routes
//!
//! Each domain module holds route definitions and thin handlers that
//! delegate to the service layer or the session close handler.

/// Registration, login and user listing
pub mod auth;
/// Prompt proxy and history
pub mod chat;
/// Service status endpoints
pub mod health;
/// Explicit logout and summary delivery
pub mod session;

pub use auth::AuthRoutes;
pub use chat::ChatRoutes;
pub use health::HealthRoutes;
pub use session::{LogoutRequest, LogoutResponse, SessionRoutes};
