// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Account management and the chat proxy, both of which feed session activity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! Domain service layer
//!
//! Route handlers stay thin and delegate here. Both services touch the
//! activity registry so that the idle sweeper sees authenticated traffic.

/// Registration, login and user listing
pub mod auth;

/// Prompt proxying and conversation history
pub mod chat;

pub use auth::{AuthService, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserInfo};
pub use chat::{ChatService, ChatSettings};
