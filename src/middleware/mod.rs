// ABOUTME: HTTP middleware configuration for the chat API
// ABOUTME: CORS setup shared by the server router and integration tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

/// Cross-origin configuration
pub mod cors;

pub use cors::setup_cors;
