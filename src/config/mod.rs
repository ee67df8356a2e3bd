// ABOUTME: Configuration module for server, persistence, LLM, mail and session settings
// ABOUTME: Re-exports the environment-driven ServerConfig and its sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! Configuration for the Sommer server
//!
//! All settings come from environment variables; see [`ServerConfig::from_env`].

/// Environment and server configuration
pub mod environment;

pub use environment::{
    ActivityConfig, DatabaseConfig, DatabaseUrl, Environment, LlmConfig, LogoutSummaryPolicy,
    MailConfig, ServerConfig,
};
