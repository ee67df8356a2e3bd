// ABOUTME: Main library entry point for the Sommer conversational backend
// ABOUTME: Chat proxy, idle-session tracking and daily conversation summaries by mail
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

#![deny(unsafe_code)]

//! # Sommer Server
//!
//! Backend for a conversational nightlife assistant. Users chat through an
//! OpenAI-compatible model; when a session ends, either by explicit logout
//! or by inactivity, the user receives an email with the day's conversation.
//!
//! ## Architecture
//!
//! - **Activity**: in-memory registry of last-activity instants plus the
//!   periodic sweeper that evicts idle users
//! - **Session**: close handler that turns an eviction into a summary job
//! - **Summary**: renders a day's conversation turns as plain text
//! - **Notifications**: mail transport abstraction with an SMTP backend
//! - **Services / Routes**: account and chat operations over HTTP
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sommer_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Sommer configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Per-user activity registry and inactivity sweeper
pub mod activity;

/// Injectable time source
pub mod clock;

/// Environment configuration
pub mod config;

/// `SQLite` persistence for users and conversation turns
pub mod database;

/// Error types re-exported from `sommer-core`
pub mod errors;

/// Language model provider abstraction
pub mod llm;

/// Tracing subscriber setup
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// Summary mail dispatch
pub mod notifications;

/// Shared server context
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Router assembly and process lifecycle
pub mod server;

/// Account and chat services
pub mod services;

/// Session close handling and summary jobs
pub mod session;

/// Storage traits consumed by the summary pipeline
pub mod store;

/// Conversation summary rendering
pub mod summary;
