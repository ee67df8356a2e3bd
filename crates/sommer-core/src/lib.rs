// ABOUTME: Core types for the Sommer conversational backend
// ABOUTME: Foundation crate with error handling and shared domain models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

#![deny(unsafe_code)]

//! # Sommer Core
//!
//! Foundation crate providing shared types for the Sommer conversational
//! backend. It changes infrequently so the server crate gets incremental
//! compilation benefits.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **models**: Users, conversation turns and contact addresses

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Core data models (users, conversation turns, contact addresses)
pub mod models;
