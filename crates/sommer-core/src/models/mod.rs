// ABOUTME: Shared domain models for users and conversation history
// ABOUTME: Read by the persistence layer, the HTTP layer and the summary pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! Core data models

mod conversation;
mod user;

pub use conversation::ConversationTurn;
pub use user::{ContactAddress, User, UserRole};
