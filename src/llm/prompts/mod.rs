// ABOUTME: System prompt for the Sommer nightlife assistant, loaded at compile time
// ABOUTME: Prepended to every chat completion request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! # System Prompts

/// Persona and guardrails for the Sommer assistant
pub const SOMMER_SYSTEM_PROMPT: &str = include_str!("sommer_system.md");

/// System prompt used for every conversation
#[must_use]
pub const fn get_sommer_system_prompt() -> &'static str {
    SOMMER_SYSTEM_PROMPT
}
