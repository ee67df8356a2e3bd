// ABOUTME: Re-exports the unified error types from sommer-core
// ABOUTME: Keeps `crate::errors::*` paths stable for the server crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! Error types live in `sommer-core`; this module re-exports them.

pub use sommer_core::errors::*;
