// ABOUTME: CORS middleware configuration for HTTP API endpoints
// ABOUTME: Lets the browser chat client call the API from its own origin
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the CORS layer from the configured origin list
///
/// `*` (or an empty or unparseable list) allows any origin; otherwise only
/// the listed origins are accepted.
///
/// ```bash
/// export CORS_ALLOWED_ORIGINS="https://chat.example.com,http://localhost:3000"
/// ```
#[must_use]
pub fn setup_cors(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
        .collect();

    let allow_origin = if origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}

