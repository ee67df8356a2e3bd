// ABOUTME: User account model and contact address newtype
// ABOUTME: Users are resolved to contact addresses when summaries are mailed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of a registered account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular chat user
    #[default]
    User,
    /// Administrator
    Admin,
}

impl UserRole {
    /// Database representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse from the database representation, falling back to `User`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// Registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Email address, also used as the login name
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
    /// bcrypt password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account role
    pub role: UserRole,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh ID
    #[must_use]
    pub fn new(email: String, password_hash: String, display_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            password_hash,
            role: UserRole::User,
            created_at: Utc::now(),
        }
    }

    /// Address where notifications for this user are delivered
    #[must_use]
    pub fn contact_address(&self) -> Option<ContactAddress> {
        ContactAddress::parse(&self.email)
    }
}

/// Deliverable address for a user (an email address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactAddress(String);

impl ContactAddress {
    /// Accept a trimmed, non-empty address containing an `@`
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.contains('@') {
            return None;
        }
        Some(Self(trimmed.to_owned()))
    }

    /// Borrow the address text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
