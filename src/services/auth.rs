// ABOUTME: Account registration, password login and user listing
// ABOUTME: bcrypt runs on the blocking pool; a successful login starts session tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use crate::activity::ActivityRegistry;
use crate::clock::Clock;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use serde::{Deserialize, Serialize};
use sommer_core::models::{User, UserRole};
use std::sync::Arc;
use tracing::info;

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Login email, also the summary recipient
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Optional role, defaults to `user`
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// User registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// New user ID
    pub user_id: String,
    /// Status message
    pub message: String,
}

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
    /// Account role
    pub role: UserRole,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
        }
    }
}

/// User login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Always true on success
    pub success: bool,
    /// Status message
    pub message: String,
    /// The authenticated user
    pub user: UserInfo,
}

/// Account operations
#[derive(Clone)]
pub struct AuthService {
    database: Arc<Database>,
    registry: Arc<ActivityRegistry>,
    clock: Arc<dyn Clock>,
    hash_cost: u32,
}

impl AuthService {
    /// Create the service with the default bcrypt cost
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        registry: Arc<ActivityRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            database,
            registry,
            clock,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost factor
    #[must_use]
    pub const fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields, a conflict when the email
    /// is taken, or an internal error when hashing fails
    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        let email = request.email.trim().to_owned();
        if email.is_empty() {
            return Err(AppError::missing_field("email"));
        }
        if !email.contains('@') {
            return Err(AppError::invalid_input("Invalid email format"));
        }
        if request.password.is_empty() {
            return Err(AppError::missing_field("password"));
        }

        let password = request.password;
        let cost = self.hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password hashing error: {e}")))?;

        let display_name = request
            .display_name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        let mut user = User::new(email, password_hash, display_name);
        user.role = request.role.unwrap_or_default();

        let user_id = self.database.create_user(&user).await?;
        info!(user.id = %user_id, "User registered");

        Ok(RegisterResponse {
            user_id: user_id.to_string(),
            message: "User registered successfully".to_owned(),
        })
    }

    /// Check credentials and start tracking the session
    ///
    /// # Errors
    ///
    /// Returns an authentication error for unknown emails or wrong passwords
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let email = request.email.trim();
        if email.is_empty() || request.password.is_empty() {
            return Err(AppError::invalid_input("Email and password are required"));
        }

        let user = self
            .database
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        let password = request.password;
        let password_hash = user.password_hash.clone();
        let is_valid =
            tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
                .await
                .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Password verification error: {e}")))?;

        let user_id = user.id.to_string();
        AppLogger::log_auth_event(&user_id, "login", is_valid, None);
        if !is_valid {
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        self.registry.record_activity(&user_id, self.clock.now());

        Ok(LoginResponse {
            success: true,
            message: "Login successful".to_owned(),
            user: UserInfo::from(&user),
        })
    }

    /// All registered users without credentials
    ///
    /// # Errors
    ///
    /// Returns a database error if the listing fails
    pub async fn list_users(&self) -> AppResult<Vec<UserInfo>> {
        Ok(self
            .database
            .list_users()
            .await?
            .iter()
            .map(UserInfo::from)
            .collect())
    }
}
