// ABOUTME: Environment configuration for the chat server, LLM provider, mail relay and sweeper
// ABOUTME: Parses environment variables with typed defaults and warn-and-fallback on bad values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! Environment-based configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 5000;
/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default database location
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/sommer.db";
/// Default OpenAI-compatible endpoint
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
/// Default completion model
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
/// Default sampling temperature
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
/// Default completion length cap
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 500;
/// Default number of previous turns sent as context
pub const DEFAULT_LLM_HISTORY_TURNS: u32 = 10;
/// Default implicit-TLS SMTP port
pub const DEFAULT_MAIL_PORT: u16 = 465;
/// Default sender display name
pub const DEFAULT_MAIL_FROM_NAME: &str = "Sommer Assistant";
/// Default summary subject line
pub const DEFAULT_MAIL_SUBJECT: &str = "Your conversation summary with Sommer";
/// Default sweep period in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
/// Default idle threshold in seconds
pub const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 60;
/// Upper bound for both the sweep interval and the idle threshold (one day)
pub const MAX_ACTIVITY_SECS: u64 = 86_400;

/// Environment type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// SQLite database file
    SQLite {
        /// File path
        path: PathBuf,
    },
    /// In-memory SQLite (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse `sqlite:<path>`, `sqlite::memory:` or a bare file path
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let path = s
            .strip_prefix("sqlite://")
            .or_else(|| s.strip_prefix("sqlite:"))
            .unwrap_or(s);
        if path == ":memory:" {
            Self::Memory
        } else {
            Self::SQLite {
                path: PathBuf::from(path),
            }
        }
    }

    /// Connection string understood by sqlx
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::parse_url(DEFAULT_DATABASE_URL)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Whether logout sends a summary for users without a tracked session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogoutSummaryPolicy {
    /// Always look the user up and attempt a summary
    #[default]
    Always,
    /// Skip the summary when the registry had no record for the user
    TrackedOnly,
}

impl LogoutSummaryPolicy {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "tracked_only" | "tracked-only" | "tracked" => Self::TrackedOnly,
            _ => Self::Always,
        }
    }
}

impl fmt::Display for LogoutSummaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::TrackedOnly => write!(f, "tracked_only"),
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// API key; chat is unavailable without one
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion length cap
    pub max_tokens: u32,
    /// Previous turns sent as context
    pub history_turns: u32,
}

/// Mail relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host
    pub host: Option<String>,
    /// SMTP relay port
    pub port: u16,
    /// Implicit TLS when true, STARTTLS otherwise
    pub secure: bool,
    /// Login and sender address
    pub username: Option<String>,
    /// Login password
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Sender display name
    pub from_name: String,
    /// Summary subject line
    pub subject: String,
}

impl MailConfig {
    /// Whether enough is set to attempt a relay connection
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty())
            && self.username.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

/// Idle-session tracking settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Seconds between sweeps
    pub sweep_interval_secs: u64,
    /// Seconds of inactivity before a session is closed
    pub idle_threshold_secs: u64,
    /// Logout behavior for untracked users
    pub logout_policy: LogoutSummaryPolicy,
}

impl ActivityConfig {
    /// Sweep period
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Idle threshold
    #[must_use]
    pub fn idle_threshold(&self) -> chrono::Duration {
        i64::try_from(self.idle_threshold_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Bind address
    pub host: String,
    /// Deployment environment
    pub environment: Environment,
    /// Allowed CORS origins (`*` for any)
    pub cors_origins: Vec<String>,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Language model configuration
    pub llm: LlmConfig,
    /// Mail relay configuration
    pub mail: MailConfig,
    /// Idle-session tracking configuration
    pub activity: ActivityConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", var("HTTP_PORT"), DEFAULT_HTTP_PORT),
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            environment: var("ENVIRONMENT")
                .map(|v| Environment::from_str_or_default(&v))
                .unwrap_or_default(),
            cors_origins: parse_origins(
                &var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_owned()),
            ),
            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(
                    &var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
                ),
            },
            llm: LlmConfig {
                base_url: var("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_owned()),
                api_key: var("OPENAI_API_KEY"),
                model: var("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_owned()),
                temperature: parse_or_default(
                    "LLM_TEMPERATURE",
                    var("LLM_TEMPERATURE"),
                    DEFAULT_LLM_TEMPERATURE,
                ),
                max_tokens: parse_or_default(
                    "LLM_MAX_TOKENS",
                    var("LLM_MAX_TOKENS"),
                    DEFAULT_LLM_MAX_TOKENS,
                ),
                history_turns: parse_or_default(
                    "LLM_HISTORY_TURNS",
                    var("LLM_HISTORY_TURNS"),
                    DEFAULT_LLM_HISTORY_TURNS,
                ),
            },
            mail: MailConfig {
                host: var("MAIL_HOST"),
                port: parse_or_default("MAIL_PORT", var("MAIL_PORT"), DEFAULT_MAIL_PORT),
                secure: parse_or_default("MAIL_SECURE", var("MAIL_SECURE"), true),
                username: var("MAIL_USER"),
                password: var("MAIL_PASS"),
                from_name: var("MAIL_FROM_NAME")
                    .unwrap_or_else(|| DEFAULT_MAIL_FROM_NAME.to_owned()),
                subject: var("MAIL_SUBJECT").unwrap_or_else(|| DEFAULT_MAIL_SUBJECT.to_owned()),
            },
            activity: ActivityConfig {
                sweep_interval_secs: parse_or_default(
                    "ACTIVITY_SWEEP_INTERVAL_SECS",
                    var("ACTIVITY_SWEEP_INTERVAL_SECS"),
                    DEFAULT_SWEEP_INTERVAL_SECS,
                ),
                idle_threshold_secs: parse_or_default(
                    "ACTIVITY_IDLE_THRESHOLD_SECS",
                    var("ACTIVITY_IDLE_THRESHOLD_SECS"),
                    DEFAULT_IDLE_THRESHOLD_SECS,
                ),
                logout_policy: var("LOGOUT_SUMMARY_POLICY")
                    .map(|v| LogoutSummaryPolicy::from_str_or_default(&v))
                    .unwrap_or_default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error when the sweep interval is zero, or when either
    /// activity duration exceeds [`MAX_ACTIVITY_SECS`]
    pub fn validate(&self) -> Result<()> {
        if self.activity.sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "ACTIVITY_SWEEP_INTERVAL_SECS must be greater than zero"
            ));
        }

        for (name, value) in [
            ("ACTIVITY_SWEEP_INTERVAL_SECS", self.activity.sweep_interval_secs),
            ("ACTIVITY_IDLE_THRESHOLD_SECS", self.activity.idle_threshold_secs),
        ] {
            if value > MAX_ACTIVITY_SECS {
                return Err(anyhow::anyhow!(
                    "{name} must be at most {MAX_ACTIVITY_SECS} seconds, got {value}"
                ));
            }
        }

        if self.llm.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; chat requests will fail until it is configured");
        }

        if !self.mail.is_configured() {
            warn!("MAIL_HOST or MAIL_USER is not set; conversation summaries will not be delivered");
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Sommer Server Configuration:\n\
             - Environment: {}\n\
             - HTTP: {}:{}\n\
             - Database: {}\n\
             - LLM: {} ({}, key {})\n\
             - Mail: {}\n\
             - Sweep: every {}s, idle after {}s, logout policy {}",
            self.environment,
            self.host,
            self.http_port,
            if self.database.url.is_memory() {
                "SQLite (in-memory)"
            } else {
                "SQLite"
            },
            self.llm.model,
            self.llm.base_url,
            if self.llm.api_key.is_some() {
                "set"
            } else {
                "missing"
            },
            if self.mail.is_configured() {
                "Enabled"
            } else {
                "Disabled"
            },
            self.activity.sweep_interval_secs,
            self.activity.idle_threshold_secs,
            self.activity.logout_policy,
        )
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        warn!("Invalid {key} value '{raw}', falling back to {default}");
        default
    })
}

fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
