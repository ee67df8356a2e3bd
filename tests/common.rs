// ABOUTME: Shared test utilities and fakes for integration tests
// ABOUTME: In-memory store and directory, recording mail transport, scripted LLM and server wiring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `sommer_server`

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use sommer_core::models::{ContactAddress, ConversationTurn};
use sommer_server::{
    activity::ActivityRegistry,
    clock::{Clock, ManualClock},
    config::{LogoutSummaryPolicy, ServerConfig},
    database::Database,
    errors::{AppError, AppResult},
    llm::{ChatRequest, ChatResponse, LlmProvider},
    notifications::{MailTransport, NotificationDispatcher, OutgoingMail, TransportError},
    resources::ServerResources,
    session::{SessionCloseHandler, SessionSettings},
    store::{ConversationStore, UserDirectory},
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Local noon on a fixed day, so the day window never straddles midnight
pub fn local_noon() -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(2025, 3, 14, 12, 0, 0)
        .earliest()
        .expect("valid local time")
        .with_timezone(&Utc)
}

// ============================================================================
// Fakes
// ============================================================================

/// Conversation store backed by a vector
#[derive(Default)]
pub struct InMemoryStore {
    turns: Mutex<Vec<ConversationTurn>>,
    failing: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose every read fails
    pub fn failing() -> Self {
        Self {
            turns: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn push(&self, user_id: &str, prompt: &str, response: &str, at: DateTime<Utc>) {
        self.turns
            .lock()
            .unwrap()
            .push(ConversationTurn::new(user_id, prompt, response, at));
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn find(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ConversationTurn>> {
        if self.failing {
            return Err(AppError::database("conversation table unavailable"));
        }
        Ok(self
            .turns
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && t.created_at >= start && t.created_at <= end)
            .cloned()
            .collect())
    }
}

/// Directory with a fixed user-to-address map
#[derive(Default)]
pub struct StaticDirectory {
    addresses: HashMap<String, String>,
    failing: bool,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            addresses: HashMap::new(),
            failing: true,
        }
    }

    #[must_use]
    pub fn with(mut self, user_id: &str, address: &str) -> Self {
        self.addresses.insert(user_id.to_owned(), address.to_owned());
        self
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn find_address(&self, user_id: &str) -> AppResult<Option<ContactAddress>> {
        if self.failing {
            return Err(AppError::database("users table unavailable"));
        }
        Ok(self
            .addresses
            .get(user_id)
            .and_then(|a| ContactAddress::parse(a)))
    }
}

/// Transport that records every message and rejects chosen recipients
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingMail>>,
    reject: HashSet<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject mail addressed to `address`
    #[must_use]
    pub fn rejecting(mut self, address: &str) -> Self {
        self.reject.insert(address.to_owned());
        self
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        let mut to: Vec<String> = self
            .sent()
            .iter()
            .map(|m| m.to.as_str().to_owned())
            .collect();
        to.sort();
        to
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn sender_address(&self) -> Option<&str> {
        Some("sommer@example.com")
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        if self.reject.contains(mail.to.as_str()) {
            return Err(TransportError::Rejected(format!(
                "550 mailbox unavailable: {}",
                mail.to
            )));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }

    async fn verify_connection(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// LLM that answers every prompt with a canned prefix
#[derive(Default)]
pub struct ScriptedLlm {
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &str {
        "Scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request.clone());
        Ok(ChatResponse {
            content: format!("Plan para: {last}"),
            model: "scripted-1".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// Close handler over fakes, plus the pieces tests poke at
pub struct HandlerFixture {
    pub handler: Arc<SessionCloseHandler>,
    pub registry: Arc<ActivityRegistry>,
    pub clock: Arc<ManualClock>,
    pub transport: Arc<RecordingTransport>,
}

pub fn create_test_handler(
    store: InMemoryStore,
    directory: StaticDirectory,
    transport: RecordingTransport,
    logout_policy: LogoutSummaryPolicy,
) -> HandlerFixture {
    init_test_logging();
    let registry = Arc::new(ActivityRegistry::new());
    let clock = Arc::new(ManualClock::new(local_noon()));
    let transport = Arc::new(transport);
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::clone(&transport) as Arc<dyn MailTransport>,
        "Sommer Assistant",
    ));

    let handler = Arc::new(SessionCloseHandler::new(
        Arc::clone(&registry),
        Arc::new(directory),
        Arc::new(store),
        dispatcher,
        Arc::clone(&clock) as Arc<dyn Clock>,
        SessionSettings {
            logout_policy,
            subject: "Tu resumen con Sommer".to_owned(),
        },
    ));

    HandlerFixture {
        handler,
        registry,
        clock,
        transport,
    }
}

/// Full server context over an in-memory database
pub struct ServerFixture {
    pub resources: Arc<ServerResources>,
    pub clock: Arc<ManualClock>,
    pub transport: Arc<RecordingTransport>,
    pub llm: Arc<ScriptedLlm>,
}

pub async fn create_test_resources(transport: RecordingTransport) -> ServerFixture {
    init_test_logging();
    let config = ServerConfig::from_lookup(|_| None).expect("default config is valid");
    let database = Arc::new(
        Database::new("sqlite::memory:")
            .await
            .expect("in-memory database"),
    );
    let clock = Arc::new(ManualClock::new(local_noon()));
    let transport = Arc::new(transport);
    let llm = Arc::new(ScriptedLlm::new());

    let mut resources = ServerResources::new(
        Arc::new(config),
        database,
        Some(Arc::clone(&llm) as Arc<dyn LlmProvider>),
        Arc::clone(&transport) as Arc<dyn MailTransport>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    resources.auth = resources.auth.clone().with_hash_cost(4);

    ServerFixture {
        resources: Arc::new(resources),
        clock,
        transport,
        llm,
    }
}
