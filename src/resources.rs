// ABOUTME: Long-lived server context shared by route handlers and the background sweeper
// ABOUTME: Wires the activity registry, close handler, services and mail dispatcher together once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use crate::activity::{ActivityRegistry, InactivitySweeper, SweeperConfig};
use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::llm::LlmProvider;
use crate::notifications::{MailTransport, NotificationDispatcher};
use crate::services::{AuthService, ChatService, ChatSettings};
use crate::session::{SessionCloseHandler, SessionSettings};
use crate::store::{ConversationStore, UserDirectory};
use std::sync::Arc;

/// Everything request handlers need, created once at startup
///
/// The activity registry is owned here and shared by reference with the
/// services, the close handler and the sweeper.
#[derive(Clone)]
pub struct ServerResources {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Persistence
    pub database: Arc<Database>,
    /// Per-user session activity
    pub registry: Arc<ActivityRegistry>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Summary mail dispatcher
    pub dispatcher: Arc<NotificationDispatcher>,
    /// Session close orchestration
    pub session: Arc<SessionCloseHandler>,
    /// Idle-session sweeper
    pub sweeper: Arc<InactivitySweeper>,
    /// Chat backend, when one is configured
    pub llm: Option<Arc<dyn LlmProvider>>,
    /// Chat proxy
    pub chat: ChatService,
    /// Account operations
    pub auth: AuthService,
}

impl ServerResources {
    /// Wire all components from their external collaborators
    #[must_use]
    pub fn new(
        config: Arc<ServerConfig>,
        database: Arc<Database>,
        llm: Option<Arc<dyn LlmProvider>>,
        mail_transport: Arc<dyn MailTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Arc::new(ActivityRegistry::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            mail_transport,
            config.mail.from_name.clone(),
        ));

        let session = Arc::new(SessionCloseHandler::new(
            Arc::clone(&registry),
            Arc::clone(&database) as Arc<dyn UserDirectory>,
            Arc::clone(&database) as Arc<dyn ConversationStore>,
            Arc::clone(&dispatcher),
            Arc::clone(&clock),
            SessionSettings {
                logout_policy: config.activity.logout_policy,
                subject: config.mail.subject.clone(),
            },
        ));

        let sweeper = Arc::new(InactivitySweeper::new(
            Arc::clone(&registry),
            Arc::clone(&session),
            Arc::clone(&clock),
            SweeperConfig {
                interval: config.activity.sweep_interval(),
                idle_threshold: config.activity.idle_threshold(),
            },
        ));

        let chat = ChatService::new(
            Arc::clone(&database),
            llm.clone(),
            Arc::clone(&registry),
            Arc::clone(&clock),
            ChatSettings::from(&config.llm),
        );
        let auth = AuthService::new(
            Arc::clone(&database),
            Arc::clone(&registry),
            Arc::clone(&clock),
        );

        Self {
            config,
            database,
            registry,
            clock,
            dispatcher,
            session,
            sweeper,
            llm,
            chat,
            auth,
        }
    }
}
