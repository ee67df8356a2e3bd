// ABOUTME: Notification dispatch for conversation summaries over a pluggable mail transport
// ABOUTME: Distinguishes transport failures from success and verifies connectivity at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! # Notifications
//!
//! The [`NotificationDispatcher`] hands plain-text messages to a
//! [`MailTransport`]. Failures are always surfaced as [`TransportError`] so the
//! caller decides whether to log and drop; nothing here retries.

/// SMTP transport backed by lettre
pub mod smtp;

pub use smtp::SmtpMailTransport;

use async_trait::async_trait;
use sommer_core::models::ContactAddress;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Mail transport failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport is missing settings (host, credentials, sender)
    #[error("mail transport is not configured: {0}")]
    Configuration(String),
    /// The transport could not reach or authenticate with the relay
    #[error("mail transport connection failed: {0}")]
    Connection(String),
    /// The relay refused the message
    #[error("mail transport rejected the message: {0}")]
    Rejected(String),
    /// Sender or recipient could not be parsed as a mailbox
    #[error("invalid mail address: {0}")]
    InvalidAddress(String),
}

/// Message ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Display name of the sender
    pub from_name: String,
    /// Sender address
    pub from_address: String,
    /// Recipient
    pub to: ContactAddress,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// External mail transport
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Transport identifier for logs
    fn name(&self) -> &'static str;

    /// Sender address this transport is allowed to use, if configured
    fn sender_address(&self) -> Option<&str>;

    /// Deliver one message
    async fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError>;

    /// Check that the relay is reachable and accepts our credentials
    async fn verify_connection(&self) -> Result<(), TransportError>;
}

/// Transport used when no mail relay is configured
///
/// Every send fails with [`TransportError::Configuration`], which keeps the
/// mail path degraded rather than fatal.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredTransport {
    reason: String,
}

impl UnconfiguredTransport {
    /// Create a transport that reports `reason` on every call
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MailTransport for UnconfiguredTransport {
    fn name(&self) -> &'static str {
        "unconfigured"
    }

    fn sender_address(&self) -> Option<&str> {
        None
    }

    async fn send(&self, _mail: &OutgoingMail) -> Result<(), TransportError> {
        Err(TransportError::Configuration(self.reason.clone()))
    }

    async fn verify_connection(&self) -> Result<(), TransportError> {
        Err(TransportError::Configuration(self.reason.clone()))
    }
}

/// Sends formatted text messages to contact addresses
pub struct NotificationDispatcher {
    transport: Arc<dyn MailTransport>,
    from_name: String,
}

impl NotificationDispatcher {
    /// Create a dispatcher that signs messages with `from_name`
    #[must_use]
    pub fn new(transport: Arc<dyn MailTransport>, from_name: impl Into<String>) -> Self {
        Self {
            transport,
            from_name: from_name.into(),
        }
    }

    /// Hand a message to the transport
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the transport is unconfigured,
    /// unreachable, or refuses the message
    pub async fn dispatch(
        &self,
        to: &ContactAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), TransportError> {
        let from_address = self
            .transport
            .sender_address()
            .ok_or_else(|| TransportError::Configuration("no sender address".to_owned()))?
            .to_owned();

        let mail = OutgoingMail {
            from_name: self.from_name.clone(),
            from_address,
            to: to.clone(),
            subject: subject.to_owned(),
            body: body.to_owned(),
        };

        self.transport.send(&mail).await?;
        info!(
            mail.transport = self.transport.name(),
            mail.to = %to,
            "Summary email sent"
        );
        Ok(())
    }

    /// One-time startup connectivity check
    ///
    /// A failure is logged as a warning and reported as `false`; the server
    /// keeps serving requests with a degraded mail path.
    pub async fn verify_connection(&self) -> bool {
        match self.transport.verify_connection().await {
            Ok(()) => {
                info!(
                    mail.transport = self.transport.name(),
                    "Mail transport ready to send summaries"
                );
                true
            }
            Err(e) => {
                warn!(
                    mail.transport = self.transport.name(),
                    "Mail transport verification failed, summaries will not be delivered: {e}"
                );
                false
            }
        }
    }
}
