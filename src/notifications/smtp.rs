// ABOUTME: SMTP mail transport for summary emails using an async lettre relay
// ABOUTME: Maps relay, TLS and address failures onto TransportError variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use super::{MailTransport, OutgoingMail, TransportError};
use crate::config::MailConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

/// Mail transport that talks to an SMTP relay
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
    host: String,
}

impl SmtpMailTransport {
    /// Build a relay client from mail settings
    ///
    /// `secure = true` uses implicit TLS (usually port 465), otherwise the
    /// connection is upgraded with STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] when the host or sender is
    /// missing or the TLS parameters cannot be built
    pub fn from_config(config: &MailConfig) -> Result<Self, TransportError> {
        let host = config
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| TransportError::Configuration("MAIL_HOST is not set".to_owned()))?;
        let sender = config
            .username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| TransportError::Configuration("MAIL_USER is not set".to_owned()))?;

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| TransportError::Configuration(format!("invalid relay {host}: {e}")))?;

        let mut builder = builder.port(config.port);
        if let Some(password) = config.password.as_ref() {
            builder = builder.credentials(Credentials::new(sender.to_owned(), password.clone()));
        }

        debug!(
            mail.host = %host,
            mail.port = config.port,
            mail.secure = config.secure,
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            sender: sender.to_owned(),
            host: host.to_owned(),
        })
    }

    fn build_message(mail: &OutgoingMail) -> Result<Message, TransportError> {
        let from_address: Address = mail
            .from_address
            .parse()
            .map_err(|e| TransportError::InvalidAddress(format!("{}: {e}", mail.from_address)))?;
        let to: Mailbox = mail
            .to
            .as_str()
            .parse()
            .map_err(|e| TransportError::InvalidAddress(format!("{}: {e}", mail.to)))?;

        Message::builder()
            .from(Mailbox::new(Some(mail.from_name.clone()), from_address))
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| TransportError::Rejected(format!("could not build message: {e}")))
    }

    fn classify(&self, error: &SmtpError) -> TransportError {
        if error.is_permanent() || error.is_transient() {
            TransportError::Rejected(format!("{}: {error}", self.host))
        } else {
            TransportError::Connection(format!("{}: {error}", self.host))
        }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    fn name(&self) -> &'static str {
        "smtp"
    }

    fn sender_address(&self) -> Option<&str> {
        Some(&self.sender)
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        let message = Self::build_message(mail)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| self.classify(&e))
    }

    async fn verify_connection(&self) -> Result<(), TransportError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::Connection(format!(
                "{} did not answer the connection test",
                self.host
            ))),
            Err(e) => Err(self.classify(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sommer_core::models::ContactAddress;

    fn mail_config() -> MailConfig {
        MailConfig {
            host: Some("smtp.example.com".to_owned()),
            port: 465,
            secure: true,
            username: Some("sommer@example.com".to_owned()),
            password: Some("secret".to_owned()),
            from_name: "Sommer Assistant".to_owned(),
            subject: "Summary".to_owned(),
        }
    }

    #[test]
    fn test_missing_host_is_configuration_error() {
        let config = MailConfig {
            host: None,
            ..mail_config()
        };
        let result = SmtpMailTransport::from_config(&config);
        assert!(matches!(result, Err(TransportError::Configuration(_))));
    }

    #[test]
    fn test_missing_user_is_configuration_error() {
        let config = MailConfig {
            username: Some("  ".to_owned()),
            ..mail_config()
        };
        let result = SmtpMailTransport::from_config(&config);
        assert!(matches!(result, Err(TransportError::Configuration(_))));
    }

    #[test]
    fn test_build_message_rejects_bad_sender() {
        let mail = OutgoingMail {
            from_name: "Sommer".to_owned(),
            from_address: "not an address".to_owned(),
            to: ContactAddress::parse("ana@example.com").unwrap(),
            subject: "Summary".to_owned(),
            body: "body".to_owned(),
        };
        assert!(matches!(
            SmtpMailTransport::build_message(&mail),
            Err(TransportError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_build_message_accepts_valid_mail() {
        let mail = OutgoingMail {
            from_name: "Sommer".to_owned(),
            from_address: "sommer@example.com".to_owned(),
            to: ContactAddress::parse("ana@example.com").unwrap(),
            subject: "Summary".to_owned(),
            body: "🗨️ hola\n💬 que más".to_owned(),
        };
        assert!(SmtpMailTransport::build_message(&mail).is_ok());
    }
}
