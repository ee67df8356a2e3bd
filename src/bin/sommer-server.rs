// ABOUTME: Server binary for the Sommer conversational backend
// ABOUTME: Loads configuration, wires storage, LLM and mail, then serves until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! # Sommer Server Binary
//!
//! Starts the chat API with idle-session tracking and daily summary mail.

use anyhow::Result;
use clap::Parser;
use sommer_server::{
    clock::{Clock, SystemClock},
    config::ServerConfig,
    database::Database,
    llm::{LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider},
    logging::LoggingConfig,
    notifications::{MailTransport, SmtpMailTransport, UnconfiguredTransport},
    resources::ServerResources,
    server,
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "sommer-server")]
#[command(about = "Sommer - conversational nightlife assistant with daily summaries")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using default configuration");
            Args { http_port: None }
        }
    };

    // config parsing warns on bad values, so the subscriber goes first
    LoggingConfig::from_env().init()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    info!("{}", config.summary());

    let database = Arc::new(Database::new(&config.database.url.to_connection_string()).await?);

    let llm = build_llm_provider(&config);
    let mail_transport = build_mail_transport(&config);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let resources = Arc::new(ServerResources::new(
        Arc::new(config),
        database,
        llm,
        mail_transport,
        clock,
    ));

    if resources.dispatcher.verify_connection().await {
        info!("Mail relay connection verified");
    }

    if let Err(e) = server::run(resources).await {
        error!("Server error: {e:#}");
        return Err(e);
    }

    Ok(())
}

fn build_llm_provider(config: &ServerConfig) -> Option<Arc<dyn LlmProvider>> {
    if config.llm.api_key.is_none() {
        warn!("OPENAI_API_KEY not set; chat requests will be rejected");
        return None;
    }

    match OpenAiCompatibleProvider::new(OpenAiCompatibleConfig::from(&config.llm)) {
        Ok(provider) => {
            info!(
                llm.provider = provider.display_name(),
                llm.model = provider.default_model(),
                "Language model provider ready"
            );
            Some(Arc::new(provider))
        }
        Err(e) => {
            error!("Failed to create language model provider: {e}");
            None
        }
    }
}

fn build_mail_transport(config: &ServerConfig) -> Arc<dyn MailTransport> {
    match SmtpMailTransport::from_config(&config.mail) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            warn!("Summary mail disabled: {e}");
            Arc::new(UnconfiguredTransport::new(e.to_string()))
        }
    }
}
