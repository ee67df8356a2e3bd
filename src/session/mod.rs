// ABOUTME: Session close orchestration: evict, build the day's summary and mail it once
// ABOUTME: Shared by the idle sweeper and explicit logout; per-job errors never escape as panics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! # Session Close
//!
//! [`SessionCloseHandler::close`] runs one summary job for a user whose
//! session ended. Each job moves from pending to exactly one terminal
//! [`JobOutcome`] and is never retried: a failed send loses that day's
//! summary rather than risking a duplicate email.

/// Calendar-day window computation
pub mod window;

pub use window::day_window;

use crate::activity::{validate_user_id, ActivityRegistry};
use crate::clock::Clock;
use crate::config::LogoutSummaryPolicy;
use crate::errors::AppResult;
use crate::notifications::{NotificationDispatcher, TransportError};
use crate::store::{ConversationStore, UserDirectory};
use crate::summary::SummaryBuilder;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The sweeper found the user idle past the threshold
    Idle,
    /// The user asked to log out
    ExplicitLogout,
}

impl CloseReason {
    /// Log representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ExplicitLogout => "explicit_logout",
        }
    }
}

/// Why no summary was sent even though nothing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The user is unknown or has no address on file
    NoContactAddress,
    /// Logout for a user without a tracked session under the tracked-only policy
    NoTrackedActivity,
}

/// Why a summary job failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    /// The contact lookup failed
    Directory(String),
    /// The conversation history could not be read
    Store(String),
    /// The mail transport did not deliver the message
    Transport(TransportError),
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(msg) => write!(f, "contact lookup failed: {msg}"),
            Self::Store(msg) => write!(f, "conversation history unavailable: {msg}"),
            Self::Transport(e) => write!(f, "{e}"),
        }
    }
}

/// Terminal state of a summary job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The summary was handed to the mail transport
    Sent,
    /// Nothing to do for this user
    Skipped(SkipReason),
    /// The job gave up; no retry follows
    Failed(JobFailure),
}

impl JobOutcome {
    /// Wire and log representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// A summary job in flight
///
/// Consumed by [`SummaryJob::finish`], so a job reaches a terminal outcome at
/// most once.
#[derive(Debug)]
pub struct SummaryJob {
    user_id: String,
    reason: CloseReason,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
}

impl SummaryJob {
    fn pending(
        user_id: &str,
        reason: CloseReason,
        window: (DateTime<Utc>, DateTime<Utc>),
    ) -> Self {
        Self {
            user_id: user_id.to_owned(),
            reason,
            window_start: window.0,
            window_end: window.1,
        }
    }

    fn finish(self, outcome: JobOutcome) -> JobOutcome {
        match &outcome {
            JobOutcome::Sent => info!(
                user.id = %self.user_id,
                session.reason = self.reason.as_str(),
                job.outcome = outcome.as_str(),
                "Conversation summary sent"
            ),
            JobOutcome::Skipped(skip) => warn!(
                user.id = %self.user_id,
                session.reason = self.reason.as_str(),
                job.outcome = outcome.as_str(),
                job.skip_reason = ?skip,
                "Conversation summary skipped"
            ),
            JobOutcome::Failed(failure) => error!(
                user.id = %self.user_id,
                session.reason = self.reason.as_str(),
                job.outcome = outcome.as_str(),
                window.start = %self.window_start,
                window.end = %self.window_end,
                "Conversation summary failed: {failure}"
            ),
        }
        outcome
    }
}

/// Tunables for the close handler
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Whether logout without a tracked session still sends a summary
    pub logout_policy: LogoutSummaryPolicy,
    /// Subject line of summary emails
    pub subject: String,
}

/// Runs the evict, summarize and dispatch sequence for one user
pub struct SessionCloseHandler {
    registry: Arc<ActivityRegistry>,
    directory: Arc<dyn UserDirectory>,
    summaries: SummaryBuilder,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
}

impl SessionCloseHandler {
    /// Wire the handler to its collaborators
    #[must_use]
    pub fn new(
        registry: Arc<ActivityRegistry>,
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn ConversationStore>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            registry,
            directory,
            summaries: SummaryBuilder::new(store),
            dispatcher,
            clock,
            settings,
        }
    }

    /// Close the session of `user_id` and mail today's summary
    ///
    /// For [`CloseReason::Idle`] the sweeper has already evicted the user.
    /// Lookup, history and transport failures become
    /// [`JobOutcome::Failed`]; only an invalid `user_id` is returned as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `user_id` is empty
    pub async fn close(&self, user_id: &str, reason: CloseReason) -> AppResult<JobOutcome> {
        let user_id = validate_user_id(user_id)?;

        if reason == CloseReason::ExplicitLogout {
            let tracked = self.registry.remove_and_touch(user_id);
            debug!(user.id = %user_id, session.tracked = tracked, "Logout removed session");
            if !tracked && self.settings.logout_policy == LogoutSummaryPolicy::TrackedOnly {
                let job = SummaryJob::pending(user_id, reason, self.today());
                return Ok(job.finish(JobOutcome::Skipped(SkipReason::NoTrackedActivity)));
            }
        }

        let job = SummaryJob::pending(user_id, reason, self.today());
        let outcome = self.run(&job).await;
        Ok(job.finish(outcome))
    }

    fn today(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        day_window(self.clock.now(), &Local)
    }

    async fn run(&self, job: &SummaryJob) -> JobOutcome {
        let address = match self.directory.find_address(&job.user_id).await {
            Ok(Some(address)) => address,
            Ok(None) => return JobOutcome::Skipped(SkipReason::NoContactAddress),
            Err(e) => return JobOutcome::Failed(JobFailure::Directory(e.to_string())),
        };

        let body = match self
            .summaries
            .build(&job.user_id, job.window_start, job.window_end)
            .await
        {
            Ok(body) => body,
            Err(e) => return JobOutcome::Failed(JobFailure::Store(e.to_string())),
        };

        match self
            .dispatcher
            .dispatch(&address, &self.settings.subject, &body)
            .await
        {
            Ok(()) => JobOutcome::Sent,
            Err(e) => JobOutcome::Failed(JobFailure::Transport(e)),
        }
    }
}
