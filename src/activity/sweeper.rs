// ABOUTME: Periodic idle-session sweeper that evicts inactive users and closes their sessions
// ABOUTME: Runs one summary job per evicted user and logs a single aggregated report per tick
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

use super::ActivityRegistry;
use crate::clock::Clock;
use crate::session::{CloseReason, JobOutcome, SessionCloseHandler};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Longest period the background loop will wait between ticks
pub const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(86_400);

/// Sweep period and idle threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperConfig {
    /// Time between ticks
    pub interval: Duration,
    /// Inactivity after which a session is closed
    pub idle_threshold: chrono::Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            idle_threshold: chrono::Duration::seconds(60),
        }
    }
}

/// Per-tick tally of summary job outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Users evicted by this tick
    pub evicted: usize,
    /// Summaries sent
    pub sent: usize,
    /// Users skipped (no contact address)
    pub skipped: usize,
    /// Jobs that failed or panicked
    pub failed: usize,
}

/// Repeating task that drains idle users from the registry
///
/// Call [`InactivitySweeper::start`] once at startup and
/// [`InactivitySweeper::stop`] during shutdown. Jobs already spawned when
/// `stop` is called run to completion.
pub struct InactivitySweeper {
    registry: Arc<ActivityRegistry>,
    handler: Arc<SessionCloseHandler>,
    clock: Arc<dyn Clock>,
    config: SweeperConfig,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl InactivitySweeper {
    /// Create a stopped sweeper
    #[must_use]
    pub fn new(
        registry: Arc<ActivityRegistry>,
        handler: Arc<SessionCloseHandler>,
        clock: Arc<dyn Clock>,
        config: SweeperConfig,
    ) -> Self {
        Self {
            registry,
            handler,
            clock,
            config,
            shutdown_tx: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Sweep settings in effect
    #[must_use]
    pub const fn config(&self) -> SweeperConfig {
        self.config
    }

    /// Whether the background loop is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Spawn the background loop; the first tick fires one interval from now
    pub fn start(self: &Arc<Self>) {
        let mut task_slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task_slot.is_some() {
            warn!("Inactivity sweeper already started");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        *self
            .shutdown_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(shutdown_tx);

        let sweeper = Arc::clone(self);
        let period = self.config.interval.min(MAX_SWEEP_PERIOD);

        *task_slot = Some(tokio::spawn(async move {
            let now = Instant::now();
            let first_tick = now.checked_add(period).unwrap_or(now);
            let mut interval = interval_at(first_tick, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut in_flight: JoinSet<SweepReport> = JoinSet::new();

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let evicted = sweeper.sweep(sweeper.clock.now());
                        let handler = Arc::clone(&sweeper.handler);
                        in_flight.spawn(close_evicted(handler, evicted));
                    }
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(e) = joined {
                            error!("Sweep tick task aborted: {e}");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Inactivity sweeper shutting down");
                        break;
                    }
                }
            }

            while let Some(joined) = in_flight.join_next().await {
                if let Err(e) = joined {
                    error!("Sweep tick task aborted: {e}");
                }
            }
        }));

        info!(
            sweep.interval_secs = period.as_secs(),
            sweep.idle_threshold_secs = self.config.idle_threshold.num_seconds(),
            "Inactivity sweeper started"
        );
    }

    /// Cancel future ticks and wait for the loop and in-flight jobs to finish
    pub async fn stop(&self) {
        let shutdown_tx = self
            .shutdown_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = shutdown_tx {
            // receiver is gone if the loop already exited
            let _ = tx.send(()).await;
        }

        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Inactivity sweeper task ended abnormally: {e}");
            }
            info!("Inactivity sweeper stopped");
        }
    }

    /// Run one sweep at `now` and wait for its jobs
    pub async fn tick(&self, now: DateTime<Utc>) -> SweepReport {
        let evicted = self.sweep(now);
        close_evicted(Arc::clone(&self.handler), evicted).await
    }

    fn sweep(&self, now: DateTime<Utc>) -> Vec<String> {
        self.registry.sweep_idle(now, self.config.idle_threshold)
    }
}

async fn close_evicted(handler: Arc<SessionCloseHandler>, evicted: Vec<String>) -> SweepReport {
    let mut report = SweepReport {
        evicted: evicted.len(),
        ..SweepReport::default()
    };

    let jobs: Vec<(String, JoinHandle<_>)> = evicted
        .into_iter()
        .map(|user_id| {
            let handler = Arc::clone(&handler);
            let job_user = user_id.clone();
            let job = tokio::spawn(async move { handler.close(&job_user, CloseReason::Idle).await });
            (user_id, job)
        })
        .collect();

    for (user_id, job) in jobs {
        match job.await {
            Ok(Ok(JobOutcome::Sent)) => report.sent += 1,
            Ok(Ok(JobOutcome::Skipped(_))) => report.skipped += 1,
            Ok(Ok(JobOutcome::Failed(_))) => report.failed += 1,
            Ok(Err(e)) => {
                warn!(user.id = %user_id, "Idle session close rejected: {e}");
                report.failed += 1;
            }
            Err(e) => {
                error!(user.id = %user_id, "Idle session close job panicked: {e}");
                report.failed += 1;
            }
        }
    }

    if report.evicted > 0 {
        info!(
            sweep.evicted = report.evicted,
            sweep.sent = report.sent,
            sweep.skipped = report.skipped,
            sweep.failed = report.failed,
            "Inactivity sweep completed"
        );
    } else {
        debug!("Inactivity sweep found no idle sessions");
    }

    report
}
