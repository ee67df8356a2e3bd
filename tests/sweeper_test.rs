// ABOUTME: Integration tests for the inactivity sweeper
// ABOUTME: Drives ticks with a manual clock and paused tokio time; checks eviction and failure isolation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::Duration;
use common::{create_test_handler, HandlerFixture, InMemoryStore, RecordingTransport, StaticDirectory};
use sommer_server::activity::{InactivitySweeper, SweepReport, SweeperConfig, MAX_SWEEP_PERIOD};
use sommer_server::clock::Clock;
use sommer_server::config::LogoutSummaryPolicy;
use std::sync::Arc;

fn sweeper_for(fixture: &HandlerFixture) -> Arc<InactivitySweeper> {
    Arc::new(InactivitySweeper::new(
        Arc::clone(&fixture.registry),
        Arc::clone(&fixture.handler),
        Arc::clone(&fixture.clock) as Arc<dyn Clock>,
        SweeperConfig {
            interval: std::time::Duration::from_secs(60),
            idle_threshold: Duration::seconds(60),
        },
    ))
}

fn directory() -> StaticDirectory {
    StaticDirectory::new()
        .with("ana", "ana@example.com")
        .with("bruno", "bruno@example.com")
        .with("carla", "carla@example.com")
}

#[tokio::test]
async fn test_only_sessions_past_threshold_are_closed() {
    let fixture = create_test_handler(
        InMemoryStore::new(),
        directory(),
        RecordingTransport::new(),
        LogoutSummaryPolicy::Always,
    );
    let sweeper = sweeper_for(&fixture);
    let t0 = fixture.clock.now();

    fixture.registry.record_activity("ana", t0);
    fixture.registry.record_activity("bruno", t0 + Duration::seconds(40));

    let report = sweeper.tick(t0 + Duration::seconds(70)).await;
    assert_eq!(
        report,
        SweepReport {
            evicted: 1,
            sent: 1,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(fixture.transport.recipients(), vec!["ana@example.com"]);
    assert!(!fixture.registry.contains("ana"));
    assert!(fixture.registry.contains("bruno"));

    let report = sweeper.tick(t0 + Duration::seconds(101)).await;
    assert_eq!(report.evicted, 1);
    assert_eq!(
        fixture.transport.recipients(),
        vec!["ana@example.com", "bruno@example.com"]
    );
    assert!(fixture.registry.is_empty());
}

#[tokio::test]
async fn test_idle_exactly_at_threshold_is_kept() {
    let fixture = create_test_handler(
        InMemoryStore::new(),
        directory(),
        RecordingTransport::new(),
        LogoutSummaryPolicy::Always,
    );
    let sweeper = sweeper_for(&fixture);
    let t0 = fixture.clock.now();
    fixture.registry.record_activity("ana", t0);

    let report = sweeper.tick(t0 + Duration::seconds(60)).await;

    assert_eq!(report, SweepReport::default());
    assert!(fixture.registry.contains("ana"));
}

#[tokio::test]
async fn test_activity_resets_idle_timer() {
    let fixture = create_test_handler(
        InMemoryStore::new(),
        directory(),
        RecordingTransport::new(),
        LogoutSummaryPolicy::Always,
    );
    let sweeper = sweeper_for(&fixture);
    let t0 = fixture.clock.now();
    fixture.registry.record_activity("ana", t0);
    fixture.registry.record_activity("ana", t0 + Duration::seconds(50));

    let report = sweeper.tick(t0 + Duration::seconds(90)).await;

    assert_eq!(report.evicted, 0);
    assert!(fixture.transport.sent().is_empty());
}

#[tokio::test]
async fn test_one_failed_job_does_not_block_others() {
    let fixture = create_test_handler(
        InMemoryStore::new(),
        directory(),
        RecordingTransport::new().rejecting("bruno@example.com"),
        LogoutSummaryPolicy::Always,
    );
    let sweeper = sweeper_for(&fixture);
    let t0 = fixture.clock.now();
    for user in ["ana", "bruno", "carla", "dario"] {
        fixture.registry.record_activity(user, t0);
    }

    let report = sweeper.tick(t0 + Duration::seconds(120)).await;

    assert_eq!(
        report,
        SweepReport {
            evicted: 4,
            sent: 2,
            skipped: 1,
            failed: 1
        }
    );
    assert_eq!(
        fixture.transport.recipients(),
        vec!["ana@example.com", "carla@example.com"]
    );
    assert!(fixture.registry.is_empty());
}

#[tokio::test]
async fn test_evicted_user_is_not_closed_twice() {
    let fixture = create_test_handler(
        InMemoryStore::new(),
        directory(),
        RecordingTransport::new(),
        LogoutSummaryPolicy::Always,
    );
    let sweeper = sweeper_for(&fixture);
    let t0 = fixture.clock.now();
    fixture.registry.record_activity("ana", t0);

    sweeper.tick(t0 + Duration::seconds(61)).await;
    let second = sweeper.tick(t0 + Duration::seconds(200)).await;

    assert_eq!(second.evicted, 0);
    assert_eq!(fixture.transport.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_background_loop_ticks_until_stopped() {
    let fixture = create_test_handler(
        InMemoryStore::new(),
        directory(),
        RecordingTransport::new(),
        LogoutSummaryPolicy::Always,
    );
    let sweeper = sweeper_for(&fixture);
    fixture
        .registry
        .record_activity("ana", fixture.clock.now());

    sweeper.start();
    assert!(sweeper.is_running());

    fixture.clock.advance(Duration::seconds(90));
    tokio::time::sleep(std::time::Duration::from_secs(61)).await;
    sweeper.stop().await;

    assert!(!sweeper.is_running());
    assert!(!fixture.registry.contains("ana"));
    assert_eq!(fixture.transport.recipients(), vec!["ana@example.com"]);

    // no ticks after stop
    fixture.registry.record_activity("bruno", fixture.clock.now());
    fixture.clock.advance(Duration::seconds(300));
    tokio::time::sleep(std::time::Duration::from_secs(180)).await;
    assert!(fixture.registry.contains("bruno"));
}

#[tokio::test(start_paused = true)]
async fn test_oversized_interval_is_clamped() {
    let fixture = create_test_handler(
        InMemoryStore::new(),
        directory(),
        RecordingTransport::new(),
        LogoutSummaryPolicy::Always,
    );
    let sweeper = Arc::new(InactivitySweeper::new(
        Arc::clone(&fixture.registry),
        Arc::clone(&fixture.handler),
        Arc::clone(&fixture.clock) as Arc<dyn Clock>,
        SweeperConfig {
            interval: std::time::Duration::MAX,
            idle_threshold: Duration::seconds(60),
        },
    ));
    fixture
        .registry
        .record_activity("ana", fixture.clock.now());

    sweeper.start();
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert!(sweeper.is_running());

    // the loop falls back to the longest supported period
    fixture.clock.advance(Duration::seconds(120));
    tokio::time::sleep(MAX_SWEEP_PERIOD).await;
    sweeper.stop().await;

    assert!(!fixture.registry.contains("ana"));
    assert_eq!(fixture.transport.recipients(), vec!["ana@example.com"]);
}

#[tokio::test]
async fn test_stop_without_start_is_noop() {
    let fixture = create_test_handler(
        InMemoryStore::new(),
        directory(),
        RecordingTransport::new(),
        LogoutSummaryPolicy::Always,
    );
    let sweeper = sweeper_for(&fixture);

    sweeper.stop().await;

    assert!(!sweeper.is_running());
}
