// ABOUTME: Per-user session activity tracking shared by request handlers and the idle sweeper
// ABOUTME: Records last-seen times and atomically evicts users who went idle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sommer Contributors

//! # Session Activity
//!
//! The [`ActivityRegistry`] holds one last-seen timestamp per active user.
//! Request handlers touch it on every authenticated interaction, the
//! [`InactivitySweeper`] drains idle entries on a fixed interval and hands
//! each evicted user to the session close handler.
//!
//! The registry is an explicit instance owned by the server resources and
//! passed by reference, so tests can run several independent registries.

/// Periodic idle-session sweeper
pub mod sweeper;

pub use sweeper::{InactivitySweeper, SweepReport, SweeperConfig, MAX_SWEEP_PERIOD};

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Last observed activity for a single user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    /// User identity
    pub user_id: String,
    /// Most recent recorded activity
    pub last_seen_at: DateTime<Utc>,
}

/// Process-wide map of user identity to last observed activity
///
/// At most one record exists per user. Every operation runs under the
/// per-key shard lock of the underlying map, so concurrent sweeps never
/// return the same eviction twice.
#[derive(Debug, Default)]
pub struct ActivityRegistry {
    sessions: DashMap<String, DateTime<Utc>>,
}

impl ActivityRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the last-seen time for `user_id`
    pub fn record_activity(&self, user_id: &str, now: DateTime<Utc>) {
        self.sessions.insert(user_id.to_owned(), now);
    }

    /// Remove and return every user idle for strictly longer than `threshold`
    pub fn sweep_idle(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<String> {
        let mut evicted = Vec::new();
        self.sessions.retain(|user_id, last_seen| {
            if now.signed_duration_since(*last_seen) > threshold {
                evicted.push(user_id.clone());
                false
            } else {
                true
            }
        });
        evicted
    }

    /// Remove the record for `user_id`, reporting whether one existed
    pub fn remove_and_touch(&self, user_id: &str) -> bool {
        self.sessions.remove(user_id).is_some()
    }

    /// Look up the record for `user_id`
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<ActivityRecord> {
        self.sessions.get(user_id).map(|entry| ActivityRecord {
            user_id: entry.key().clone(),
            last_seen_at: *entry.value(),
        })
    }

    /// Whether `user_id` currently has a tracked session
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    /// Number of tracked sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Reject missing or blank user identifiers before they reach the registry
///
/// # Errors
///
/// Returns a validation error when `user_id` is empty or whitespace only
pub fn validate_user_id(user_id: &str) -> AppResult<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::missing_field("user_id"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-14T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_record_then_sweep_same_instant_never_evicts() {
        let registry = ActivityRegistry::new();
        registry.record_activity("ana", t0());

        for secs in [1, 60, 3600] {
            assert!(registry.sweep_idle(t0(), Duration::seconds(secs)).is_empty());
        }
        assert!(registry.contains("ana"));
    }

    #[test]
    fn test_sweep_evicts_only_strictly_past_threshold() {
        let registry = ActivityRegistry::new();
        registry.record_activity("ana", t0());

        let threshold = Duration::seconds(60);
        assert!(registry
            .sweep_idle(t0() + Duration::seconds(60), threshold)
            .is_empty());
        assert_eq!(
            registry.sweep_idle(t0() + Duration::seconds(61), threshold),
            vec!["ana".to_owned()]
        );
    }

    #[test]
    fn test_eviction_is_at_most_once() {
        let registry = ActivityRegistry::new();
        registry.record_activity("ana", t0());
        let later = t0() + Duration::seconds(120);

        assert_eq!(registry.sweep_idle(later, Duration::seconds(60)).len(), 1);
        assert!(registry.sweep_idle(later, Duration::seconds(60)).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_record_overwrites_last_seen() {
        let registry = ActivityRegistry::new();
        registry.record_activity("ana", t0());
        registry.record_activity("ana", t0() + Duration::seconds(50));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("ana").map(|r| r.last_seen_at),
            Some(t0() + Duration::seconds(50))
        );
        assert!(registry
            .sweep_idle(t0() + Duration::seconds(100), Duration::seconds(60))
            .is_empty());
    }

    #[test]
    fn test_sweep_leaves_active_users() {
        let registry = ActivityRegistry::new();
        registry.record_activity("idle", t0());
        registry.record_activity("busy", t0() + Duration::seconds(90));

        let evicted = registry.sweep_idle(t0() + Duration::seconds(100), Duration::seconds(60));
        assert_eq!(evicted, vec!["idle".to_owned()]);
        assert!(registry.contains("busy"));
    }

    #[test]
    fn test_concurrent_sweeps_evict_each_user_once() {
        const USERS: usize = 2000;
        const THREADS: usize = 8;
        const ROUNDS: usize = 50;

        let registry = ActivityRegistry::new();
        for i in 0..USERS {
            registry.record_activity(&format!("user-{i}"), t0());
        }
        let later = t0() + Duration::seconds(120);

        let per_thread: Vec<Vec<String>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        let mut evicted = Vec::new();
                        for _ in 0..ROUNDS {
                            evicted.extend(registry.sweep_idle(later, Duration::seconds(60)));
                        }
                        evicted
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut counts: HashMap<String, usize> = HashMap::new();
        for user_id in per_thread.into_iter().flatten() {
            *counts.entry(user_id).or_default() += 1;
        }
        assert_eq!(counts.len(), USERS);
        assert!(counts.values().all(|&n| n == 1));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_and_touch() {
        let registry = ActivityRegistry::new();
        registry.record_activity("ana", t0());

        assert!(registry.remove_and_touch("ana"));
        assert!(!registry.remove_and_touch("ana"));
        assert!(!registry.remove_and_touch("nobody"));
    }

    #[test]
    fn test_validate_user_id() {
        assert_eq!(validate_user_id("  ana ").unwrap(), "ana");
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("   ").is_err());
    }
}
