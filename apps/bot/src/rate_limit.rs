use std::collections::VecDeque;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// How often idle users are swept out of the limiter.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Per-user sliding-window admission.
///
/// Each user keeps the instants of their recent admitted requests. A request
/// is admitted while fewer than `max_requests` of those fall inside the
/// trailing window. The `DashMap` entry guard holds the shard lock for the
/// whole prune-check-push, so concurrent updates from one user cannot both
/// take the last slot.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: DashMap<i64, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: DashMap::new(),
        }
    }

    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, DEFAULT_WINDOW)
    }

    /// Returns `true` and records the request if the user is under the limit.
    pub fn allow(&self, user_id: i64) -> bool {
        let now = Instant::now();
        let mut history = self.requests.entry(user_id).or_default();

        while let Some(&oldest) = history.front() {
            if now.duration_since(oldest) >= self.window {
                history.pop_front();
            } else {
                break;
            }
        }

        if history.len() >= self.max_requests {
            return false;
        }

        history.push_back(now);
        true
    }

    /// Drops expired instants and forgets users with none left.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let initial_size = self.requests.len();
        self.requests.retain(|_, history| {
            history.retain(|&at| now.duration_since(at) < self.window);
            !history.is_empty()
        });
        let final_size = self.requests.len();
        if final_size < initial_size {
            debug!(
                initial_size,
                final_size,
                removed = initial_size - final_size,
                "Cleaned up idle rate limit entries"
            );
        }
    }
}
