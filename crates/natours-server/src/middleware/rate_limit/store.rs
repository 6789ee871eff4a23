//! Rate limit storage backends.

use super::types::{RateLimitPolicy, RateLimitState};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Trait for rate limit storage.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count a request for `key` and report whether it is allowed.
    async fn check_and_consume(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitResult;

    /// Get current state for a key.
    async fn get_state(&self, key: &str) -> Option<RateLimitState>;

    /// Drop windows that have elapsed. Returns how many were removed.
    async fn purge_expired(&self, window: Duration) -> usize;
}

/// Result of rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Instant,
    pub retry_after: Option<Duration>,
}

impl RateLimitResult {
    /// Seconds until the window resets, rounded up.
    pub fn reset_in_secs(&self) -> u64 {
        let left = self.reset_at.saturating_duration_since(Instant::now());
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }
}

/// In-memory rate limit store. Entries are locked per shard, so concurrent
/// clients do not contend on one lock.
pub struct InMemoryStore {
    states: DashMap<String, RateLimitState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Count a request at an explicit instant.
    pub fn check_at(&self, key: &str, policy: &RateLimitPolicy, now: Instant) -> RateLimitResult {
        let mut entry = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| RateLimitState::new(now));

        let state = entry.value_mut();
        let count = state.hit(now, policy.window);
        let allowed = count <= policy.max_requests;
        let reset_at = state.reset_at(policy.window);

        RateLimitResult {
            allowed,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(count),
            reset_at,
            retry_after: if allowed {
                None
            } else {
                Some(reset_at.saturating_duration_since(now))
            },
        }
    }

    pub fn purge_expired_at(&self, window: Duration, now: Instant) -> usize {
        let before = self.states.len();
        self.states.retain(|_, state| !state.is_expired(now, window));
        before.saturating_sub(self.states.len())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryStore {
    async fn check_and_consume(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitResult {
        self.check_at(key, policy, Instant::now())
    }

    async fn get_state(&self, key: &str) -> Option<RateLimitState> {
        self.states.get(key).map(|entry| entry.value().clone())
    }

    async fn purge_expired(&self, window: Duration) -> usize {
        self.purge_expired_at(window, Instant::now())
    }
}
