//! Rate limiting types.

use crate::config::RateLimitConfig;
use std::time::{Duration, Instant};

/// Runtime rate limit policy.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Maximum requests allowed per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
    /// Only paths equal to or below this prefix are counted.
    pub path_prefix: String,
    /// Message of the 429 response.
    pub message: String,
    /// Key extraction strategy.
    pub key_strategy: KeyStrategy,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let defaults = RateLimitConfig::default();
        Self {
            max_requests,
            window,
            path_prefix: defaults.path_prefix,
            message: defaults.message,
            key_strategy: KeyStrategy::PeerIp,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            path_prefix: config.path_prefix.clone(),
            message: config.message.clone(),
            key_strategy: if config.trust_proxy {
                KeyStrategy::ForwardedFor
            } else {
                KeyStrategy::PeerIp
            },
        }
    }

    /// Whether `path` falls under the limited prefix.
    pub fn applies_to(&self, path: &str) -> bool {
        let prefix = self.path_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Strategy for extracting the client id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Peer socket address.
    PeerIp,
    /// First `X-Forwarded-For` hop, falling back to the peer address.
    ForwardedFor,
}

/// Window state for one client.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    /// Requests seen in the current window.
    pub count: u32,
    /// When the current window opened.
    pub window_start: Instant,
}

impl RateLimitState {
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    /// Count one request at `now`, opening a fresh window when the current
    /// one has elapsed. Returns the count including this request.
    pub fn hit(&mut self, now: Instant, window: Duration) -> u32 {
        if self.is_expired(now, window) {
            self.count = 0;
            self.window_start = now;
        }
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    pub fn reset_at(&self, window: Duration) -> Instant {
        self.window_start + window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let policy = RateLimitPolicy::new(100, Duration::from_secs(3600));
        assert!(policy.applies_to("/api"));
        assert!(policy.applies_to("/api/v1/tours"));
        assert!(!policy.applies_to("/apiary"));
        assert!(!policy.applies_to("/tour/the-forest-hiker"));
    }

    #[test]
    fn test_window_resets_after_elapsed() {
        let window = Duration::from_secs(3600);
        let start = Instant::now();
        let mut state = RateLimitState::new(start);

        assert_eq!(state.hit(start, window), 1);
        assert_eq!(state.hit(start + Duration::from_secs(10), window), 2);
        assert_eq!(state.hit(start + window, window), 1);
        assert_eq!(state.window_start, start + window);
    }
}
