//! Fixed-window rate limiting shared by all handlers.

use dashmap::DashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of one check-and-consume call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests left in the current window (0 when exceeded).
    pub remaining: u32,
    /// Milliseconds until the current window ends.
    pub reset_in_ms: u64,
}

/// One counting window for a key.
#[derive(Debug)]
struct Window {
    start_ms: u64,
    count: u32,
}

/// Rate limiter using a fixed-window counter per key.
///
/// This is not a sliding window: a client can burst up to `2 × limit`
/// requests across a window boundary. State is process-local and best
/// effort; the check and the increment are atomic per key (the map entry
/// is locked for the duration of the call), so two concurrent requests
/// cannot both consume the last slot.
#[derive(Debug, Default)]
pub struct FixedWindowLimiter {
    /// Current window per key.
    windows: DashMap<String, Window>,
}

impl FixedWindowLimiter {
    /// Create a new rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Counts one request against `key` and reports whether it is allowed.
    ///
    /// On the first call for a key, or once the window has strictly
    /// elapsed, a new window starts with count 1 and the request is
    /// allowed. Otherwise the count is incremented and the request is
    /// allowed iff the post-increment count is within `limit`. Never
    /// fails; callers must stop before any costly work when `allowed`
    /// is false.
    pub fn check_and_consume(&self, key: &str, limit: u32, window_ms: u64) -> RateDecision {
        self.check_at(now_ms(), key, limit, window_ms)
    }

    fn check_at(&self, now: u64, key: &str, limit: u32, window_ms: u64) -> RateDecision {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert(Window { start_ms: now, count: 0 });
        let window = entry.value_mut();

        let elapsed = now.saturating_sub(window.start_ms);
        if elapsed > window_ms {
            window.start_ms = now;
            window.count = 1;
            return RateDecision {
                allowed: true,
                remaining: limit.saturating_sub(1),
                reset_in_ms: window_ms,
            };
        }

        window.count = window.count.saturating_add(1);
        RateDecision {
            allowed: window.count <= limit,
            remaining: limit.saturating_sub(window.count),
            reset_in_ms: window_ms.saturating_sub(elapsed),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
