//! Sliding-window abuse throttle with escalating block periods.
//!
//! Keys are composite strings scoping a purpose to one or more identifying
//! dimensions (`login:id:IP-XXXX`, `login:ip:203.0.113.7`, ...). Callers
//! guarding an operation along several dimensions consume every key and
//! proceed only if all allow. State lives in a sharded concurrent map owned
//! by this instance; a fresh process starts with no memory of prior abuse.

use dashmap::DashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Window/attempt/block settings for one endpoint class.
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    pub window_ms: u64,
    pub max_attempts: u32,
    pub block_ms: u64,
}

impl WindowConfig {
    pub fn from_seconds(window_seconds: u64, max_attempts: u32, block_seconds: u64) -> Self {
        Self {
            window_ms: window_seconds * 1000,
            max_attempts,
            block_ms: block_seconds * 1000,
        }
    }
}

/// Outcome of a consumption attempt. Never an error: abuse throttling is a
/// boolean decision plus a retry hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub retry_after_secs: u64,
}

impl Decision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            retry_after_secs: 0,
        }
    }

    fn denied(retry_after_secs: u64) -> Self {
        Self {
            allowed: false,
            retry_after_secs,
        }
    }
}

#[derive(Debug)]
struct WindowEntry {
    window_started_at: u64,
    attempts: u32,
    blocked_until: u64,
}

/// Keyed sliding-window limiter. Per-key read-modify-write runs under the
/// map's entry guard, so two concurrent attempts on one key cannot both
/// observe "under limit" and slip past the threshold.
#[derive(Debug, Default)]
pub struct SlidingWindowLimiter {
    entries: DashMap<String, WindowEntry>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Consume one attempt for `key`. Blocked keys are rejected outright;
    /// exceeding `max_attempts` within the window starts a block of
    /// `block_ms`, which outlasts the probing window itself.
    pub fn consume(&self, key: &str, cfg: &WindowConfig) -> Decision {
        self.consume_at(key, cfg, now_ms())
    }

    /// Consume every key; the caller may proceed only if all allow. All keys
    /// are charged even when an earlier one denies, so a partially blocked
    /// caller keeps paying on the remaining dimensions.
    pub fn consume_many(&self, keys: &[&str], cfg: &WindowConfig) -> Decision {
        let mut retry_after = 0u64;
        let mut allowed = true;
        for key in keys {
            let decision = self.consume(key, cfg);
            if !decision.allowed {
                allowed = false;
                retry_after = retry_after.max(decision.retry_after_secs);
            }
        }
        if allowed {
            Decision::allowed()
        } else {
            Decision::denied(retry_after)
        }
    }

    /// Forget `key` entirely. Called after the guarded operation succeeds so
    /// legitimate later attempts start from a fresh window.
    pub fn reset(&self, key: &str) {
        self.entries.remove(key);
    }

    fn consume_at(&self, key: &str, cfg: &WindowConfig, now: u64) -> Decision {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry {
                window_started_at: now,
                attempts: 0,
                blocked_until: 0,
            });

        if now < entry.blocked_until {
            return Decision::denied(ceil_secs(entry.blocked_until - now));
        }

        if now.saturating_sub(entry.window_started_at) >= cfg.window_ms {
            entry.window_started_at = now;
            entry.attempts = 0;
        }

        entry.attempts += 1;

        if entry.attempts > cfg.max_attempts {
            entry.blocked_until = now + cfg.block_ms;
            return Decision::denied(ceil_secs(cfg.block_ms));
        }

        Decision::allowed()
    }
}

fn ceil_secs(ms: u64) -> u64 {
    (ms + 999) / 1000
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
