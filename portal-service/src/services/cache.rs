//! Best-effort cache in front of the relational store.
//!
//! Every operation degrades silently: an unreachable or slow cache reads as
//! a miss and writes as a no-op, so callers always fall through to the
//! source of truth and never branch on cache availability. Values are
//! wrapped in a versioned envelope so the stored format can evolve without
//! a new key namespace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache key namespace for derived views.
pub mod keys {
    pub const AVAILABLE_PROPERTIES: &str = "views:properties:available";
    pub const ADMIN_OVERVIEW: &str = "views:admin:overview";
}

const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    v: u32,
    cached_utc: DateTime<Utc>,
    data: serde_json::Value,
}

impl CacheEnvelope {
    fn wrap(data: serde_json::Value) -> Self {
        Self {
            v: ENVELOPE_VERSION,
            cached_utc: Utc::now(),
            data,
        }
    }
}

fn seal(value: &serde_json::Value) -> Option<String> {
    serde_json::to_string(&CacheEnvelope::wrap(value.clone())).ok()
}

fn unseal(raw: &str) -> Option<serde_json::Value> {
    let envelope: CacheEnvelope = serde_json::from_str(raw).ok()?;
    // Entries written by a format this build does not understand are misses.
    if envelope.v != ENVELOPE_VERSION {
        return None;
    }
    Some(envelope.data)
}

/// Capability interface for the view cache. `RedisCache` talks to a real
/// service; `NullCache` stands in when none is configured; `MemoryCache`
/// backs tests.
#[async_trait]
pub trait ViewCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<serde_json::Value>;
    async fn set(&self, key: &str, value: &serde_json::Value, ttl_secs: u64);
    async fn invalidate(&self, keys: &[&str]);
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCache {
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self, anyhow::Error> {
        tracing::info!("Connecting to cache service");
        let client = Client::open(url)?;

        // ConnectionManager reconnects on its own after transient drops.
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to cache service");
            anyhow::anyhow!("Failed to connect to cache service: {}", e)
        })?;

        tracing::info!("Cache service connected");

        Ok(Self {
            manager,
            op_timeout,
        })
    }
}

#[async_trait]
impl ViewCache for RedisCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut conn = self.manager.clone();
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        let fetch = cmd.query_async::<_, Option<String>>(&mut conn);

        match tokio::time::timeout(self.op_timeout, fetch).await {
            Ok(Ok(Some(raw))) => unseal(&raw),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                tracing::warn!(key, error = %e, "Cache read failed; treating as miss");
                None
            }
            Err(_) => {
                tracing::warn!(key, "Cache read timed out; treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &serde_json::Value, ttl_secs: u64) {
        let Some(sealed) = seal(value) else {
            return;
        };
        let mut conn = self.manager.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(sealed).arg("EX").arg(ttl_secs);
        let store = cmd.query_async::<_, ()>(&mut conn);

        match tokio::time::timeout(self.op_timeout, store).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(key, error = %e, "Cache write failed; skipped"),
            Err(_) => tracing::warn!(key, "Cache write timed out; skipped"),
        }
    }

    async fn invalidate(&self, keys: &[&str]) {
        if keys.is_empty() {
            return;
        }
        let mut conn = self.manager.clone();
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(*key);
        }
        let drop_keys = cmd.query_async::<_, ()>(&mut conn);

        match tokio::time::timeout(self.op_timeout, drop_keys).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(?keys, error = %e, "Cache invalidation failed"),
            Err(_) => tracing::warn!(?keys, "Cache invalidation timed out"),
        }
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let cmd = redis::cmd("PING");
        let ping = cmd.query_async::<_, ()>(&mut conn);
        tokio::time::timeout(self.op_timeout, ping)
            .await
            .map_err(|_| anyhow::anyhow!("Cache health check timed out"))?
            .map_err(|e| anyhow::anyhow!("Cache health check failed: {}", e))
    }
}

/// No-op cache selected at startup when no cache URL is configured: every
/// read misses, every write vanishes.
pub struct NullCache;

#[async_trait]
impl ViewCache for NullCache {
    async fn get(&self, _key: &str) -> Option<serde_json::Value> {
        None
    }

    async fn set(&self, _key: &str, _value: &serde_json::Value, _ttl_secs: u64) {}

    async fn invalidate(&self, _keys: &[&str]) {}

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

/// In-memory cache for tests, honoring TTLs.
#[derive(Default)]
pub struct MemoryCache {
    entries: std::sync::Mutex<std::collections::HashMap<String, (std::time::Instant, String)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ViewCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entries = self.entries.lock().ok()?;
        let (deadline, raw) = entries.get(key)?;
        if *deadline <= std::time::Instant::now() {
            return None;
        }
        unseal(raw)
    }

    async fn set(&self, key: &str, value: &serde_json::Value, ttl_secs: u64) {
        let Some(sealed) = seal(value) else {
            return;
        };
        if let Ok(mut entries) = self.entries.lock() {
            let deadline = std::time::Instant::now() + Duration::from_secs(ttl_secs);
            entries.insert(key.to_string(), (deadline, sealed));
        }
    }

    async fn invalidate(&self, keys: &[&str]) {
        if let Ok(mut entries) = self.entries.lock() {
            for key in keys {
                entries.remove(*key);
            }
        }
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_cache_round_trips_through_envelope() {
        let cache = MemoryCache::new();
        let value = json!({"count": 3});

        cache.set("views:test", &value, 60).await;
        assert_eq!(cache.get("views:test").await, Some(value));
    }

    #[tokio::test]
    async fn invalidation_removes_listed_keys_only() {
        let cache = MemoryCache::new();
        cache.set("a", &json!(1), 60).await;
        cache.set("b", &json!(2), 60).await;

        cache.invalidate(&["a"]).await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn expired_entries_read_as_misses() {
        let cache = MemoryCache::new();
        cache.set("a", &json!(1), 0).await;
        assert_eq!(cache.get("a").await, None);
    }

    #[tokio::test]
    async fn null_cache_always_misses() {
        let cache = NullCache;
        cache.set("a", &json!(1), 60).await;
        assert_eq!(cache.get("a").await, None);
        assert!(cache.health_check().await.is_ok());
    }

    #[test]
    fn unknown_envelope_version_is_a_miss() {
        let raw = r#"{"v": 99, "cached_utc": "2026-01-01T00:00:00Z", "data": {"x": 1}}"#;
        assert_eq!(unseal(raw), None);

        let raw = r#"{"v": 1, "cached_utc": "2026-01-01T00:00:00Z", "data": {"x": 1}}"#;
        assert_eq!(unseal(raw), Some(json!({"x": 1})));
    }

    #[test]
    fn garbage_payload_is_a_miss() {
        assert_eq!(unseal("not json at all"), None);
        assert_eq!(unseal(r#"{"unexpected": "shape"}"#), None);
    }
}
