//! Cache backends

use chrono::{DateTime, Duration, Utc};
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::keys::prefix_pattern;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL; `None` selects the disabled backend
    pub redis_url: Option<String>,
    /// TTL applied when the caller does not pass one
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            default_ttl_secs: 3600,
        }
    }
}

enum Backend {
    Redis(redis::aio::ConnectionManager),
    Memory(RwLock<HashMap<String, (String, Option<DateTime<Utc>>)>>),
    Disabled,
}

/// JSON cache for GET responses
///
/// All operations are infallible from the handler's point of view in
/// disabled mode: reads miss, writes vanish.
pub struct ResponseCache {
    backend: Backend,
    default_ttl_secs: u64,
}

impl ResponseCache {
    /// Connects the configured backend
    ///
    /// With no Redis URL the cache comes up disabled rather than failing the
    /// process; the platform runs fine without it, just slower.
    pub async fn connect(config: CacheConfig) -> Result<Arc<Self>, CacheError> {
        let backend = match &config.redis_url {
            Some(url) => {
                let client = redis::Client::open(url.as_str())
                    .map_err(|e| CacheError::Connection(e.to_string()))?;
                let manager = client.get_connection_manager().await?;
                info!("Redis cache connected");
                Backend::Redis(manager)
            }
            None => {
                warn!("No REDIS_URL configured, response cache disabled");
                Backend::Disabled
            }
        };
        Ok(Arc::new(Self {
            backend,
            default_ttl_secs: config.default_ttl_secs,
        }))
    }

    /// In-process cache for development and tests
    pub fn in_memory(default_ttl_secs: u64) -> Arc<Self> {
        Arc::new(Self {
            backend: Backend::Memory(RwLock::new(HashMap::new())),
            default_ttl_secs,
        })
    }

    /// Disabled cache; every operation is a no-op
    pub fn disabled() -> Arc<Self> {
        Arc::new(Self {
            backend: Backend::Disabled,
            default_ttl_secs: 0,
        })
    }

    /// True when a real backend is active
    pub fn is_enabled(&self) -> bool {
        !matches!(self.backend, Backend::Disabled)
    }

    /// Reads and deserializes a cached value
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let json = match &self.backend {
            Backend::Redis(manager) => {
                let mut conn = manager.clone();
                conn.get::<_, Option<String>>(key).await?
            }
            Backend::Memory(store) => {
                let store = store.read().await;
                match store.get(key) {
                    Some((json, expires_at)) if !is_expired(*expires_at) => Some(json.clone()),
                    _ => None,
                }
            }
            Backend::Disabled => None,
        };

        match json {
            Some(json) => {
                debug!(key, "Cache hit");
                let value =
                    serde_json::from_str(&json).map_err(|e| CacheError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => {
                debug!(key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Serializes and stores a value with a TTL
    pub async fn put<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> Result<(), CacheError> {
        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        let json =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;

        match &self.backend {
            Backend::Redis(manager) => {
                let mut conn = manager.clone();
                conn.set_ex::<_, _, ()>(key, json, ttl).await?;
            }
            Backend::Memory(store) => {
                let expires_at = (ttl > 0).then(|| Utc::now() + Duration::seconds(ttl as i64));
                store.write().await.insert(key.to_string(), (json, expires_at));
            }
            Backend::Disabled => {}
        }
        Ok(())
    }

    /// Deletes one key
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match &self.backend {
            Backend::Redis(manager) => {
                let mut conn = manager.clone();
                conn.del::<_, ()>(key).await?;
            }
            Backend::Memory(store) => {
                store.write().await.remove(key);
            }
            Backend::Disabled => {}
        }
        Ok(())
    }

    /// Deletes every key under a prefix (SCAN + pipelined DEL on Redis)
    pub async fn invalidate_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let pattern = prefix_pattern(prefix);
        match &self.backend {
            Backend::Redis(manager) => {
                let keys = {
                    let mut conn = manager.clone();
                    let mut iter = conn.scan_match::<_, String>(&pattern).await?;
                    let mut keys = Vec::new();
                    while let Some(key) = iter.next_item().await {
                        keys.push(key);
                    }
                    keys
                };
                if keys.is_empty() {
                    return Ok(0);
                }
                let mut pipe = redis::pipe();
                for key in &keys {
                    pipe.del(key).ignore();
                }
                let mut conn = manager.clone();
                pipe.query_async::<()>(&mut conn).await?;
                debug!(pattern, removed = keys.len(), "Cleared cache prefix");
                Ok(keys.len() as u64)
            }
            Backend::Memory(store) => {
                let mut store = store.write().await;
                let before = store.len();
                store.retain(|key, _| !key.starts_with(&format!("{prefix}_")));
                Ok((before - store.len()) as u64)
            }
            Backend::Disabled => Ok(0),
        }
    }
}

fn is_expired(expires_at: Option<DateTime<Utc>>) -> bool {
    match expires_at {
        Some(expiry) => Utc::now() > expiry,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let cache = ResponseCache::in_memory(3600);

        cache
            .put("traffic_reports_/api/v1/traffic/reports", &json!({"total": 3}), None)
            .await
            .unwrap();

        let hit: Option<serde_json::Value> =
            cache.get("traffic_reports_/api/v1/traffic/reports").await.unwrap();
        assert_eq!(hit.unwrap()["total"], 3);
    }

    #[tokio::test]
    async fn test_memory_cache_expiry() {
        let cache = ResponseCache::in_memory(3600);
        cache.put("k", &json!(1), Some(0)).await.unwrap();

        // TTL of zero stores without expiry (matches Redis SET without EX)
        let hit: Option<serde_json::Value> = cache.get("k").await.unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn test_memory_prefix_invalidation() {
        let cache = ResponseCache::in_memory(3600);
        cache.put("traffic_reports_/a", &json!(1), None).await.unwrap();
        cache.put("traffic_reports_/b", &json!(2), None).await.unwrap();
        cache.put("claims_/c", &json!(3), None).await.unwrap();

        let removed = cache.invalidate_prefix("traffic_reports").await.unwrap();
        assert_eq!(removed, 2);

        let kept: Option<serde_json::Value> = cache.get("claims_/c").await.unwrap();
        assert!(kept.is_some());
    }

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let cache = ResponseCache::disabled();
        assert!(!cache.is_enabled());

        cache.put("k", &json!(1), None).await.unwrap();
        let hit: Option<serde_json::Value> = cache.get("k").await.unwrap();
        assert!(hit.is_none());
        assert_eq!(cache.invalidate_prefix("k").await.unwrap(), 0);
    }
}
