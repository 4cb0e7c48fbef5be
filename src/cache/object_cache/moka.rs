//! 进程内缓存
//!
//! 每个条目带自己的 TTL：登录用户按 `cache.default_ttl` 缓存，
//! 调用方也可以为单条数据指定更短的过期时间。

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("moka", MokaObjectCache);

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    // 覆盖写入时重新计时
    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

pub struct MokaObjectCache {
    inner: Cache<String, Entry>,
    default_ttl: Duration,
}

impl MokaObjectCache {
    pub async fn new() -> Result<Self, String> {
        let config = &AppConfig::get().cache;
        Self::with_limits(config.memory.max_capacity, config.default_ttl)
    }

    fn with_limits(max_capacity: u64, default_ttl: u64) -> Result<Self, String> {
        if default_ttl == 0 {
            return Err("cache.default_ttl must be greater than 0".to_string());
        }
        debug!(
            "MokaObjectCache capacity: {}, default TTL: {}s",
            max_capacity, default_ttl
        );
        Ok(Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryTtl)
                .build(),
            default_ttl: Duration::from_secs(default_ttl),
        })
    }
}

#[async_trait]
impl ObjectCache for MokaObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        match self.inner.get(key).await {
            Some(entry) => CacheResult::Found(entry.value),
            None => CacheResult::NotFound,
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let ttl = match ttl {
            0 => self.default_ttl,
            secs => Duration::from_secs(secs),
        };
        self.inner.insert(key, Entry { value, ttl }).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_is_rejected() {
        assert!(MokaObjectCache::with_limits(10, 0).is_err());
    }

    #[tokio::test]
    async fn test_short_entry_expires_first() {
        let cache = MokaObjectCache::with_limits(100, 300).unwrap();
        cache.insert_raw("user:a".to_string(), "a".to_string(), 1).await;
        cache.insert_raw("user:b".to_string(), "b".to_string(), 0).await;

        tokio::time::sleep(Duration::from_millis(1_200)).await;
        assert_eq!(cache.get_raw("user:a").await, CacheResult::NotFound);
        assert_eq!(cache.get_raw("user:b").await, CacheResult::Found("b".to_string()));

        cache.remove("user:b").await;
        assert_eq!(cache.get_raw("user:b").await, CacheResult::NotFound);
    }
}
