//! Read-through cache for slug resolution.
//!
//! Links never change after creation, so a cached entry only goes stale
//! when its row is deleted out from under it; the redirect path evicts it
//! then. Misses are not cached: a slug may be created at any time.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::trace;

use crate::config::CacheConfig;
use crate::errors::Result;
use crate::storage::{SeaOrmStorage, TrackedLink};

#[derive(Clone)]
pub struct LinkCache {
    storage: Arc<SeaOrmStorage>,
    /// None when caching is disabled
    cache: Option<Cache<String, TrackedLink>>,
}

impl LinkCache {
    pub fn new(storage: Arc<SeaOrmStorage>, config: &CacheConfig) -> Self {
        let cache = config.enabled.then(|| {
            Cache::builder()
                .time_to_live(Duration::from_secs(config.ttl_secs))
                .max_capacity(config.max_capacity)
                .build()
        });
        Self { storage, cache }
    }

    /// A cache that always goes to storage.
    pub fn passthrough(storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            storage,
            cache: None,
        }
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    pub async fn resolve(&self, slug: &str) -> Result<Option<TrackedLink>> {
        let Some(cache) = &self.cache else {
            return self.storage.find_by_slug(slug).await;
        };

        if let Some(link) = cache.get(slug).await {
            trace!("Link cache hit: {}", slug);
            return Ok(Some(link));
        }

        let found = self.storage.find_by_slug(slug).await?;
        if let Some(link) = &found {
            cache.insert(slug.to_string(), link.clone()).await;
        }
        Ok(found)
    }

    /// 删除缓存中的 slug（链接行已不存在）
    pub async fn invalidate(&self, slug: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(slug).await;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.as_ref().map_or(0, |c| c.entry_count())
    }
}
