use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::LinkCache;
use crate::config::StaticConfig;
use crate::services::{
    AnalyticsService, HttpFetcher, InMemoryObjectStore, LinkService, ObjectStore, SlugGenerator,
    UpstreamFetcher,
};
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub link_cache: LinkCache,
    pub link_service: Arc<LinkService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub fetcher: Arc<dyn UpstreamFetcher>,
    pub route_config: RouteConfig,
}

#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub redirect_prefix: String,
    pub admin_prefix: String,
    pub admin_token: String,
    pub health_prefix: String,
}

impl RouteConfig {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            redirect_prefix: config.redirector.route_prefix.clone(),
            admin_prefix: config.admin.route_prefix.clone(),
            admin_token: config.admin.token.clone(),
            health_prefix: config.health.route_prefix.clone(),
        }
    }
}

fn load_object_store(config: &StaticConfig) -> Result<Arc<dyn ObjectStore>> {
    let store = match config.object_store.seed_file.as_deref() {
        Some(path) if !path.is_empty() => InMemoryObjectStore::from_seed_file(path)
            .with_context(|| format!("Failed to load object seed file {}", path))?,
        _ => {
            debug!("No object seed file configured, starting with an empty object store");
            InMemoryObjectStore::new()
        }
    };
    Ok(Arc::new(store))
}

/// 准备服务器启动的上下文：存储（含迁移）、对象存储、服务与缓存
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let objects = load_object_store(config)?;

    let link_service = Arc::new(LinkService::new(
        storage.clone(),
        objects,
        SlugGenerator::from_config(&config.slug),
    ));
    let analytics_service = Arc::new(AnalyticsService::new(
        storage.clone(),
        config.analytics.max_buckets,
    ));

    let link_cache = LinkCache::new(storage.clone(), &config.cache);
    if !link_cache.is_enabled() {
        warn!("Link cache disabled, every redirect reads from storage");
    }

    let fetcher: Arc<dyn UpstreamFetcher> = Arc::new(HttpFetcher::new(&config.proxy));
    if !config.proxy.block_private_destinations {
        warn!("proxy.block_private_destinations is off: DirectDownload may reach internal hosts");
    }

    let route_config = RouteConfig::from_config(config);
    if route_config.admin_token.is_empty() {
        info!("Admin API is disabled (admin.token is empty)");
    } else {
        info!("Admin API available at: {}", route_config.admin_prefix);
    }

    debug!("Pre-startup processing completed in {:?}", start_time.elapsed());

    Ok(StartupContext {
        storage,
        link_cache,
        link_service,
        analytics_service,
        fetcher,
        route_config,
    })
}
