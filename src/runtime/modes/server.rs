//! Server mode
//!
//! Wires storage, services and routes into an actix-web server and runs it
//! until it stops or Ctrl+C arrives.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::{AppStartTime, RedirectState, admin_scope, health_routes, redirect_routes};
use crate::cache::LinkCache;
use crate::config::StaticConfig;
use crate::runtime::lifetime::{self, startup::RouteConfig, startup::StartupContext};
use crate::services::{AnalyticsService, LinkService, UpstreamFetcher};
use crate::storage::SeaOrmStorage;

/// Request body limit for the admin API (scanned content included)
const PAYLOAD_LIMIT: usize = 2 * 1024 * 1024;

/// Shared handles registered as app data on every worker
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<SeaOrmStorage>,
    pub link_cache: LinkCache,
    pub link_service: Arc<LinkService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub redirect: web::Data<RedirectState>,
    pub routes: RouteConfig,
    pub start_time: AppStartTime,
}

impl AppState {
    pub fn new(
        startup: StartupContext,
        trusted_proxies: Vec<String>,
        start_time: AppStartTime,
    ) -> Self {
        let redirect = web::Data::new(RedirectState::new(
            startup.link_cache.clone(),
            startup.fetcher,
            trusted_proxies,
        ));
        Self {
            storage: startup.storage,
            link_cache: startup.link_cache,
            link_service: startup.link_service,
            analytics_service: startup.analytics_service,
            redirect,
            routes: startup.route_config,
            start_time,
        }
    }

    /// Assemble state by hand, e.g. with a fake fetcher in tests.
    pub fn from_parts(
        storage: Arc<SeaOrmStorage>,
        link_service: Arc<LinkService>,
        analytics_service: Arc<AnalyticsService>,
        link_cache: LinkCache,
        fetcher: Arc<dyn UpstreamFetcher>,
        routes: RouteConfig,
        trusted_proxies: Vec<String>,
    ) -> Self {
        Self::new(
            StartupContext {
                storage,
                link_cache,
                link_service,
                analytics_service,
                fetcher,
                route_config: routes,
            },
            trusted_proxies,
            AppStartTime::now(),
        )
    }
}

/// Register app data and every route scope.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state.storage.clone()))
            .app_data(web::Data::new(state.link_cache.clone()))
            .app_data(web::Data::new(state.link_service.clone()))
            .app_data(web::Data::new(state.analytics_service.clone()))
            .app_data(web::Data::new(state.start_time.clone()))
            .app_data(state.redirect.clone())
            .app_data(web::JsonConfig::default().limit(PAYLOAD_LIMIT))
            .configure(admin_scope(
                &state.routes.admin_prefix,
                &state.routes.admin_token,
            ))
            .service(health_routes(&state.routes.health_prefix))
            .service(redirect_routes(&state.routes.redirect_prefix));
    }
}

/// Run the HTTP server
///
/// **Note**: logging must be initialized before calling this function
pub async fn run_server(config: Arc<StaticConfig>) -> Result<()> {
    let start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    let db_for_shutdown = startup.storage.get_db().clone();
    let trusted_proxies = config.server.trusted_proxies.clone();
    if trusted_proxies.is_empty() {
        info!("No trusted proxies configured, hits record the TCP peer address");
    } else {
        info!("Trusted proxies: {:?}", trusted_proxies);
    }

    let state = AppState::new(startup, trusted_proxies, start_time);

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} worker threads", cpu_count);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .configure(configure_app(state.clone()))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tokio::select! {
        res = server => {
            res.context("HTTP server error")?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(&db_for_shutdown) => {
            warn!("Graceful shutdown completed");
        }
    }

    Ok(())
}
