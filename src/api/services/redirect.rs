use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use crate::cache::LinkCache;
use crate::errors::LinkTrackerError;
use crate::services::UpstreamFetcher;
use crate::services::slug::is_valid_slug;
use crate::storage::{LinkType, TrackedLink};
use crate::utils::ip::client_address;

/// Everything the redirect endpoint needs per request
pub struct RedirectState {
    pub links: LinkCache,
    pub fetcher: Arc<dyn UpstreamFetcher>,
    pub trusted_proxies: Vec<String>,
}

impl RedirectState {
    pub fn new(
        links: LinkCache,
        fetcher: Arc<dyn UpstreamFetcher>,
        trusted_proxies: Vec<String>,
    ) -> Self {
        Self {
            links,
            fetcher,
            trusted_proxies,
        }
    }
}

pub struct RedirectService;

impl RedirectService {
    /// 解析 slug，记录一次 hit，然后按链接类型跳转或代理下载
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        state: web::Data<RedirectState>,
    ) -> impl Responder {
        let slug = path.into_inner();

        if !is_valid_slug(&slug) {
            trace!("Rejected malformed slug: {:?}", slug);
            return Self::not_found_response();
        }

        let link = match state.links.resolve(&slug).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                debug!("Redirect link not found: {}", slug);
                return Self::not_found_response();
            }
            Err(e) => {
                error!("Failed to resolve slug '{}': {}", slug, e);
                return Self::error_response();
            }
        };

        let remote_address = client_address(&req, &state.trusted_proxies);
        // hit 必须在响应之前落库
        match state
            .links
            .storage()
            .record_hit(link.id, &remote_address, Utc::now())
            .await
        {
            Ok(_) => {}
            Err(LinkTrackerError::NotFound(_)) => {
                debug!("Link '{}' was deleted after it was resolved", slug);
                state.links.invalidate(&slug).await;
                return Self::not_found_response();
            }
            Err(e) => {
                error!("Failed to record hit for '{}': {}", slug, e);
                return Self::error_response();
            }
        }

        Self::dispatch(&state, link).await
    }

    async fn dispatch(state: &RedirectState, link: TrackedLink) -> HttpResponse {
        match link.link_type {
            LinkType::Redirect => {
                trace!("Redirecting {} -> {}", link.slug, link.destination);
                HttpResponse::Found()
                    .insert_header((LOCATION, link.destination))
                    .insert_header((CACHE_CONTROL, "no-store"))
                    .finish()
            }
            LinkType::DirectDownload => match state.fetcher.fetch(&link.destination).await {
                Ok(payload) => {
                    trace!(
                        "Proxied {} ({} bytes) for {}",
                        link.destination,
                        payload.body.len(),
                        link.slug
                    );
                    HttpResponse::Ok()
                        .insert_header((CONTENT_TYPE, payload.content_type_or_default()))
                        .insert_header((CACHE_CONTROL, "no-store"))
                        .body(payload.body)
                }
                Err(e) => {
                    warn!("Upstream fetch for '{}' failed: {}", link.slug, e);
                    Self::not_found_response()
                }
            },
        }
    }

    async fn missing_slug() -> impl Responder {
        Self::not_found_response()
    }

    fn not_found_response() -> HttpResponse {
        HttpResponse::NotFound()
            .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
            .insert_header((CACHE_CONTROL, "no-store"))
            .body("Not Found")
    }

    fn error_response() -> HttpResponse {
        HttpResponse::InternalServerError()
            .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
            .body("Internal Server Error")
    }
}

/// 跳转路由，挂载在 `prefix` 下
///
/// - GET {prefix} 和 {prefix}/ 返回 404
/// - GET {prefix}/{slug} 解析并跳转
pub fn redirect_routes(prefix: &str) -> actix_web::Scope {
    web::scope(prefix)
        .route("", web::get().to(RedirectService::missing_slug))
        .route("/", web::get().to(RedirectService::missing_slug))
        .route("/{slug}", web::get().to(RedirectService::handle_redirect))
}
