//! 链接创建与查询端点

use actix_web::{Responder, web};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::config::get_config;
use crate::errors::LinkTrackerError;
use crate::services::{LinkService, ScanRequest};
use crate::storage::NewTrackedLink;

use super::helpers::{created_response, error_from_tracker, success_response};
use super::types::{LinkDetailsResponse, LinkResponse, PostNewLink, ScanContentRequest, ScanResponse};

/// POST /links
pub async fn post_link(
    body: web::Json<PostNewLink>,
    links: web::Data<Arc<LinkService>>,
) -> impl Responder {
    let body = body.into_inner();
    info!(
        "Admin API: create link request - destination: {}, source: {}",
        body.destination, body.source
    );

    let mut request = NewTrackedLink::new(body.destination, body.source)
        .with_type(body.link_type.unwrap_or_default())
        .with_observer(body.observer);
    request.slug = body.slug;

    match links.create_link(request).await {
        Ok(link) => {
            let prefix = get_config().tracking_url_prefix();
            created_response(LinkResponse::new(link, &prefix))
        }
        Err(e) => error_from_tracker(&e),
    }
}

/// POST /links/scan
pub async fn scan_content(
    body: web::Json<ScanContentRequest>,
    links: web::Data<Arc<LinkService>>,
) -> impl Responder {
    let body = body.into_inner();
    let tracking_prefix = get_config().tracking_url_prefix();

    let base_url = match body.base_url.as_deref().map(Url::parse).transpose() {
        Ok(url) => url,
        Err(e) => {
            return error_from_tracker(&LinkTrackerError::validation(format!(
                "Invalid base_url: {}",
                e
            )));
        }
    };

    let request = ScanRequest {
        content: body.content,
        source: body.source,
        url_prefix: body.url_prefix.unwrap_or_else(|| tracking_prefix.clone()),
        observer: body.observer,
        base_url,
    };

    match links.create_from_content(request).await {
        Ok(outcome) => {
            info!("Admin API: scanned content, {} links created", outcome.links.len());
            created_response(ScanResponse {
                content: outcome.content,
                links: outcome
                    .links
                    .into_iter()
                    .map(|link| LinkResponse::new(link, &tracking_prefix))
                    .collect(),
            })
        }
        Err(e) => error_from_tracker(&e),
    }
}

/// GET /links/{slug}
pub async fn get_link(
    slug: web::Path<String>,
    links: web::Data<Arc<LinkService>>,
) -> impl Responder {
    match links.link_details(&slug).await {
        Ok(details) => {
            let prefix = get_config().tracking_url_prefix();
            success_response(LinkDetailsResponse::new(details, &prefix))
        }
        Err(e) => error_from_tracker(&e),
    }
}
