//! Observer analytics endpoints: `/observers/{type}/{id}/...`

use actix_web::{Responder, web};
use std::sync::Arc;
use tracing::debug;

use crate::services::{AnalyticsService, ObserverQueries, parse_date};

use super::helpers::{api_result, error_from_tracker, hit_filter, observer_from_path};
use super::types::{ActivityQuery, DestinationsQuery, HitRangeQuery};

type ObserverPath = web::Path<(String, i64)>;

/// 解析路径中的 observer，失败时直接返回错误响应
macro_rules! observed {
    ($path:expr, $analytics:expr) => {{
        let (entity_type, id) = $path.into_inner();
        match observer_from_path(entity_type, id) {
            Ok(observer) => $analytics.observe(observer),
            Err(e) => return error_from_tracker(&e),
        }
    }};
}

pub async fn summary(
    path: ObserverPath,
    query: web::Query<HitRangeQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> impl Responder {
    let observed = observed!(path, analytics);
    let filter = match hit_filter(&query) {
        Ok(f) => f,
        Err(e) => return error_from_tracker(&e),
    };
    debug!("Admin API: summary for {}", observed.observer());
    api_result(
        analytics
            .summary(observed.observer(), filter.as_ref())
            .await,
    )
}

pub async fn links(
    path: ObserverPath,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> impl Responder {
    let observed = observed!(path, analytics);
    api_result(observed.links().await)
}

pub async fn clicks(
    path: ObserverPath,
    query: web::Query<HitRangeQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> impl Responder {
    let observed = observed!(path, analytics);
    match hit_filter(&query) {
        Ok(filter) => api_result(observed.clicks(filter).await),
        Err(e) => error_from_tracker(&e),
    }
}

pub async fn activity(
    path: ObserverPath,
    query: web::Query<ActivityQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> impl Responder {
    let observed = observed!(path, analytics);
    let range = parse_date(&query.start).and_then(|s| Ok((s, parse_date(&query.end)?)));
    match range {
        Ok((start, end)) => api_result(
            observed
                .activity_over_time(start, end, query.increment)
                .await,
        ),
        Err(e) => error_from_tracker(&e),
    }
}

pub async fn sources(
    path: ObserverPath,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> impl Responder {
    let observed = observed!(path, analytics);
    api_result(observed.hits_by_source().await)
}

pub async fn destinations(
    path: ObserverPath,
    query: web::Query<DestinationsQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> impl Responder {
    let observed = observed!(path, analytics);
    api_result(observed.clicks_by_destination(query.limit).await)
}
