//! Admin API 路由配置

use actix_web::web;

use super::links::{get_link, post_link, scan_content};
use super::observers;

/// 链接路由 `/links`
///
/// - POST /links - 创建链接
/// - POST /links/scan - 扫描并改写内容
/// - GET /links/{slug} - 链接详情
pub fn links_routes() -> actix_web::Scope {
    web::scope("/links")
        .route("", web::post().to(post_link))
        // 必须在 /{slug} 之前
        .route("/scan", web::post().to(scan_content))
        .route("/{slug}", web::get().to(get_link))
}

/// Observer 分析路由 `/observers/{type}/{id}`
pub fn observers_routes() -> actix_web::Scope {
    web::scope("/observers/{entity_type}/{id}")
        .route("/summary", web::get().to(observers::summary))
        .route("/links", web::get().to(observers::links))
        .route("/clicks", web::get().to(observers::clicks))
        .route("/activity", web::get().to(observers::activity))
        .route("/sources", web::get().to(observers::sources))
        .route("/destinations", web::get().to(observers::destinations))
}
