//! Admin API 服务模块
//!
//! - 链接创建（单个 / 扫描内容）与详情
//! - Observer 维度的分析查询

use actix_web::web;

use crate::api::middleware::AdminAuth;

pub mod error_code;
mod helpers;
mod links;
mod observers;
pub mod routes;
mod types;

pub use types::*;

pub use helpers::{api_result, error_from_tracker, error_response, success_response};

pub use error_code::ErrorCode;

/// 管理接口，挂载在 `prefix` 下，整体由 Bearer token 保护
pub fn admin_scope(prefix: &str, token: &str) -> impl FnOnce(&mut web::ServiceConfig) + use<> {
    let scope = web::scope(prefix)
        .wrap(AdminAuth::new(token))
        .service(routes::links_routes())
        .service(routes::observers_routes());
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(scope);
    }
}
