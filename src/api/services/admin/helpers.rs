//! Admin API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::errors::LinkTrackerError;
use crate::services::parse_date;
use crate::storage::{EntityRef, HitFilter, Source};

use super::error_code::ErrorCode;
use super::types::{ApiResponse, HitRangeQuery};

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 LinkTrackerError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
///
/// 服务端错误只返回通用信息，细节写日志。
pub fn error_from_tracker(err: &LinkTrackerError) -> HttpResponse {
    let status = err.http_status();
    let code = ErrorCode::from(err);
    if status.is_server_error() {
        error!("Admin API error: {}", err);
        return error_response(status, code, "Internal server error");
    }
    error_response(status, code, err.message())
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: crate::errors::Result<T>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_tracker(&e),
    }
}

pub fn observer_from_path(entity_type: String, id: i64) -> crate::errors::Result<EntityRef> {
    if entity_type.trim().is_empty() {
        return Err(LinkTrackerError::validation("Observer type cannot be empty"));
    }
    Ok(EntityRef::new(entity_type, id))
}

/// `?since&until&source_type&source_id` → HitFilter
pub fn hit_filter(query: &HitRangeQuery) -> crate::errors::Result<Option<HitFilter>> {
    let since = query.since.as_deref().map(parse_date).transpose()?;
    let until = query.until.as_deref().map(parse_date).transpose()?;
    let source = match (&query.source_type, query.source_id) {
        (Some(t), id) => Some(Source::from_columns(t.clone(), id)),
        (None, Some(_)) => {
            return Err(LinkTrackerError::validation(
                "source_id requires source_type",
            ));
        }
        (None, None) => None,
    };

    if since.is_none() && until.is_none() && source.is_none() {
        return Ok(None);
    }
    Ok(Some(HitFilter {
        since,
        until,
        source,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_has_no_filter() {
        assert_eq!(hit_filter(&HitRangeQuery::default()).unwrap(), None);
    }

    #[test]
    fn test_hit_filter_parses_dates_and_source() {
        let query = HitRangeQuery {
            since: Some("2026-10-01".to_string()),
            until: Some("2026-10-02T00:00:00Z".to_string()),
            source_type: Some("post".to_string()),
            source_id: Some(7),
        };
        let filter = hit_filter(&query).unwrap().unwrap();
        assert_eq!(filter.source, Some(Source::entity("post", 7)));
        assert!(filter.since.unwrap() < filter.until.unwrap());
    }

    #[test]
    fn test_hit_filter_rejects_bad_input() {
        let bad_date = HitRangeQuery {
            since: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            hit_filter(&bad_date),
            Err(LinkTrackerError::DateParse(_))
        ));

        let orphan_id = HitRangeQuery {
            source_id: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            hit_filter(&orphan_id),
            Err(LinkTrackerError::Validation(_))
        ));
    }
}
