//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::LinkTrackerError;

/// API 错误码枚举，序列化为数字
///
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 链接错误
/// - 6000-6099: 分析查询错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    InvalidDateFormat = 1012,
    ServiceUnavailable = 1030,

    // 链接错误 3000-3099
    LinkNotFound = 3000,
    SlugTaken = 3001,
    LinkInvalidUrl = 3002,
    SlugExhausted = 3003,
    LinkDatabaseError = 3005,

    // Analytics 错误 6000-6099
    AnalyticsQueryFailed = 6000,
    AnalyticsInvalidRange = 6002,
}

impl From<&LinkTrackerError> for ErrorCode {
    fn from(err: &LinkTrackerError) -> Self {
        match err {
            LinkTrackerError::Validation(_) => ErrorCode::BadRequest,
            LinkTrackerError::DateParse(_) => ErrorCode::InvalidDateFormat,
            LinkTrackerError::NotFound(_) => ErrorCode::NotFound,
            LinkTrackerError::SlugTaken(_) => ErrorCode::SlugTaken,
            LinkTrackerError::SlugExhausted(_) => ErrorCode::SlugExhausted,
            LinkTrackerError::DestinationBlocked(_) => ErrorCode::LinkInvalidUrl,
            LinkTrackerError::DatabaseOperation(_) | LinkTrackerError::DatabaseConnection(_) => {
                ErrorCode::LinkDatabaseError
            }
            _ => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::SlugTaken).unwrap(), "3001");
        let code: ErrorCode = serde_json::from_str("1012").unwrap();
        assert_eq!(code, ErrorCode::InvalidDateFormat);
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ErrorCode::from(&LinkTrackerError::slug_taken("x")),
            ErrorCode::SlugTaken
        );
        assert_eq!(
            ErrorCode::from(&LinkTrackerError::date_parse("x")),
            ErrorCode::InvalidDateFormat
        );
        assert_eq!(
            ErrorCode::from(&LinkTrackerError::config("x")),
            ErrorCode::InternalServerError
        );
    }
}
