use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum LinkTrackerError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    DateParse(String),
    Config(String),
    SlugTaken(String),
    SlugExhausted(String),
    UpstreamFetch(String),
    DestinationBlocked(String),
}

impl LinkTrackerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkTrackerError::DatabaseConfig(_) => "E001",
            LinkTrackerError::DatabaseConnection(_) => "E002",
            LinkTrackerError::DatabaseOperation(_) => "E003",
            LinkTrackerError::FileOperation(_) => "E004",
            LinkTrackerError::Validation(_) => "E005",
            LinkTrackerError::NotFound(_) => "E006",
            LinkTrackerError::Serialization(_) => "E007",
            LinkTrackerError::DateParse(_) => "E008",
            LinkTrackerError::Config(_) => "E009",
            LinkTrackerError::SlugTaken(_) => "E010",
            LinkTrackerError::SlugExhausted(_) => "E011",
            LinkTrackerError::UpstreamFetch(_) => "E012",
            LinkTrackerError::DestinationBlocked(_) => "E013",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkTrackerError::DatabaseConfig(_) => "Database Configuration Error",
            LinkTrackerError::DatabaseConnection(_) => "Database Connection Error",
            LinkTrackerError::DatabaseOperation(_) => "Database Operation Error",
            LinkTrackerError::FileOperation(_) => "File Operation Error",
            LinkTrackerError::Validation(_) => "Validation Error",
            LinkTrackerError::NotFound(_) => "Resource Not Found",
            LinkTrackerError::Serialization(_) => "Serialization Error",
            LinkTrackerError::DateParse(_) => "Date Parse Error",
            LinkTrackerError::Config(_) => "Configuration Error",
            LinkTrackerError::SlugTaken(_) => "Slug Already Taken",
            LinkTrackerError::SlugExhausted(_) => "Slug Space Exhausted",
            LinkTrackerError::UpstreamFetch(_) => "Upstream Fetch Error",
            LinkTrackerError::DestinationBlocked(_) => "Destination Blocked",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkTrackerError::DatabaseConfig(msg)
            | LinkTrackerError::DatabaseConnection(msg)
            | LinkTrackerError::DatabaseOperation(msg)
            | LinkTrackerError::FileOperation(msg)
            | LinkTrackerError::Validation(msg)
            | LinkTrackerError::NotFound(msg)
            | LinkTrackerError::Serialization(msg)
            | LinkTrackerError::DateParse(msg)
            | LinkTrackerError::Config(msg)
            | LinkTrackerError::SlugTaken(msg)
            | LinkTrackerError::SlugExhausted(msg)
            | LinkTrackerError::UpstreamFetch(msg)
            | LinkTrackerError::DestinationBlocked(msg) => msg,
        }
    }

    /// Status used when the error reaches an HTTP boundary.
    ///
    /// Upstream and guard failures map to 404: the relay path never
    /// exposes why a destination could not be served.
    pub fn http_status(&self) -> StatusCode {
        match self {
            LinkTrackerError::NotFound(_)
            | LinkTrackerError::UpstreamFetch(_)
            | LinkTrackerError::DestinationBlocked(_) => StatusCode::NOT_FOUND,
            LinkTrackerError::Validation(_) | LinkTrackerError::DateParse(_) => {
                StatusCode::BAD_REQUEST
            }
            LinkTrackerError::SlugTaken(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于启动失败时的终端提示）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LinkTrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinkTrackerError {}

// 便捷的构造函数
impl LinkTrackerError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::DateParse(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::Config(msg.into())
    }

    pub fn slug_taken<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::SlugTaken(msg.into())
    }

    pub fn slug_exhausted<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::SlugExhausted(msg.into())
    }

    pub fn upstream_fetch<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::UpstreamFetch(msg.into())
    }

    pub fn destination_blocked<T: Into<String>>(msg: T) -> Self {
        LinkTrackerError::DestinationBlocked(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LinkTrackerError {
    fn from(err: sea_orm::DbErr) -> Self {
        LinkTrackerError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for LinkTrackerError {
    fn from(err: std::io::Error) -> Self {
        LinkTrackerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkTrackerError {
    fn from(err: serde_json::Error) -> Self {
        LinkTrackerError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for LinkTrackerError {
    fn from(err: chrono::ParseError) -> Self {
        LinkTrackerError::DateParse(err.to_string())
    }
}

impl From<url::ParseError> for LinkTrackerError {
    fn from(err: url::ParseError) -> Self {
        LinkTrackerError::Validation(format!("Invalid URL: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, LinkTrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let all = [
            LinkTrackerError::database_config(""),
            LinkTrackerError::database_connection(""),
            LinkTrackerError::database_operation(""),
            LinkTrackerError::file_operation(""),
            LinkTrackerError::validation(""),
            LinkTrackerError::not_found(""),
            LinkTrackerError::serialization(""),
            LinkTrackerError::date_parse(""),
            LinkTrackerError::config(""),
            LinkTrackerError::slug_taken(""),
            LinkTrackerError::slug_exhausted(""),
            LinkTrackerError::upstream_fetch(""),
            LinkTrackerError::destination_blocked(""),
        ];
        let mut codes: Vec<_> = all.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_relay_failures_map_to_not_found() {
        assert_eq!(
            LinkTrackerError::upstream_fetch("timeout").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LinkTrackerError::destination_blocked("127.0.0.1").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LinkTrackerError::database_operation("boom").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = LinkTrackerError::slug_exhausted("gave up after 100 attempts");
        assert_eq!(
            err.to_string(),
            "Slug Space Exhausted: gave up after 100 attempts"
        );
    }
}
