//! URL 验证模块
//!
//! 验证目标地址安全性，阻止危险协议

use url::Url;

/// URL 验证错误
#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    InvalidProtocol(String),
    DangerousProtocol(String),
    RelativeUrl(String),
    InvalidFormat(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidProtocol(proto) => write!(
                f,
                "Invalid protocol: {}. Only http:// and https:// are allowed",
                proto
            ),
            Self::DangerousProtocol(proto) => {
                write!(f, "Dangerous protocol blocked: {}", proto)
            }
            Self::RelativeUrl(url) => {
                write!(f, "Destination must be an absolute URL: {}", url)
            }
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 危险协议列表
const DANGEROUS_PROTOCOLS: &[&str] = &[
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
    "about:",
    "blob:",
];

/// Returns the dangerous scheme `url` starts with, if any.
///
/// Leading whitespace and ASCII control characters are ignored, matching
/// how browsers normalise `href` values before resolving them.
pub fn dangerous_protocol(url: &str) -> Option<&'static str> {
    let normalized: String = url
        .trim_start_matches(|c: char| c.is_whitespace() || c.is_ascii_control())
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();

    DANGEROUS_PROTOCOLS
        .iter()
        .find(|proto| normalized.starts_with(*proto))
        .copied()
}

/// 验证跳转链接（Redirect）的目标地址
///
/// 检查项目：
/// 1. 不为空
/// 2. 不是危险协议（javascript:, data:, file: 等）
/// 3. 必须是绝对地址；协议不限（tel:, sms:, ftp:, mailto: 均可跳转）
pub fn validate_destination(url: &str) -> Result<Url, UrlValidationError> {
    let url = check_scheme_safety(url)?;
    Url::parse(url).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => UrlValidationError::RelativeUrl(url.to_string()),
        e => UrlValidationError::InvalidFormat(e.to_string()),
    })
}

/// 验证需要由服务端抓取的地址（DirectDownload）：必须是绝对 http(s) 地址
pub fn validate_fetch_url(url: &str) -> Result<Url, UrlValidationError> {
    let parsed = validate_destination(url)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(UrlValidationError::InvalidProtocol(format!("{}:", other))),
    }
}

fn check_scheme_safety(url: &str) -> Result<&str, UrlValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }
    if let Some(proto) = dangerous_protocol(url) {
        return Err(UrlValidationError::DangerousProtocol(proto.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_destinations() {
        assert!(validate_destination("http://example.com").is_ok());
        assert!(validate_destination("https://example.com/path?query=1").is_ok());
    }

    #[test]
    fn test_non_web_schemes_are_valid_redirects() {
        for url in [
            "tel:+15550100",
            "sms:+15550100?body=hi",
            "ftp://files.example.com/report.pdf",
            "mailto:team@example.com",
        ] {
            assert!(validate_destination(url).is_ok(), "{}", url);
        }
    }

    #[test]
    fn test_relative_destinations_are_rejected() {
        for url in ["/pricing", "docs/intro.html", "//cdn.example.com/a.png", "?q=1"] {
            assert!(
                matches!(
                    validate_destination(url),
                    Err(UrlValidationError::RelativeUrl(_))
                ),
                "{}",
                url
            );
        }
    }

    #[test]
    fn test_dangerous_protocols() {
        assert!(matches!(
            validate_destination("javascript:alert(1)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            validate_destination("  JavaScript:alert(1)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            validate_destination("java\tscript:alert(1)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            validate_destination("data:text/html,<script>alert(1)</script>"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            validate_destination("file:///etc/passwd"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
    }

    #[test]
    fn test_empty_destination() {
        assert_eq!(validate_destination("   "), Err(UrlValidationError::EmptyUrl));
        assert_eq!(validate_fetch_url(""), Err(UrlValidationError::EmptyUrl));
    }

    #[test]
    fn test_fetch_url_requires_absolute_http() {
        assert!(validate_fetch_url("https://cdn.example.com/a.png").is_ok());
        assert!(matches!(
            validate_fetch_url("/a.png"),
            Err(UrlValidationError::RelativeUrl(_))
        ));
        assert!(matches!(
            validate_fetch_url("gopher://example.com"),
            Err(UrlValidationError::InvalidProtocol(_))
        ));
        assert!(matches!(
            validate_fetch_url("ftp://files.example.com/a.png"),
            Err(UrlValidationError::InvalidProtocol(_))
        ));
        assert!(matches!(
            validate_fetch_url("javascript:alert(1)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
    }
}
