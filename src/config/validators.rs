//! 配置校验

use super::StaticConfig;
use crate::errors::{LinkTrackerError, Result};

/// Slug 长度允许范围
const SLUG_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 4..=32;

/// Route prefixes must start with `/`, must not end with `/` and must not
/// contain whitespace. "/" alone is rejected since the prefix index route
/// would shadow every other scope.
pub fn validate_route_prefix(name: &str, prefix: &str) -> Result<()> {
    if !prefix.starts_with('/') {
        return Err(LinkTrackerError::config(format!(
            "{} must start with '/': '{}'",
            name, prefix
        )));
    }
    if prefix.len() < 2 || prefix.ends_with('/') {
        return Err(LinkTrackerError::config(format!(
            "{} must not be '/' or end with '/': '{}'",
            name, prefix
        )));
    }
    if prefix.chars().any(char::is_whitespace) {
        return Err(LinkTrackerError::config(format!(
            "{} must not contain whitespace: '{}'",
            name, prefix
        )));
    }
    Ok(())
}

impl StaticConfig {
    /// 校验配置的一致性，启动前调用
    pub fn validate(&self) -> Result<()> {
        if !SLUG_LENGTH_RANGE.contains(&self.slug.length) {
            return Err(LinkTrackerError::config(format!(
                "slug.length must be within {}..={}, got {}",
                SLUG_LENGTH_RANGE.start(),
                SLUG_LENGTH_RANGE.end(),
                self.slug.length
            )));
        }
        if self.slug.max_attempts == 0 {
            return Err(LinkTrackerError::config("slug.max_attempts must be > 0"));
        }
        if self.proxy.timeout_secs == 0 {
            return Err(LinkTrackerError::config("proxy.timeout_secs must be > 0"));
        }
        if self.analytics.max_buckets == 0 {
            return Err(LinkTrackerError::config("analytics.max_buckets must be > 0"));
        }

        let prefixes = [
            ("redirector.route_prefix", &self.redirector.route_prefix),
            ("admin.route_prefix", &self.admin.route_prefix),
            ("health.route_prefix", &self.health.route_prefix),
        ];
        for (name, prefix) in prefixes {
            validate_route_prefix(name, prefix)?;
        }
        for (i, (a_name, a)) in prefixes.iter().enumerate() {
            for (b_name, b) in &prefixes[i + 1..] {
                if a == b {
                    return Err(LinkTrackerError::config(format!(
                        "{} and {} must differ (both '{}')",
                        a_name, b_name, a
                    )));
                }
            }
        }

        for entry in &self.server.trusted_proxies {
            if !crate::utils::ip::is_valid_proxy_entry(entry) {
                return Err(LinkTrackerError::config(format!(
                    "server.trusted_proxies contains an invalid IP/CIDR: '{}'",
                    entry
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(StaticConfig::default().validate().is_ok());
    }

    #[test]
    fn test_route_prefix_rules() {
        assert!(validate_route_prefix("p", "/go").is_ok());
        assert!(validate_route_prefix("p", "/a/b").is_ok());
        assert!(validate_route_prefix("p", "go").is_err());
        assert!(validate_route_prefix("p", "/").is_err());
        assert!(validate_route_prefix("p", "/go/").is_err());
        assert!(validate_route_prefix("p", "/g o").is_err());
    }

    #[test]
    fn test_rejects_colliding_prefixes() {
        let mut config = StaticConfig::default();
        config.admin.route_prefix = config.redirector.route_prefix.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_slug_settings() {
        let mut config = StaticConfig::default();
        config.slug.length = 2;
        assert!(config.validate().is_err());

        let mut config = StaticConfig::default();
        config.slug.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_trusted_proxy() {
        let mut config = StaticConfig::default();
        config.server.trusted_proxies = vec!["10.0.0.0/8".into(), "not-an-ip".into()];
        assert!(config.validate().is_err());
    }
}
