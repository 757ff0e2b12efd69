//! 上游目标地址检查
//!
//! DirectDownload 链接由服务端代为抓取，目标地址不能指向内网。
//! 每一跳（包括重定向）都要经过检查。

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::warn;
use url::{Host, Url};

use crate::errors::{LinkTrackerError, Result};

/// 是否为可公开访问的地址
pub fn is_public_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: &Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_multicast()
        || ip.is_documentation()
        || a == 0 // 0.0.0.0/8
        || (a == 100 && (b & 0xc0) == 64) // 100.64.0.0/10 CGNAT
        || (a == 192 && b == 0 && c == 0) // 192.0.0.0/24
        || (a == 198 && (b & 0xfe) == 18) // 198.18.0.0/15
        || a >= 240) // 240.0.0.0/4
}

fn is_public_v6(ip: &Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(&v4);
    }
    let seg = ip.segments();
    // 64:ff9b::/96 NAT64：检查内嵌的 IPv4
    if seg[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        let embedded = Ipv4Addr::new(
            (seg[6] >> 8) as u8,
            seg[6] as u8,
            (seg[7] >> 8) as u8,
            seg[7] as u8,
        );
        return is_public_v4(&embedded);
    }
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        || seg[..6] == [0, 0, 0, 0, 0, 0] // IPv4-compatible（已废弃）
        || (seg[0] & 0xfe00) == 0xfc00 // fc00::/7
        || (seg[0] & 0xffc0) == 0xfe80 // fe80::/10
        || (seg[0] == 0x2001 && seg[1] == 0x0db8)) // 2001:db8::/32
}

#[derive(Debug, Clone, Copy)]
pub struct DestinationGuard {
    block_private: bool,
}

impl DestinationGuard {
    pub fn new(block_private: bool) -> Self {
        Self { block_private }
    }

    /// Check one hop. Only http(s) is ever fetched; with blocking enabled
    /// the host and every address it resolves to must be public.
    pub async fn check(&self, url: &Url) -> Result<()> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LinkTrackerError::destination_blocked(format!(
                "Scheme '{}' is not fetchable",
                url.scheme()
            )));
        }
        if !self.block_private {
            return Ok(());
        }

        let port = url.port_or_known_default().unwrap_or(80);
        match url.host() {
            Some(Host::Ipv4(ip)) => self.check_ip(url, IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => self.check_ip(url, IpAddr::V6(ip)),
            Some(Host::Domain(domain)) => {
                let name = domain.trim_end_matches('.').to_ascii_lowercase();
                if name == "localhost" || name.ends_with(".localhost") {
                    return Err(self.blocked(url, "localhost"));
                }

                let addrs: Vec<_> = tokio::net::lookup_host((name.as_str(), port))
                    .await
                    .map_err(|e| {
                        LinkTrackerError::upstream_fetch(format!(
                            "DNS lookup for '{}' failed: {}",
                            name, e
                        ))
                    })?
                    .collect();
                if addrs.is_empty() {
                    return Err(LinkTrackerError::upstream_fetch(format!(
                        "DNS lookup for '{}' returned no addresses",
                        name
                    )));
                }
                for addr in addrs {
                    self.check_ip(url, addr.ip())?;
                }
                Ok(())
            }
            None => Err(LinkTrackerError::destination_blocked(format!(
                "URL has no host: {}",
                url
            ))),
        }
    }

    fn check_ip(&self, url: &Url, ip: IpAddr) -> Result<()> {
        if is_public_ip(&ip) {
            Ok(())
        } else {
            Err(self.blocked(url, &ip.to_string()))
        }
    }

    fn blocked(&self, url: &Url, reason: &str) -> LinkTrackerError {
        warn!("Blocked upstream fetch of {} ({})", url, reason);
        LinkTrackerError::destination_blocked(format!(
            "Destination {} resolves to a non-public address ({})",
            url, reason
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_non_public_v4() {
        for s in [
            "0.0.0.0",
            "127.0.0.1",
            "10.1.2.3",
            "172.16.0.1",
            "192.168.0.1",
            "169.254.169.254",
            "100.64.0.1",
            "224.0.0.1",
            "255.255.255.255",
            "192.0.2.1",
            "198.18.0.1",
        ] {
            assert!(!is_public_ip(&ip(s)), "{} should be blocked", s);
        }
        assert!(is_public_ip(&ip("93.184.216.34")));
        assert!(is_public_ip(&ip("100.128.0.1")));
    }

    #[test]
    fn test_non_public_v6() {
        for s in [
            "::",
            "::1",
            "fe80::1",
            "fd12::1",
            "ff02::1",
            "::ffff:127.0.0.1",
            "::ffff:10.0.0.1",
            "64:ff9b::a00:1",
            "2001:db8::1",
        ] {
            assert!(!is_public_ip(&ip(s)), "{} should be blocked", s);
        }
        assert!(is_public_ip(&ip("2606:4700:4700::1111")));
        assert!(is_public_ip(&ip("::ffff:93.184.216.34")));
    }

    #[tokio::test]
    async fn test_guard_rejects_literal_private_hosts() {
        let guard = DestinationGuard::new(true);
        for url in [
            "http://127.0.0.1/admin",
            "http://[::1]:8080/",
            "http://169.254.169.254/latest/meta-data",
            "http://localhost/x",
            "http://api.localhost./x",
        ] {
            let result = guard.check(&Url::parse(url).unwrap()).await;
            assert!(
                matches!(result, Err(LinkTrackerError::DestinationBlocked(_))),
                "{} should be blocked",
                url
            );
        }
    }

    #[tokio::test]
    async fn test_guard_rejects_non_http_schemes() {
        let guard = DestinationGuard::new(false);
        let result = guard.check(&Url::parse("ftp://example.com/a").unwrap()).await;
        assert!(matches!(result, Err(LinkTrackerError::DestinationBlocked(_))));
    }

    #[tokio::test]
    async fn test_guard_disabled_allows_private() {
        let guard = DestinationGuard::new(false);
        assert!(
            guard
                .check(&Url::parse("http://127.0.0.1:9/x").unwrap())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_guard_allows_public_literal() {
        let guard = DestinationGuard::new(true);
        assert!(
            guard
                .check(&Url::parse("https://93.184.216.34/file.bin").unwrap())
                .await
                .is_ok()
        );
    }
}
