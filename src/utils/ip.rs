//! IP 地址处理工具
//!
//! 提供统一的客户端 IP 提取功能，支持：
//! - 可信代理配置（trusted_proxies）
//! - CIDR 匹配

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::dev::ConnectionInfo;
use tracing::debug;

/// 无法确定客户端地址时写入 link_hits 的占位值
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// `remote_address` 列宽
pub const MAX_ADDRESS_LEN: usize = 45;

/// 配置项是否为合法的 IP 或 CIDR
pub fn is_valid_proxy_entry(entry: &str) -> bool {
    match entry.split_once('/') {
        Some((network, prefix_len)) => {
            let Ok(prefix_len) = prefix_len.parse::<u8>() else {
                return false;
            };
            match network.parse::<IpAddr>() {
                Ok(IpAddr::V4(_)) => prefix_len <= 32,
                Ok(IpAddr::V6(_)) => prefix_len <= 128,
                Err(_) => false,
            }
        }
        None => entry.parse::<IpAddr>().is_ok(),
    }
}

/// 检查 IP 是否在可信代理列表中
pub fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    // 先尝试解析为 SocketAddr（支持 ip:port），如果失败再尝试纯 IpAddr
    let ip_addr = if let Ok(socket_addr) = ip.parse::<SocketAddr>() {
        socket_addr.ip()
    } else if let Ok(ip_addr) = ip.parse::<IpAddr>() {
        ip_addr
    } else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip_addr, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| p == ip_addr)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u32::from_be_bytes(ip.octets());
            let net_bits = u32::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u128::from_be_bytes(ip.octets());
            let net_bits = u128::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        _ => false,
    }
}

/// Strip a `:port` suffix (and IPv6 brackets) from a peer address.
fn strip_port(addr: &str) -> String {
    match addr.parse::<SocketAddr>() {
        Ok(sock) => sock.ip().to_string(),
        Err(_) => addr.trim_matches(|c| c == '[' || c == ']').to_string(),
    }
}

/// 从 ConnectionInfo 提取真实客户端 IP
///
/// 只有当连接来自 `trusted_proxies` 中的地址时才采用转发头，
/// 否则使用连接 IP（防止伪造 X-Forwarded-For）。
pub fn extract_client_ip_from_conn_info<F>(
    conn_info: &ConnectionInfo,
    trusted_proxies: &[String],
    get_forwarded_ip: F,
) -> Option<String>
where
    F: FnOnce() -> Option<String>,
{
    let peer = conn_info.peer_addr()?;

    if !trusted_proxies.is_empty() && is_trusted_proxy(peer, trusted_proxies) {
        let real_ip = get_forwarded_ip()
            .filter(|ip| ip.parse::<IpAddr>().is_ok())
            .unwrap_or_else(|| strip_port(peer));
        debug!("Trusted proxy {} -> {}", peer, real_ip);
        return Some(real_ip);
    }

    Some(strip_port(peer))
}

/// 从 HttpRequest 提取真实客户端 IP，失败时返回 `"unknown"`
pub fn client_address(req: &HttpRequest, trusted_proxies: &[String]) -> String {
    let mut addr = extract_client_ip_from_conn_info(&req.connection_info(), trusted_proxies, || {
        extract_forwarded_ip_from_headers(req.headers())
    })
    .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string());

    if addr.len() > MAX_ADDRESS_LEN {
        addr.truncate(MAX_ADDRESS_LEN);
    }
    addr
}

/// 从 HeaderMap 提取转发的 IP（X-Forwarded-For 优先，其次 X-Real-IP）
pub fn extract_forwarded_ip_from_headers(
    headers: &actix_web::http::header::HeaderMap,
) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}
