//! IP 地址处理工具
//!
//! 提供统一的客户端 IP 提取：连接来自私有地址/localhost 时
//! 认为前面有反向代理，信任 X-Forwarded-For；否则用连接 IP，
//! 防止公网直连伪造。

use std::net::IpAddr;

use actix_web::HttpRequest;

/// IP 字面量语法是否合法（IPv4 或 IPv6）
pub fn is_valid_ip(s: &str) -> bool {
    s.parse::<IpAddr>().is_ok()
}

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            // IPv6 私有地址：
            // - fc00::/7 (ULA, RFC 4193)
            // - fe80::/10 (Link-local)
            // - ::1 (Loopback)
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// 从 HttpRequest 提取真实客户端 IP
///
/// 策略（按优先级）：
/// 1. 连接来自私有 IP/localhost → 自动检测代理，使用转发头
/// 2. 默认 → 使用连接 IP（公网直连场景，防止伪造）
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let conn_info = req.connection_info();
    let peer = conn_info.peer_addr()?;
    let peer_ip = strip_port(peer);

    if let Ok(ip_addr) = peer_ip.parse::<IpAddr>()
        && is_private_or_local(&ip_addr)
        && let Some(forwarded) = extract_forwarded_ip_from_headers(req.headers())
    {
        return Some(forwarded);
    }

    Some(peer_ip)
}

/// 从 HeaderMap 提取转发的 IP（X-Forwarded-For 或 X-Real-IP）
pub fn extract_forwarded_ip_from_headers(
    headers: &actix_web::http::header::HeaderMap,
) -> Option<String> {
    // 优先 X-Forwarded-For（取第一个，即原始客户端 IP）
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            // 其次 X-Real-IP
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(String::from)
        })
}

/// 去掉可能携带的端口（支持 `ip:port` 与纯 ip）
fn strip_port(addr: &str) -> String {
    if let Ok(socket) = addr.parse::<std::net::SocketAddr>() {
        socket.ip().to_string()
    } else {
        addr.to_string()
    }
}
