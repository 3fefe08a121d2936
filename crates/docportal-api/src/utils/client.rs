//! Client address extraction
//!
//! Used to key the failed-auth limiter and to annotate audit entries. With
//! `trusted_proxy_count` proxies in front, the client is the entry just before
//! them in the `X-Forwarded-For` chain.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, HeaderMap};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::state::AppState;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Best-effort client identity for one request.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_parts(
        headers: &HeaderMap,
        socket_addr: Option<&SocketAddr>,
        trusted_proxy_count: usize,
    ) -> Self {
        Self {
            ip: extract_client_ip(headers, socket_addr, trusted_proxy_count),
            user_agent: headers
                .get("user-agent")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let socket_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientInfo::from_parts(
            &parts.headers,
            socket_addr.as_ref(),
            state.trusted_proxy_count,
        ))
    }
}

/// `X-Forwarded-For`, then `X-Real-IP`, then the socket peer.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|chain| from_forwarded_for(chain, trusted_proxy_count));
    if let Some(ip) = forwarded {
        return ip;
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| is_valid_ip(ip));
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    socket_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn from_forwarded_for(chain: &str, trusted_proxy_count: usize) -> Option<String> {
    let ips: Vec<&str> = chain
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    // A chain no longer than the trusted hops can't name the client; use the nearest hop.
    let candidate = if trusted_proxy_count == 0 || ips.len() <= trusted_proxy_count {
        ips.last()?
    } else {
        ips.get(ips.len() - trusted_proxy_count - 1)?
    };
    is_valid_ip(candidate).then(|| candidate.to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}
