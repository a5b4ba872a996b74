//! Transport-layer gating: shared secret, client CIDR allow-list, and a
//! fixed-window per-IP rate limit. Never consulted by the dispatcher.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use {
    axum::{
        extract::{ConnectInfo, Request, State},
        http::StatusCode,
        middleware::Next,
        response::{IntoResponse, Response},
    },
    dashmap::DashMap,
    ipnet::IpNet,
    secrecy::ExposeSecret,
    tracing::warn,
};

use crate::server::GatewayState;

/// Window length for the per-IP request budget.
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Fixed-window per-IP counters.
#[derive(Default)]
pub struct RequestThrottle {
    windows: DashMap<IpAddr, (Instant, u32)>,
}

impl RequestThrottle {
    /// Count one request; false when the caller exceeded the budget.
    pub fn allow(&self, ip: IpAddr, limit: u32) -> bool {
        let now = Instant::now();
        let mut entry = self.windows.entry(ip).or_insert((now, 0));
        let (started, count) = *entry;
        if now.duration_since(started) >= RATE_WINDOW {
            *entry = (now, 1);
            return true;
        }
        if count >= limit {
            return false;
        }
        *entry = (started, count + 1);
        true
    }
}

/// Parse the configured CIDR allow-list, rejecting invalid entries at
/// startup.
pub fn parse_allowed_ips(cidrs: &[String]) -> anyhow::Result<Vec<IpNet>> {
    cidrs
        .iter()
        .map(|cidr| {
            cidr.trim()
                .parse::<IpNet>()
                .or_else(|_| cidr.trim().parse::<IpAddr>().map(IpNet::from))
                .map_err(|e| anyhow::anyhow!("invalid allowed_ips entry '{cidr}': {e}"))
        })
        .collect()
}

/// Gate requests on the shared secret, the CIDR allow-list, and the rate
/// limit. `/health` is mounted outside this layer.
pub async fn auth_gate(
    State(state): State<Arc<GatewayState>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    if let Some(ip) = client_ip {
        if !state.allowed_ips.is_empty() && !state.allowed_ips.iter().any(|net| net.contains(&ip))
        {
            warn!(%ip, "request denied: IP not in allow-list");
            return (StatusCode::FORBIDDEN, "Access denied: IP not allowed").into_response();
        }

        if let Some(limit) = state.rate_limit_per_minute {
            if !state.throttle.allow(ip, limit) {
                warn!(%ip, "request denied: rate limit exceeded");
                return (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response();
            }
        }
    }

    if let Some(ref expected) = state.api_key {
        let headers = request.headers();
        let bearer = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let header_key = headers.get("X-Internal-Api-Key").and_then(|v| v.to_str().ok());

        let presented = bearer.or(header_key);
        if presented != Some(expected.expose_secret().as_str()) {
            warn!("request denied: missing or invalid API key");
            return (StatusCode::UNAUTHORIZED, "Missing or invalid API key").into_response();
        }
    }

    next.run(request).await
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_accepts_cidrs_and_plain_ips() {
        let nets = parse_allowed_ips(&["10.0.0.0/8".into(), "192.0.2.7".into()]).expect("parse");
        assert_eq!(nets.len(), 2);
        assert!(nets[0].contains(&"10.9.19.10".parse::<IpAddr>().expect("ip")));
        assert!(nets[1].contains(&"192.0.2.7".parse::<IpAddr>().expect("ip")));
        assert!(!nets[0].contains(&"172.16.0.1".parse::<IpAddr>().expect("ip")));
    }

    #[test]
    fn invalid_cidr_fails_startup() {
        assert!(parse_allowed_ips(&["not-a-cidr".into()]).is_err());
    }

    #[test]
    fn throttle_enforces_the_window_budget() {
        let throttle = RequestThrottle::default();
        let ip: IpAddr = "192.0.2.1".parse().expect("ip");

        for _ in 0..5 {
            assert!(throttle.allow(ip, 5));
        }
        assert!(!throttle.allow(ip, 5));

        // A different client has its own budget.
        let other: IpAddr = "192.0.2.2".parse().expect("ip");
        assert!(throttle.allow(other, 5));
    }
}
