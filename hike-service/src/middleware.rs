//! Client IP resolution and per-IP rate limiting for the submit route

use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::error::{SubmitError, RATE_LIMITED_MESSAGE};
use crate::metrics::{record_submit_outcome, SubmitOutcome};
use crate::state::AppState;

const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Effective client address, inserted as a request extension
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClientIp(pub Option<IpAddr>);

/// Pick the client IP.
///
/// Forwarding headers are only honoured when the socket peer is one of
/// `trusted_proxies`. Priority then is CF-Connecting-IP > X-Forwarded-For
/// (first) > socket. Any other peer is keyed on its socket address.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    socket: Option<SocketAddr>,
    trusted_proxies: &[IpAddr],
) -> Option<(IpAddr, &'static str)> {
    let peer = socket?.ip();
    if !trusted_proxies.contains(&peer) {
        return Some((peer, "socket"));
    }

    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    header_ip(CF_CONNECTING_IP)
        .map(|ip| (ip, CF_CONNECTING_IP))
        .or_else(|| header_ip(X_FORWARDED_FOR).map(|ip| (ip, X_FORWARDED_FOR)))
        .or(Some((peer, "socket")))
}

pub async fn inject_client_ip(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let socket = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);

    let resolved = resolve_client_ip(req.headers(), socket, &state.trusted_proxies);
    match resolved {
        Some((ip, source)) => debug!("client_ip_source={} ip={}", source, ip),
        None => debug!("client_ip_source=unavailable"),
    }

    req.extensions_mut()
        .insert(ClientIp(resolved.map(|(ip, _)| ip)));
    next.run(req).await
}

pub fn build_rate_limiter(config: &RateLimitConfig) -> Arc<IpRateLimiter> {
    let per_second = NonZeroU32::new(config.per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(config.burst).unwrap_or(per_second);
    Arc::new(RateLimiter::keyed(
        Quota::per_second(per_second).allow_burst(burst),
    ))
}

/// Requests without a resolvable client IP are not limited.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let client_ip = req.extensions().get::<ClientIp>().and_then(|c| c.0);

    if let Some(ip) = client_ip {
        if state.rate_limiter.check_key(&ip).is_err() {
            warn!("Rate limit exceeded for {}", ip);
            record_submit_outcome(SubmitOutcome::RateLimited);
            return SubmitError::ResourceExhausted(RATE_LIMITED_MESSAGE.to_string())
                .into_response();
        }
    }

    next.run(req).await
}
