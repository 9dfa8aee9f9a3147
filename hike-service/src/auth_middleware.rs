//! Token guard for admin endpoints

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::state::AppState;

pub const METRICS_TOKEN_HEADER: &str = "x-metrics-token";

/// Reject the request unless `x-metrics-token` matches the configured token.
/// With no token configured every request is rejected.
pub async fn require_metrics_token(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = app_state.metrics_token.as_deref() else {
        info!("Admin request refused: METRICS_AUTH_TOKEN not configured");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let provided = extract_metrics_token(&headers)?;
    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        info!("Admin request refused: invalid metrics token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

pub fn extract_metrics_token(headers: &HeaderMap) -> Result<&str, StatusCode> {
    headers
        .get(METRICS_TOKEN_HEADER)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::BAD_REQUEST)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_header_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            extract_metrics_token(&headers),
            Err(StatusCode::UNAUTHORIZED)
        );

        headers.insert(METRICS_TOKEN_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(extract_metrics_token(&headers), Ok("abc"));
    }

    #[test]
    fn compares_tokens() {
        assert!(constant_time_eq(b"test-token", b"test-token"));
        assert!(!constant_time_eq(b"test-token", b"test-tokem"));
        assert!(!constant_time_eq(b"test", b"test-token"));
    }
}
