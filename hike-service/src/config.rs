//! Environment-driven service configuration

use std::{net::IpAddr, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::database::constants::DEFAULT_DB_PATH;
use crate::validation::{ValidationPolicy, MIN_HIKE_YEAR};
use crate::verification::{
    VerificationPolicy, DEFAULT_EXPECTED_ACTION, DEFAULT_MIN_SCORE, DEFAULT_VERIFY_TIMEOUT_MS,
    DEFAULT_VERIFY_URL,
};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REGION: &str = "asia-south1";
pub const DEFAULT_SECRET_NAME: &str = "RECAPTCHA_SECRET_KEY";
pub const DEFAULT_RATE_LIMIT_PER_SECOND: u32 = 5;
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

/// Per-IP limits applied to the submit route
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub per_second: u32,
    pub burst: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: String,
    /// Where the service is deployed. Only reported, never used in decisions.
    pub region: String,
    pub verify_url: String,
    pub verify_timeout: Duration,
    pub verification: VerificationPolicy,
    pub secret_name: String,
    pub secrets_dir: Option<PathBuf>,
    pub validation: ValidationPolicy,
    pub metrics_token: Option<String>,
    pub rate_limit: RateLimitConfig,
    /// Reverse proxies allowed to set CF-Connecting-IP / X-Forwarded-For
    pub trusted_proxies: Vec<IpAddr>,
}

impl Config {
    pub fn from_env() -> Self {
        let expected_action = match std::env::var("RECAPTCHA_EXPECTED_ACTION") {
            Ok(action) if action.trim().is_empty() => None,
            Ok(action) => Some(action.trim().to_string()),
            Err(_) => Some(DEFAULT_EXPECTED_ACTION.to_string()),
        };

        let config = Self {
            port: env_parse("PORT", DEFAULT_PORT),
            db_path: env_string("DB_PATH", DEFAULT_DB_PATH),
            region: env_string("REGION", DEFAULT_REGION),
            verify_url: env_string("RECAPTCHA_VERIFY_URL", DEFAULT_VERIFY_URL),
            verify_timeout: Duration::from_millis(env_parse(
                "RECAPTCHA_TIMEOUT_MS",
                DEFAULT_VERIFY_TIMEOUT_MS,
            )),
            verification: VerificationPolicy {
                min_score: score_or(
                    "RECAPTCHA_MIN_SCORE",
                    env_parse("RECAPTCHA_MIN_SCORE", DEFAULT_MIN_SCORE),
                    DEFAULT_MIN_SCORE,
                ),
                expected_action,
            },
            secret_name: env_string("RECAPTCHA_SECRET_NAME", DEFAULT_SECRET_NAME),
            secrets_dir: std::env::var("SECRETS_DIR").ok().map(PathBuf::from),
            validation: ValidationPolicy {
                min_hike_year: env_parse("MIN_HIKE_YEAR", MIN_HIKE_YEAR),
                ..ValidationPolicy::default()
            },
            metrics_token: std::env::var("METRICS_AUTH_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            rate_limit: RateLimitConfig {
                per_second: env_parse("RATE_LIMIT_PER_SECOND", DEFAULT_RATE_LIMIT_PER_SECOND),
                burst: env_parse("RATE_LIMIT_BURST", DEFAULT_RATE_LIMIT_BURST),
            },
            trusted_proxies: parse_ip_list(
                "TRUSTED_PROXIES",
                std::env::var("TRUSTED_PROXIES").ok().as_deref(),
            ),
        };

        info!(
            region = %config.region,
            min_score = config.verification.min_score,
            expected_action = ?config.verification.expected_action,
            min_hike_year = config.validation.min_hike_year,
            trusted_proxies = ?config.trusted_proxies,
            "Configuration loaded"
        );

        config
    }
}

/// Parse an environment variable into a type implementing FromStr, with a default fallback
pub fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    parse_or(key, std::env::var(key).ok().as_deref(), default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {key} value '{value}', using default");
            default
        }),
    }
}

/// Comma-separated IP addresses. Unparseable entries are skipped with a warning.
fn parse_ip_list(key: &str, raw: Option<&str>) -> Vec<IpAddr> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                warn!("Ignoring invalid {key} entry '{entry}'");
                None
            }
        })
        .collect()
}

/// Trust scores live in [0, 1]; anything else (including NaN) falls back to `default`.
fn score_or(key: &str, value: f64, default: f64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        warn!("{key} must be between 0 and 1, got {value}; using default");
        default
    }
}
