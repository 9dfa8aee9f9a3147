//! Shared application state

use std::{net::IpAddr, sync::Arc};

use crate::database::Database;
use crate::intake::HikeIntake;
use crate::middleware::IpRateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub intake: HikeIntake,
    /// Concrete store, for the admin stats endpoint
    pub database: Database,
    pub metrics_token: Option<Arc<str>>,
    pub rate_limiter: Arc<IpRateLimiter>,
    /// Peers whose forwarding headers name the real client
    pub trusted_proxies: Arc<[IpAddr]>,
}
