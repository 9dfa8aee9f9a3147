//! Router assembly and process lifecycle

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    http::{header::CONTENT_TYPE, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth_middleware::require_metrics_token;
use crate::config::Config;
use crate::database::Database;
use crate::intake::HikeIntake;
use crate::middleware::{build_rate_limiter, inject_client_ip, rate_limit};
use crate::routes::{admin_stats, health_check, submit_hike_data, version};
use crate::secrets::{EnvSecretProvider, FileSecretProvider, SecretProvider};
use crate::state::AppState;
use crate::verification::RecaptchaVerifier;

const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Wire the collaborators described by `config` into application state
pub async fn build_state(config: &Config) -> Result<AppState> {
    let database = Database::connect(&config.db_path).await?;

    let secrets: Arc<dyn SecretProvider> = match &config.secrets_dir {
        Some(dir) => {
            info!("Resolving secrets from {:?}", dir);
            Arc::new(FileSecretProvider::new(dir))
        }
        None => Arc::new(EnvSecretProvider),
    };

    let verifier = RecaptchaVerifier::new(
        config.verify_url.clone(),
        config.verify_timeout,
        secrets,
        config.secret_name.clone(),
        config.verification.clone(),
    )?;

    let intake = HikeIntake::new(
        Arc::new(verifier),
        Arc::new(database.clone()),
        config.validation,
    );

    Ok(AppState {
        intake,
        database,
        metrics_token: config.metrics_token.as_deref().map(Arc::from),
        rate_limiter: build_rate_limiter(&config.rate_limit),
        trusted_proxies: Arc::from(config.trusted_proxies.as_slice()),
    })
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/healthz", get(health_check))
        .route("/version", get(version))
        .route(
            "/submitHikeData",
            post(submit_hike_data)
                .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit)),
        )
        .route(
            "/admin/stats",
            get(admin_stats).route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_metrics_token,
            )),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_client_ip,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    });

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {} (region {})", addr, config.region);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
