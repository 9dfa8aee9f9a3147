//! HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::SubmitError;
use crate::metrics::{record_submit_outcome, snapshot_as_json, SubmitOutcome};
use crate::state::AppState;
use crate::types::{unwrap_callable, SubmitResponse};

/// Handle POST /submitHikeData
pub async fn submit_hike_data(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, SubmitError> {
    info!("POST /submitHikeData - Submission received");

    let result = match payload {
        Ok(Json(body)) => state.intake.submit(&unwrap_callable(body)).await,
        Err(rejection) => {
            info!("Malformed request body: {}", rejection.body_text());
            Err(SubmitError::InvalidArgument(
                "Request body must be a JSON object.".to_string(),
            ))
        }
    };

    record_submit_outcome(match &result {
        Ok(_) => SubmitOutcome::Success,
        Err(e) => e.into(),
    });

    result.map(Json)
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "git_hash": option_env!("HIKE_BUILD_GIT_HASH"),
        "build_time_unix": option_env!("HIKE_BUILD_TIME_UNIX"),
    }))
}

/// Handle GET /admin/stats
pub async fn admin_stats(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    info!("GET /admin/stats - Stats requested");

    let counts = state.database.counts().await.map_err(|e| {
        error!("Failed to count hike records: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut stats = snapshot_as_json(state.database.db_path());
    stats["records"] = json!(counts);
    Ok(Json(stats))
}
