//! Request-scoped submission pipeline: bot check, validation, persistence

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{
    SubmitError, MISSING_TOKEN_MESSAGE, REJECTED_MESSAGE, STORE_FAILURE_MESSAGE,
    VERIFY_UNAVAILABLE_MESSAGE,
};
use crate::store::HikeStore;
use crate::types::SubmitResponse;
use crate::validation::{validate, verification_token, ValidationPolicy};
use crate::verification::{HumanVerifier, RejectReason, Verdict};

/// Runs one submission through the gate, validator and writer. Holds only
/// the injected collaborators; nothing survives between calls.
#[derive(Clone)]
pub struct HikeIntake {
    verifier: Arc<dyn HumanVerifier>,
    store: Arc<dyn HikeStore>,
    policy: ValidationPolicy,
}

impl HikeIntake {
    pub fn new(
        verifier: Arc<dyn HumanVerifier>,
        store: Arc<dyn HikeStore>,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            verifier,
            store,
            policy,
        }
    }

    pub async fn submit(&self, payload: &Value) -> Result<SubmitResponse, SubmitError> {
        self.submit_in_year(payload, Utc::now().year()).await
    }

    /// Same as [`submit`](Self::submit) with an explicit current year for the
    /// `hikeYear` upper bound.
    pub async fn submit_in_year(
        &self,
        payload: &Value,
        current_year: i32,
    ) -> Result<SubmitResponse, SubmitError> {
        // 1. Bot check
        let token = verification_token(payload).ok_or_else(|| {
            warn!("Verification token missing");
            SubmitError::InvalidArgument(MISSING_TOKEN_MESSAGE.to_string())
        })?;

        match self.verifier.verify(token).await {
            Verdict::Accept => {}
            Verdict::Reject(RejectReason::MissingToken) => {
                return Err(SubmitError::InvalidArgument(
                    MISSING_TOKEN_MESSAGE.to_string(),
                ))
            }
            Verdict::Reject(reason) => {
                warn!("Submission rejected by bot check: {}", reason);
                return Err(SubmitError::Unauthenticated(REJECTED_MESSAGE.to_string()));
            }
            Verdict::Unavailable(e) => {
                error!("Bot check unavailable: {}", e);
                return Err(SubmitError::Internal(
                    VERIFY_UNAVAILABLE_MESSAGE.to_string(),
                ));
            }
        }

        // 2. Validate and sanitize
        let submission = validate(payload, &self.policy, current_year).map_err(|e| {
            info!("Submission failed validation: {}", e);
            SubmitError::from(e)
        })?;

        // 3. Persist. The write runs detached so a caller hanging up does
        // not abort it halfway through.
        let store = Arc::clone(&self.store);
        let doc_id = tokio::spawn(async move { store.append(submission).await })
            .await
            .map_err(|e| {
                error!("Persistence task failed: {}", e);
                SubmitError::Internal(STORE_FAILURE_MESSAGE.to_string())
            })?
            .map_err(|e| {
                error!("Error writing hike record: {}", e);
                SubmitError::Internal(STORE_FAILURE_MESSAGE.to_string())
            })?;

        info!("Successfully stored hike data with record ID: {}", doc_id);
        Ok(SubmitResponse::stored(doc_id))
    }
}
