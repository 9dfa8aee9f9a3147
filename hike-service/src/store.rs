//! Persistence seam for accepted submissions

use async_trait::async_trait;
use thiserror::Error;

use crate::validation::HikeSubmission;

/// Identifier assigned by the store. The only external handle to a record.
pub type RecordId = String;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait HikeStore: Send + Sync {
    /// Append one record with a fresh identifier, a store-assigned
    /// `submitted_at` and `is_approved = false`. All or nothing.
    async fn append(&self, submission: HikeSubmission) -> Result<RecordId, StoreError>;
}
