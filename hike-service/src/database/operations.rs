use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{sqlite::SqliteRow, Row};
use tracing::debug;

use super::constants::{HIKES_COLLECTION, RECORD_ID_LEN};
use super::models::{CollectionCounts, StoredHikeRecord};
use super::sql::{COUNT_HIKES_SQL, COUNT_PENDING_HIKES_SQL, INSERT_HIKE_SQL, SELECT_HIKE_BY_ID_SQL};
use super::Database;
use crate::store::{HikeStore, RecordId, StoreError};
use crate::validation::HikeSubmission;

/// Random alphanumeric identifier in the style of document-store auto IDs
pub fn generate_record_id() -> RecordId {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RECORD_ID_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl HikeStore for Database {
    async fn append(&self, submission: HikeSubmission) -> Result<RecordId, StoreError> {
        let id = generate_record_id();
        debug!(
            "Appending to {}: id={} company={:?} year={}",
            HIKES_COLLECTION, id, submission.company_name, submission.hike_year
        );

        // Single statement, so the record lands whole or not at all
        sqlx::query(INSERT_HIKE_SQL)
            .bind(&id)
            .bind(&submission.company_name)
            .bind(&submission.designation)
            .bind(submission.annual_salary)
            .bind(submission.hike_year)
            .bind(submission.hike_percentage)
            .bind(false)
            .execute(self.pool())
            .await?;

        Ok(id)
    }
}

impl Database {
    /// Read a record back by identifier
    pub async fn fetch(&self, id: &str) -> Result<Option<StoredHikeRecord>, StoreError> {
        let row = sqlx::query(SELECT_HIKE_BY_ID_SQL)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.as_ref().map(StoredHikeRecord::from_row).transpose()?)
    }

    pub async fn counts(&self) -> Result<CollectionCounts, StoreError> {
        let total: i64 = sqlx::query_scalar(COUNT_HIKES_SQL)
            .fetch_one(self.pool())
            .await?;
        let pending_moderation: i64 = sqlx::query_scalar(COUNT_PENDING_HIKES_SQL)
            .fetch_one(self.pool())
            .await?;

        Ok(CollectionCounts {
            total,
            pending_moderation,
        })
    }
}

impl StoredHikeRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(StoredHikeRecord {
            id: row.try_get("id")?,
            company_name: row.try_get("company_name")?,
            designation: row.try_get("designation")?,
            annual_salary: row.try_get("annual_salary")?,
            hike_year: row.try_get("hike_year")?,
            hike_percentage: row.try_get("hike_percentage")?,
            submitted_at: row.try_get("submitted_at")?,
            is_approved: row.try_get("is_approved")?,
        })
    }
}
