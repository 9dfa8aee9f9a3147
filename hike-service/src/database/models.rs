use serde::{Deserialize, Serialize};

/// Hike record as persisted in the `hikes` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredHikeRecord {
    pub id: String,
    pub company_name: String,
    pub designation: String,
    pub annual_salary: f64,
    pub hike_year: i32,
    pub hike_percentage: f64,
    pub submitted_at: String, // RFC 3339 UTC timestamp
    pub is_approved: bool,
}

/// Record counts reported on the admin stats endpoint
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CollectionCounts {
    pub total: i64,
    pub pending_moderation: i64,
}
