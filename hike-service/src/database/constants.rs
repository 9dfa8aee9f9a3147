//! Database schema constants

/// Current database schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptions, indexed by version - 1
pub const MIGRATION_DESCRIPTIONS: &[&str] = &["Create hikes collection"];

/// Default database file name
pub const DEFAULT_DB_PATH: &str = "hikes.db";

/// Collection (table) that holds submitted hike records
pub const HIKES_COLLECTION: &str = "hikes";

/// Length of generated record identifiers
pub const RECORD_ID_LEN: usize = 20;

pub const MAX_CONNECTIONS: u32 = 8;
