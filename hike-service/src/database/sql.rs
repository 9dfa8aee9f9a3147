//! SQL statement constants for database operations

pub const CREATE_MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL,
    description TEXT NOT NULL
)
"#;

pub const CREATE_HIKES_TABLE_SQL: &str = r#"
CREATE TABLE hikes (
    id TEXT PRIMARY KEY,
    company_name TEXT NOT NULL,
    designation TEXT NOT NULL,
    annual_salary REAL NOT NULL,
    hike_year INTEGER NOT NULL,
    hike_percentage REAL NOT NULL,
    submitted_at TEXT NOT NULL, -- RFC 3339 UTC, set by the engine on insert
    is_approved INTEGER NOT NULL DEFAULT 0
)
"#;

pub const CREATE_DB_INDEXES: &[&str] = &[
    "CREATE INDEX idx_hikes_submitted_at ON hikes(submitted_at)",
    "CREATE INDEX idx_hikes_pending ON hikes(is_approved, submitted_at)",
];

pub const INSERT_HIKE_SQL: &str = r#"
INSERT INTO hikes
    (id, company_name, designation, annual_salary, hike_year, hike_percentage, submitted_at, is_approved)
VALUES (?, ?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), ?)
"#;

pub const SELECT_HIKE_BY_ID_SQL: &str = "SELECT * FROM hikes WHERE id = ?";

pub const COUNT_HIKES_SQL: &str = "SELECT COUNT(*) FROM hikes";

pub const COUNT_PENDING_HIKES_SQL: &str = "SELECT COUNT(*) FROM hikes WHERE is_approved = 0";
