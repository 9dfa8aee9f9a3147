use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use serde_json::{json, Value};

use crate::database::path::MEMORY_DB;
use crate::error::SubmitError;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SubmitOutcome {
    Success,
    InvalidArgument,
    Unauthenticated,
    Internal,
    RateLimited,
}

impl SubmitOutcome {
    fn label(self) -> &'static str {
        match self {
            SubmitOutcome::Success => "success",
            SubmitOutcome::InvalidArgument => "invalid_argument",
            SubmitOutcome::Unauthenticated => "unauthenticated",
            SubmitOutcome::Internal => "internal",
            SubmitOutcome::RateLimited => "rate_limited",
        }
    }
}

impl From<&SubmitError> for SubmitOutcome {
    fn from(e: &SubmitError) -> Self {
        match e {
            SubmitError::InvalidArgument(_) => SubmitOutcome::InvalidArgument,
            SubmitError::Unauthenticated(_) => SubmitOutcome::Unauthenticated,
            SubmitError::Internal(_) => SubmitOutcome::Internal,
            SubmitError::ResourceExhausted(_) => SubmitOutcome::RateLimited,
        }
    }
}

struct Metrics {
    submit_total: HashMap<SubmitOutcome, u64>,
}

static METRICS: OnceCell<Mutex<Metrics>> = OnceCell::new();

fn get() -> &'static Mutex<Metrics> {
    METRICS.get_or_init(|| {
        Mutex::new(Metrics {
            submit_total: HashMap::new(),
        })
    })
}

pub fn record_submit_outcome(outcome: SubmitOutcome) {
    // A poisoned counter map is still usable
    let mut m = get().lock().unwrap_or_else(|e| e.into_inner());
    *m.submit_total.entry(outcome).or_insert(0) += 1;
}

pub fn submit_count(outcome: SubmitOutcome) -> u64 {
    let m = get().lock().unwrap_or_else(|e| e.into_inner());
    m.submit_total.get(&outcome).copied().unwrap_or(0)
}

/// Counters plus storage usage for the database at `db_path`
pub fn snapshot_as_json(db_path: &str) -> Value {
    let submits: Vec<Value> = {
        let m = get().lock().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<_> = m.submit_total.iter().collect();
        entries.sort_by_key(|(outcome, _)| outcome.label());
        entries
            .into_iter()
            .map(|(outcome, count)| json!({ "outcome": outcome.label(), "count": count }))
            .collect()
    };

    let db_bytes = db_file_size(db_path);

    json!({
        "submit_total": submits,
        "storage": {
            "db_path": db_path,
            "db_size_mb": db_bytes.map(|b| round2(bytes_to_mb(b))),
            "free_storage_mb": filesystem_free_mb(db_path),
        }
    })
}

fn db_file_size(db_path: &str) -> Option<u64> {
    if db_path == MEMORY_DB {
        return None;
    }
    std::fs::metadata(db_path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64) / (1024.0 * 1024.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn filesystem_free_mb(db_path: &str) -> Option<f64> {
    use sysinfo::Disks;

    let path = std::path::Path::new(db_path).canonicalize().ok()?;
    let disks = Disks::new_with_refreshed_list();
    disks
        .iter()
        .filter(|d| path.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| round2(bytes_to_mb(d.available_space())))
}
