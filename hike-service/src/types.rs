//! Types for HTTP requests and responses

use serde::Serialize;
use serde_json::Value;

pub const SUCCESS_MESSAGE: &str = "Data submitted successfully!";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub doc_id: String,
}

impl SubmitResponse {
    pub fn stored(doc_id: String) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            doc_id,
        }
    }
}

/// Strip the `{"data": {...}}` wrapper used by callable clients; bare
/// payloads pass through unchanged.
pub fn unwrap_callable(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.len() == 1 && map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    }
}
