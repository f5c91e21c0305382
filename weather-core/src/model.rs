use std::time::Duration;

use serde_json::Value;

use crate::error::ClientError;

/// A raw WeatherAPI.com response: status, round-trip time and the unparsed body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub elapsed: Duration,
    pub body: String,
}

impl ApiResponse {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<JsonBody, ClientError> {
        serde_json::from_str(&self.body)
            .map(JsonBody)
            .map_err(|source| ClientError::Json { snippet: truncate_body(&self.body), source })
    }
}

/// Weakly typed JSON tree with dotted-path lookup (`location.name`, `current.condition.text`).
///
/// A JSON `null` is reported as absent, the same as a missing key.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

impl JsonBody {
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.pointer(&to_pointer(path)).filter(|v| !v.is_null())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// String at `path`; numbers and booleans are rendered with their JSON text.
    pub fn string(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Array(_) | Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    pub fn list(&self, path: &str) -> Option<&Vec<Value>> {
        self.get(path)?.as_array()
    }
}

fn to_pointer(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    path.split('.')
        .map(|segment| segment.replace('~', "~0").replace('/', "~1"))
        .fold(String::new(), |mut acc, segment| {
            acc.push('/');
            acc.push_str(&segment);
            acc
        })
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
