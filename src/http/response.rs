//! Response classification.

use reqwest::StatusCode;
use serde_json::{Map, Value};

/// Message used when the server gives no reason.
pub const GENERIC_FAILURE: &str = "Request failed";

/// What a received response means for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 2xx with its parsed body
    Success(Value),
    /// 401: the session is no longer valid
    Unauthorized,
    /// Any other status, with the message to surface
    Rejected { status: u16, message: String },
}

/// Classify a response by status, parsing the body as needed.
///
/// An empty (or `null`) success body becomes `{}`; a success body that is
/// not JSON is returned as a string.
pub fn classify(status: StatusCode, body: &[u8]) -> Outcome {
    if status.is_success() {
        return Outcome::Success(parse_body(body));
    }
    if status == StatusCode::UNAUTHORIZED {
        return Outcome::Unauthorized;
    }
    Outcome::Rejected {
        status: status.as_u16(),
        message: server_message(body).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
    }
}

fn parse_body(body: &[u8]) -> Value {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return Value::Object(Map::new());
    }
    match serde_json::from_str(text) {
        Ok(Value::Null) => Value::Object(Map::new()),
        Ok(value) => value,
        Err(_) => Value::String(text.to_string()),
    }
}

/// Non-empty `message` field of a JSON error body.
fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = value.get("message")?.as_str()?.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
