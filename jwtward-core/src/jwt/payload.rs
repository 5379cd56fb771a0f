//! Token payload decoding.

use serde_json::Value;

use super::{Claims, DecodeError, url_base64_decode};

/// Decode the payload segment of a JWT into [`Claims`].
///
/// The token must split into exactly three non-empty dot-separated segments.
/// Only the middle segment is read; the signature is not checked.
///
/// # Errors
///
/// - [`DecodeError::InvalidTokenStructure`] for anything that is not three segments
/// - [`DecodeError::MalformedEncoding`] / [`DecodeError::MalformedPayload`] when the
///   payload segment cannot be decoded or is not a JSON object
/// - [`DecodeError::InvalidJson`] when the decoded payload is not JSON
pub fn decode_payload(token: &str) -> Result<Claims, DecodeError> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(DecodeError::InvalidTokenStructure {
            segments: parts.len(),
        });
    }

    let decoded = url_base64_decode(parts[1])?;

    match serde_json::from_str::<Value>(&decoded)? {
        Value::Object(map) => Ok(Claims::from(map)),
        other => Err(DecodeError::MalformedPayload {
            message: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
