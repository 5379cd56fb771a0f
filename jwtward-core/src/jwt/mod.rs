//! Unverified JWT inspection.
//!
//! This module provides:
//! - [`url_base64_decode`] - base64url segment decoding with padding repair
//! - [`decode_payload`] - splitting a token and parsing its payload as [`Claims`]
//! - [`expiration_date`], [`is_expired`] - evaluation of the `exp` claim
//!
//! Nothing here verifies signatures. The payload is read as-is so callers can
//! decide whether a credential is worth sending, never whether to trust it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

mod base64url;
mod expiry;
mod payload;

pub use base64url::url_base64_decode;
pub use expiry::{expiration_date, is_expired, is_expired_at, token_expiration_date};
pub use payload::decode_payload;

/// Error type for token decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The base64url input has an impossible length or illegal characters.
    #[error("illegal base64url string: {message}")]
    MalformedEncoding { message: String },

    /// The token does not have exactly three non-empty dot-separated segments.
    #[error(
        "the inspected token doesn't appear to be a JWT: expected three non-empty segments, found {segments}"
    )]
    InvalidTokenStructure { segments: usize },

    /// The payload segment decoded to nothing usable.
    #[error("cannot decode the token payload: {message}")]
    MalformedPayload { message: String },

    /// The payload decoded to a string that is not JSON.
    #[error("token payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A well-known claim is present but has the wrong shape.
    #[error("invalid `{claim}` claim: {message}")]
    InvalidClaim {
        claim: &'static str,
        message: String,
    },
}

/// The decoded payload of a JWT.
///
/// A fresh value is produced by every [`decode_payload`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Look up a claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Check whether a claim is present, whatever its value.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// The `sub` claim, if it is a string.
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::Value;

    /// Build an unsigned token around the given payload.
    pub fn token_with_payload(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.c2lnbmF0dXJl")
    }
}
