//! Expiration evaluation for the `exp` claim.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::{Claims, DecodeError, decode_payload};

/// Get the instant described by the `exp` claim.
///
/// Returns `None` when the claim is absent, meaning the token never expires.
/// Fractional seconds are truncated.
pub fn expiration_date(claims: &Claims) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let Some(exp) = claims.get("exp") else {
        return Ok(None);
    };

    let seconds = match exp {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        _ => None,
    }
    .ok_or_else(|| DecodeError::InvalidClaim {
        claim: "exp",
        message: format!("expected seconds since the epoch, found {}", exp),
    })?;

    DateTime::from_timestamp(seconds, 0)
        .map(Some)
        .ok_or_else(|| DecodeError::InvalidClaim {
            claim: "exp",
            message: format!("{} is out of range", seconds),
        })
}

/// Decode a token and get its expiration instant.
pub fn token_expiration_date(token: &str) -> Result<Option<DateTime<Utc>>, DecodeError> {
    expiration_date(&decode_payload(token)?)
}

/// Check whether a token is expired, relative to the current time.
///
/// See [`is_expired_at`].
pub fn is_expired(token: Option<&str>, offset_seconds: i64) -> Result<bool, DecodeError> {
    is_expired_at(token, offset_seconds, Utc::now())
}

/// Check whether a token is expired at `now + offset_seconds`.
///
/// - an absent or empty token counts as expired
/// - a token without an `exp` claim never expires
/// - otherwise the token is expired when its expiration instant is at or
///   before the offset-adjusted instant
///
/// A positive offset treats tokens as expired slightly early; a negative
/// offset tolerates tokens slightly past their expiry.
pub fn is_expired_at(
    token: Option<&str>,
    offset_seconds: i64,
    now: DateTime<Utc>,
) -> Result<bool, DecodeError> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Ok(true);
    };

    let Some(expires_at) = token_expiration_date(token)? else {
        return Ok(false);
    };

    let threshold = Duration::try_seconds(offset_seconds).and_then(|d| now.checked_add_signed(d));

    Ok(match threshold {
        Some(threshold) => expires_at <= threshold,
        // Offsets beyond the representable range push the threshold to either end of time.
        None => offset_seconds > 0,
    })
}
