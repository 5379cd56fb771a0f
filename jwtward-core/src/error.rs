//! Top-level error types for jwtward.

use thiserror::Error;

use crate::config::ConfigError;
use crate::helper::HelperError;
use crate::interceptor::InterceptError;
use crate::jwt::DecodeError;

/// Top-level error type encompassing all jwtward errors.
#[derive(Debug, Error)]
pub enum JwtwardError {
    /// Error from decoding a token.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error from intercepting a request.
    #[error("interception error: {0}")]
    Intercept(#[from] InterceptError),

    /// Error from the standalone helpers.
    #[error("helper error: {0}")]
    Helper(#[from] HelperError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
