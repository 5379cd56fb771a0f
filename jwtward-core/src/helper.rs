//! Standalone token helpers for use outside the interceptor, e.g. by a
//! router guard deciding whether a session is still usable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::jwt::{self, Claims, DecodeError};
use crate::token::{SourceError, TokenFetch, TokenSource};

/// Error type for helper operations.
#[derive(Debug, Error)]
pub enum HelperError {
    /// The token source failed.
    #[error("token source failed: {0}")]
    TokenSource(#[source] SourceError),

    /// The configured source only produces its token asynchronously.
    #[error("token source is deferred; use the async helper instead")]
    DeferredToken,

    /// The token could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Decodes tokens and evaluates their expiration.
///
/// Every helper takes an explicit token or, when given `None`, asks the
/// configured [`TokenSource`]. The synchronous helpers accept only immediate
/// values from the source; the `_async` helpers resolve any [`TokenFetch`]
/// and then apply exactly the same computation.
#[derive(Clone, Default)]
pub struct JwtHelper {
    source: Option<Arc<dyn TokenSource>>,
}

impl JwtHelper {
    /// Create a helper without a token source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a helper that falls back to the given source.
    pub fn with_source(source: impl TokenSource + 'static) -> Self {
        Self {
            source: Some(Arc::new(source)),
        }
    }

    /// Create a helper sharing an existing source, e.g. an interceptor's.
    pub fn from_shared(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Decode a token's payload. An empty token decodes to `None`.
    pub fn decode_token(&self, token: Option<&str>) -> Result<Option<Claims>, HelperError> {
        let token = self.immediate(token)?;
        decode_present(token.as_deref())
    }

    /// Get a token's expiration instant. `None` for an empty token or one without `exp`.
    pub fn token_expiration_date(
        &self,
        token: Option<&str>,
    ) -> Result<Option<DateTime<Utc>>, HelperError> {
        let token = self.immediate(token)?;
        expiration_of(token.as_deref())
    }

    /// Check whether a token is expired. An empty token counts as expired.
    pub fn is_token_expired(
        &self,
        token: Option<&str>,
        offset_seconds: i64,
    ) -> Result<bool, HelperError> {
        let token = self.immediate(token)?;
        Ok(jwt::is_expired(token.as_deref(), offset_seconds)?)
    }

    /// Check that the source currently holds a token that has not expired.
    ///
    /// Undecodable tokens and source failures count as expired.
    pub fn token_not_expired(&self) -> bool {
        match self.is_token_expired(None, 0) {
            Ok(expired) => !expired,
            Err(e) => {
                debug!("treating token as expired: {}", e);
                false
            }
        }
    }

    /// Async form of [`decode_token`](Self::decode_token).
    pub async fn decode_token_async(
        &self,
        token: Option<TokenFetch>,
    ) -> Result<Option<Claims>, HelperError> {
        let token = self.resolve(token).await?;
        decode_present(token.as_deref())
    }

    /// Async form of [`token_expiration_date`](Self::token_expiration_date).
    pub async fn token_expiration_date_async(
        &self,
        token: Option<TokenFetch>,
    ) -> Result<Option<DateTime<Utc>>, HelperError> {
        let token = self.resolve(token).await?;
        expiration_of(token.as_deref())
    }

    /// Async form of [`is_token_expired`](Self::is_token_expired).
    pub async fn is_token_expired_async(
        &self,
        token: Option<TokenFetch>,
        offset_seconds: i64,
    ) -> Result<bool, HelperError> {
        let token = self.resolve(token).await?;
        Ok(jwt::is_expired(token.as_deref(), offset_seconds)?)
    }

    /// Async form of [`token_not_expired`](Self::token_not_expired).
    pub async fn token_not_expired_async(&self) -> bool {
        match self.is_token_expired_async(None, 0).await {
            Ok(expired) => !expired,
            Err(e) => {
                debug!("treating token as expired: {}", e);
                false
            }
        }
    }

    fn current(&self) -> TokenFetch {
        match &self.source {
            Some(source) => source.fetch(None),
            None => TokenFetch::none(),
        }
    }

    fn immediate(&self, token: Option<&str>) -> Result<Option<String>, HelperError> {
        match token {
            Some(token) => Ok(Some(token.to_string())),
            None => match self.current() {
                TokenFetch::Immediate(value) => Ok(value),
                _ => Err(HelperError::DeferredToken),
            },
        }
    }

    async fn resolve(&self, token: Option<TokenFetch>) -> Result<Option<String>, HelperError> {
        let fetch = token.unwrap_or_else(|| self.current());
        let token = fetch.resolve().await.map_err(HelperError::TokenSource)?;
        Ok(token.map(|t| t.into_inner()))
    }
}

impl std::fmt::Debug for JwtHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtHelper")
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

fn decode_present(token: Option<&str>) -> Result<Option<Claims>, HelperError> {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => Ok(Some(jwt::decode_payload(token)?)),
        None => Ok(None),
    }
}

fn expiration_of(token: Option<&str>) -> Result<Option<DateTime<Utc>>, HelperError> {
    match decode_present(token)? {
        Some(claims) => Ok(jwt::expiration_date(&claims)?),
        None => Ok(None),
    }
}
