//! Token values and the sources that supply them.
//!
//! This module provides:
//! - [`BearerToken`] - A raw token value that is redacted in logs
//! - [`TokenFetch`] - The result of asking a source for a token, ready or deferred
//! - [`TokenSource`] - Trait for anything that can supply a token per request
//! - [`from_fn`] - Adapter turning a closure into a [`TokenSource`]

use std::future::Future;

use futures::StreamExt;
use futures::future::{self, BoxFuture};
use futures::stream::{BoxStream, Stream};

use crate::request::RequestView;

/// Error raised by a token source while producing a token.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// A raw token value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](BearerToken::expose).
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the token value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the token and return the inner value.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BearerToken([REDACTED])")
    }
}

impl std::fmt::Display for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// What a [`TokenSource`] hands back for a single request.
///
/// Whatever the shape, [`resolve()`](TokenFetch::resolve) is the one path that
/// turns it into a token, so callers never branch on how the value arrives.
pub enum TokenFetch {
    /// A value known right away; `None` means no token is available.
    Immediate(Option<String>),

    /// A value that becomes available later.
    Deferred(BoxFuture<'static, Result<Option<String>, SourceError>>),

    /// An asynchronous stream of values; only the first item is used.
    Stream(BoxStream<'static, Result<String, SourceError>>),
}

impl TokenFetch {
    /// A token available right away.
    pub fn ready(token: impl Into<String>) -> Self {
        Self::Immediate(Some(token.into()))
    }

    /// No token available.
    pub fn none() -> Self {
        Self::Immediate(None)
    }

    /// A token produced by a future.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<Option<String>, SourceError>> + Send + 'static,
    {
        Self::Deferred(Box::pin(future))
    }

    /// A token taken from the first item of a stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String, SourceError>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }

    /// A source failure, surfaced when the fetch is resolved.
    pub fn failed(error: impl Into<SourceError>) -> Self {
        Self::Deferred(Box::pin(future::ready(Err(error.into()))))
    }

    /// Check whether resolving this fetch will suspend.
    pub fn is_deferred(&self) -> bool {
        !matches!(self, Self::Immediate(_))
    }

    /// Wait for the token value.
    ///
    /// Empty strings are treated the same as an absent token. A stream that
    /// ends without producing an item yields `None`.
    pub async fn resolve(self) -> Result<Option<BearerToken>, SourceError> {
        let raw = match self {
            Self::Immediate(value) => value,
            Self::Deferred(pending) => pending.await?,
            Self::Stream(mut stream) => stream.next().await.transpose()?,
        };

        Ok(raw.filter(|t| !t.is_empty()).map(BearerToken::new))
    }
}

impl std::fmt::Debug for TokenFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(Some(_)) => write!(f, "TokenFetch::Immediate([REDACTED])"),
            Self::Immediate(None) => write!(f, "TokenFetch::Immediate(None)"),
            Self::Deferred(_) => write!(f, "TokenFetch::Deferred(..)"),
            Self::Stream(_) => write!(f, "TokenFetch::Stream(..)"),
        }
    }
}

impl From<String> for TokenFetch {
    fn from(token: String) -> Self {
        Self::Immediate(Some(token))
    }
}

impl From<&str> for TokenFetch {
    fn from(token: &str) -> Self {
        Self::Immediate(Some(token.to_string()))
    }
}

impl From<Option<String>> for TokenFetch {
    fn from(token: Option<String>) -> Self {
        Self::Immediate(token)
    }
}

/// Trait for supplying the raw token attached to outgoing requests.
///
/// Sources are invoked once per interception and never cached, so a
/// credential refreshed between two requests is honored. The request is
/// passed as context when one is being intercepted; helper calls pass `None`.
pub trait TokenSource: Send + Sync {
    /// Produce the token for the given request.
    fn fetch(&self, request: Option<&dyn RequestView>) -> TokenFetch;
}

/// A [`TokenSource`] backed by a closure. Built with [`from_fn`].
pub struct FnSource<F>(F);

impl<F> TokenSource for FnSource<F>
where
    F: Fn(Option<&dyn RequestView>) -> TokenFetch + Send + Sync,
{
    fn fetch(&self, request: Option<&dyn RequestView>) -> TokenFetch {
        (self.0)(request)
    }
}

impl<F> std::fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}

/// Create a [`TokenSource`] from a closure.
///
/// # Example
///
/// ```
/// use jwtward_core::token::{TokenFetch, from_fn};
///
/// let source = from_fn(|_request| TokenFetch::ready("header.payload.signature"));
/// ```
pub fn from_fn<F>(f: F) -> FnSource<F>
where
    F: Fn(Option<&dyn RequestView>) -> TokenFetch + Send + Sync,
{
    FnSource(f)
}
