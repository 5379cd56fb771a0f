//! The request interception decision procedure.
//!
//! For every outgoing request the interceptor runs one linear pass:
//!
//! ```text
//! classify ──ineligible──▶ forward unmodified
//!    │
//!    ▼
//! fetch token ──none──▶ NoToken error (if configured) | forward unmodified
//!    │
//!    ▼
//! expired? ──yes, skip_when_expired──▶ forward unmodified
//!    │
//!    ▼
//! attach `header: scheme + token` to a copy ──▶ forward
//! ```
//!
//! There are no retries. Dropping the returned future before the token
//! resolves abandons the request: nothing is forwarded.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::InterceptorConfig;
use crate::jwt::{self, DecodeError};
use crate::request::{Handler, OutgoingRequest, RequestView};
use crate::token::{BearerToken, SourceError};

/// Error type for interception.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// No token was available and the configuration requires one.
    #[error("could not get token from the token source")]
    NoToken,

    /// The token source failed.
    #[error("token source failed: {0}")]
    TokenSource(#[source] SourceError),

    /// The token could not be decoded while checking its expiration.
    #[error("failed to inspect token: {0}")]
    Decode(#[from] DecodeError),

    /// The header name or value cannot be placed on the request.
    #[error("invalid header `{name}`: {message}")]
    InvalidHeader { name: String, message: String },

    /// The request cannot be copied, e.g. because its body is a stream.
    #[error("request cannot be cloned: {message}")]
    RequestNotCloneable { message: String },
}

/// Outcome of the decision procedure for one request.
enum Decision {
    /// Forward the request unmodified.
    Forward,

    /// Set the configured header to this value.
    Attach(String),
}

/// Attaches bearer credentials to eligible outgoing requests.
///
/// Cloning is cheap; clones share the same immutable configuration.
///
/// # Example
///
/// ```rust,ignore
/// use jwtward_core::{InterceptorConfig, JwtInterceptor, HttpRequest};
/// use jwtward_core::token::{from_fn, TokenFetch};
///
/// let config = InterceptorConfig::builder(from_fn(|_| TokenFetch::ready(load_token())))
///     .allowed_domain("api.example.com")
///     .build();
/// let interceptor = JwtInterceptor::new(config);
///
/// let response = interceptor
///     .intercept(&HttpRequest::get("https://api.example.com/items"), &transport)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct JwtInterceptor {
    config: Arc<InterceptorConfig>,
}

impl JwtInterceptor {
    /// Create an interceptor from its configuration.
    pub fn new(config: InterceptorConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    /// Check whether a request is eligible for credential injection.
    pub fn should_intercept(&self, request: &dyn RequestView) -> bool {
        self.config.routes().is_eligible(request.url())
    }

    /// Run the decision procedure and forward the result to `next`.
    ///
    /// `next` is called at most once and its output is returned unchanged.
    /// The caller's request is never modified.
    ///
    /// # Errors
    ///
    /// Fails without forwarding when the token source fails, when no token is
    /// available and `throw_no_token_error` is set, when expiry checking
    /// cannot decode the token, or when the header cannot be applied.
    pub async fn intercept<R, N>(&self, request: &R, next: &N) -> Result<N::Output, InterceptError>
    where
        R: OutgoingRequest + Send + 'static,
        N: Handler<R> + ?Sized,
    {
        let outgoing = self.prepare(request).await?;
        Ok(next.handle(outgoing).await)
    }

    /// Like [`intercept`](Self::intercept), but takes ownership of the request.
    ///
    /// The request is never duplicated, so requests that cannot be cloned
    /// (streaming bodies) still go through.
    pub async fn intercept_owned<R, N>(&self, request: R, next: &N) -> Result<N::Output, InterceptError>
    where
        R: OutgoingRequest + Send + 'static,
        N: Handler<R> + ?Sized,
    {
        let outgoing = self.prepare_owned(request).await?;
        Ok(next.handle(outgoing).await)
    }

    /// Run the decision procedure and return the request that would be forwarded.
    pub async fn prepare<R>(&self, request: &R) -> Result<R, InterceptError>
    where
        R: OutgoingRequest,
    {
        match self.decide(request).await? {
            Decision::Forward => request.duplicate(),
            Decision::Attach(value) => request.with_header(self.config.header_name(), &value),
        }
    }

    /// Run the decision procedure on an owned request, setting the header in place.
    pub async fn prepare_owned<R>(&self, mut request: R) -> Result<R, InterceptError>
    where
        R: OutgoingRequest,
    {
        if let Decision::Attach(value) = self.decide(&request).await? {
            request.set_header(self.config.header_name(), &value)?;
        }
        Ok(request)
    }

    async fn decide<R>(&self, request: &R) -> Result<Decision, InterceptError>
    where
        R: RequestView,
    {
        if !self.should_intercept(request) {
            trace!(url = request.url(), "request not eligible for a credential");
            return Ok(Decision::Forward);
        }

        let fetch = {
            let view: &dyn RequestView = request;
            self.config.token_source().fetch(Some(view))
        };
        let token = fetch.resolve().await.map_err(InterceptError::TokenSource)?;

        let Some(token) = token else {
            if self.config.throw_no_token_error() {
                return Err(InterceptError::NoToken);
            }
            debug!(url = request.url(), "no token available, forwarding without credential");
            return Ok(Decision::Forward);
        };

        if self.config.skip_when_expired() && self.is_expired(&token)? {
            debug!(url = request.url(), "token expired, forwarding without credential");
            return Ok(Decision::Forward);
        }

        let scheme = self.config.auth_scheme().resolve(request);
        trace!(
            url = request.url(),
            header = self.config.header_name(),
            "attaching credential"
        );
        Ok(Decision::Attach(format!("{}{}", scheme, token.expose())))
    }

    fn is_expired(&self, token: &BearerToken) -> Result<bool, DecodeError> {
        jwt::is_expired(Some(token.expose()), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthScheme;
    use crate::jwt::testing::token_with_payload;
    use crate::request::HttpRequest;
    use crate::token::{TokenFetch, from_fn};
    use serde_json::json;

    fn interceptor_with(token: &'static str) -> JwtInterceptor {
        JwtInterceptor::new(
            InterceptorConfig::builder(from_fn(move |_| TokenFetch::ready(token)))
                .allowed_domain("allowed.com")
                .build(),
        )
    }

    #[tokio::test]
    async fn test_prepare_attaches_bearer_header() {
        let interceptor = interceptor_with("T");
        let request = HttpRequest::get("http://allowed.com/api/x");

        let prepared = interceptor.prepare(&request).await.unwrap();

        assert_eq!(prepared.header("Authorization"), Some("Bearer T"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[tokio::test]
    async fn test_prepare_skips_other_domains() {
        let interceptor = interceptor_with("T");
        let prepared = interceptor
            .prepare(&HttpRequest::get("http://other.com/x"))
            .await
            .unwrap();
        assert_eq!(prepared.header("Authorization"), None);
    }

    #[tokio::test]
    async fn test_prepare_custom_header_and_empty_scheme() {
        let config = InterceptorConfig::builder(from_fn(|_| TokenFetch::ready("T")))
            .header_name("X-Auth-Token")
            .auth_scheme("")
            .build();
        let prepared = JwtInterceptor::new(config)
            .prepare(&HttpRequest::get("/relative"))
            .await
            .unwrap();

        assert_eq!(prepared.header("X-Auth-Token"), Some("T"));
        assert_eq!(prepared.header("Authorization"), None);
    }

    #[tokio::test]
    async fn test_prepare_dynamic_scheme() {
        let config = InterceptorConfig::builder(from_fn(|_| TokenFetch::ready("T")))
            .auth_scheme(AuthScheme::dynamic(|request| {
                if request.method() == "POST" {
                    "Signed ".to_string()
                } else {
                    "Bearer ".to_string()
                }
            }))
            .build();
        let interceptor = JwtInterceptor::new(config);

        let post = interceptor.prepare(&HttpRequest::post("/x")).await.unwrap();
        let get = interceptor.prepare(&HttpRequest::get("/x")).await.unwrap();

        assert_eq!(post.header("Authorization"), Some("Signed T"));
        assert_eq!(get.header("Authorization"), Some("Bearer T"));
    }

    #[tokio::test]
    async fn test_prepare_skip_when_expired_decode_error() {
        let config = InterceptorConfig::builder(from_fn(|_| TokenFetch::ready("opaque-token")))
            .skip_when_expired(true)
            .build();
        let err = JwtInterceptor::new(config)
            .prepare(&HttpRequest::get("/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, InterceptError::Decode(DecodeError::InvalidTokenStructure { .. })));
    }

    #[tokio::test]
    async fn test_prepare_skip_when_expired_keeps_valid_token() {
        let token = token_with_payload(&json!({"exp": chrono::Utc::now().timestamp() + 3600}));
        let expected = format!("Bearer {}", token);
        let config = InterceptorConfig::builder(from_fn(move |_| TokenFetch::ready(token.clone())))
            .skip_when_expired(true)
            .build();

        let prepared = JwtInterceptor::new(config)
            .prepare(&HttpRequest::get("/x"))
            .await
            .unwrap();
        assert_eq!(prepared.header("Authorization"), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn test_prepare_propagates_source_failure() {
        let config = InterceptorConfig::builder(from_fn(|_| TokenFetch::failed("vault sealed"))).build();
        let err = JwtInterceptor::new(config)
            .prepare(&HttpRequest::get("/x"))
            .await
            .unwrap_err();

        assert!(matches!(err, InterceptError::TokenSource(_)));
        assert_eq!(err.to_string(), "token source failed: vault sealed");
    }

    /// A request whose body can only be sent once.
    #[derive(Debug)]
    struct OneShotRequest {
        url: String,
        authorization: Option<String>,
    }

    impl RequestView for OneShotRequest {
        fn url(&self) -> &str {
            &self.url
        }

        fn method(&self) -> &str {
            "POST"
        }

        fn header(&self, name: &str) -> Option<&str> {
            if name.eq_ignore_ascii_case("authorization") {
                self.authorization.as_deref()
            } else {
                None
            }
        }
    }

    impl OutgoingRequest for OneShotRequest {
        fn duplicate(&self) -> Result<Self, InterceptError> {
            Err(InterceptError::RequestNotCloneable {
                message: "one-shot body".to_string(),
            })
        }

        fn set_header(&mut self, _name: &str, value: &str) -> Result<(), InterceptError> {
            self.authorization = Some(value.to_string());
            Ok(())
        }
    }

    fn one_shot(url: &str) -> OneShotRequest {
        OneShotRequest {
            url: url.to_string(),
            authorization: None,
        }
    }

    #[tokio::test]
    async fn test_prepare_owned_never_duplicates() {
        let interceptor = interceptor_with("T");

        let passed = interceptor.prepare_owned(one_shot("http://other.com/upload")).await.unwrap();
        assert_eq!(passed.header("Authorization"), None);

        let signed = interceptor.prepare_owned(one_shot("http://allowed.com/upload")).await.unwrap();
        assert_eq!(signed.header("Authorization"), Some("Bearer T"));

        let err = interceptor
            .prepare(&one_shot("http://other.com/upload"))
            .await
            .unwrap_err();
        assert!(matches!(err, InterceptError::RequestNotCloneable { .. }));
    }

    #[tokio::test]
    async fn test_prepare_owned_without_token_passes_through() {
        let config = InterceptorConfig::builder(from_fn(|_| TokenFetch::none()))
            .allowed_domain("allowed.com")
            .build();
        let passed = JwtInterceptor::new(config)
            .prepare_owned(one_shot("http://allowed.com/upload"))
            .await
            .unwrap();
        assert_eq!(passed.header("Authorization"), None);
    }
}
