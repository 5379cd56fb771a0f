//! Interception for `reqwest` (enabled with the `reqwest` feature).
//!
//! This module provides:
//! - [`OutgoingRequest`] for [`reqwest::Request`]
//! - [`Handler`] for [`reqwest::Client`], executing the request
//! - [`JwtClient`] - A client that runs every request through a [`JwtInterceptor`]

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, IntoUrl, Method, Request, Response};
use thiserror::Error;
use tracing::debug;

use crate::interceptor::{InterceptError, JwtInterceptor};
use crate::request::{Handler, OutgoingRequest, RequestView};

impl RequestView for Request {
    fn url(&self) -> &str {
        Request::url(self).as_str()
    }

    fn method(&self) -> &str {
        Request::method(self).as_str()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }
}

impl OutgoingRequest for Request {
    fn duplicate(&self) -> Result<Self, InterceptError> {
        self.try_clone().ok_or_else(|| InterceptError::RequestNotCloneable {
            message: "streaming request bodies cannot be cloned".to_string(),
        })
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), InterceptError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| InterceptError::InvalidHeader {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| InterceptError::InvalidHeader {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        self.headers_mut().insert(header_name, header_value);
        Ok(())
    }
}

#[async_trait]
impl Handler<Request> for Client {
    type Output = reqwest::Result<Response>;

    async fn handle(&self, request: Request) -> Self::Output {
        self.execute(request).await
    }
}

/// Error type for [`JwtClient`] requests.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The interceptor refused or failed to prepare the request.
    #[error("interception failed: {0}")]
    Intercept(#[from] InterceptError),

    /// Building or sending the request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// An HTTP client that attaches credentials through a [`JwtInterceptor`].
#[derive(Debug, Clone)]
pub struct JwtClient {
    http: Client,
    interceptor: JwtInterceptor,
}

impl JwtClient {
    /// Create a client with a default `reqwest::Client`.
    pub fn new(interceptor: JwtInterceptor) -> Self {
        Self::with_client(Client::new(), interceptor)
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(http: Client, interceptor: JwtInterceptor) -> Self {
        Self { http, interceptor }
    }

    /// The interceptor in use.
    pub fn interceptor(&self) -> &JwtInterceptor {
        &self.interceptor
    }

    /// Send a request through the interceptor.
    ///
    /// The request is consumed and never cloned, so streaming bodies work.
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        debug!(method = %request.method(), url = %request.url(), "sending request");
        let response = self.interceptor.intercept_owned(request, &self.http).await??;
        Ok(response)
    }

    /// Build and send a request with an optional body.
    pub async fn request(
        &self,
        method: Method,
        url: impl IntoUrl,
        body: Option<String>,
    ) -> Result<Response, ClientError> {
        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        self.send(builder.build()?).await
    }

    /// Send a GET request.
    pub async fn get(&self, url: impl IntoUrl) -> Result<Response, ClientError> {
        self.request(Method::GET, url, None).await
    }

    /// Send a POST request with a body.
    pub async fn post(&self, url: impl IntoUrl, body: impl Into<String>) -> Result<Response, ClientError> {
        self.request(Method::POST, url, Some(body.into())).await
    }

    /// Send a PUT request with a body.
    pub async fn put(&self, url: impl IntoUrl, body: impl Into<String>) -> Result<Response, ClientError> {
        self.request(Method::PUT, url, Some(body.into())).await
    }

    /// Send a PATCH request with a body.
    pub async fn patch(&self, url: impl IntoUrl, body: impl Into<String>) -> Result<Response, ClientError> {
        self.request(Method::PATCH, url, Some(body.into())).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, url: impl IntoUrl) -> Result<Response, ClientError> {
        self.request(Method::DELETE, url, None).await
    }

    /// Send a HEAD request.
    pub async fn head(&self, url: impl IntoUrl) -> Result<Response, ClientError> {
        self.request(Method::HEAD, url, None).await
    }
}
