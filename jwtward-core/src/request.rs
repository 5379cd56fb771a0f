//! The seams between the interceptor and the HTTP pipeline that owns requests.
//!
//! This module provides:
//! - [`RequestView`] - Read-only access to a request (URL, method, headers)
//! - [`OutgoingRequest`] - A request that can be copied with one header overridden
//! - [`Handler`] - The downstream pipeline stage that receives the request
//! - [`HttpRequest`] - A plain request type for pipelines without their own

use async_trait::async_trait;

use crate::interceptor::InterceptError;

/// Read-only view of an outgoing request.
pub trait RequestView {
    /// The target URL, absolute or relative to the document origin.
    fn url(&self) -> &str;

    /// The HTTP method.
    fn method(&self) -> &str;

    /// Look up a header value by name, ignoring ASCII case.
    fn header(&self, name: &str) -> Option<&str>;
}

/// A request owned by the external HTTP layer.
///
/// The interceptor never mutates a request in place. It asks for a copy with
/// one header set, so the caller's value stays untouched and can be reused.
pub trait OutgoingRequest: RequestView + Sized {
    /// Produce an unmodified copy of this request.
    fn duplicate(&self) -> Result<Self, InterceptError>;

    /// Set or overwrite a header on this request.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), InterceptError>;

    /// Produce a copy of this request with one header set or overwritten.
    fn with_header(&self, name: &str, value: &str) -> Result<Self, InterceptError> {
        let mut copy = self.duplicate()?;
        copy.set_header(name, value)?;
        Ok(copy)
    }
}

/// The next stage of the HTTP pipeline.
///
/// The interceptor calls [`handle`](Handler::handle) at most once per
/// interception and returns its output unchanged.
#[async_trait]
pub trait Handler<R: Send + 'static>: Send + Sync {
    /// Whatever the stage produces: a response, an acknowledgement, a result.
    type Output: Send;

    /// Forward the request.
    async fn handle(&self, request: R) -> Self::Output;
}

/// A minimal HTTP request.
///
/// Header names keep the casing they were set with but compare ignoring
/// ASCII case; setting a header replaces any existing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a request with the given method and URL.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Create a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Iterate over all headers in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The request body, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

impl RequestView for HttpRequest {
    fn url(&self) -> &str {
        &self.url
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl OutgoingRequest for HttpRequest {
    fn duplicate(&self) -> Result<Self, InterceptError> {
        Ok(self.clone())
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), InterceptError> {
        validate_header(name, value)?;
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }
}

/// RFC 7230 token characters for field names, no control characters in values.
fn validate_header(name: &str, value: &str) -> Result<(), InterceptError> {
    const SEPARATORS: &str = "()<>@,;:\\\"/[]?={} \t";

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_graphic() && !SEPARATORS.contains(c)) {
        return Err(InterceptError::InvalidHeader {
            name: name.to_string(),
            message: "not a valid header name".to_string(),
        });
    }

    if value.chars().any(|c| c.is_control() && c != '\t') {
        return Err(InterceptError::InvalidHeader {
            name: name.to_string(),
            message: "value contains control characters".to_string(),
        });
    }

    Ok(())
}
