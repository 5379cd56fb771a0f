//! # jwtward Core
//!
//! Attach bearer credentials to outgoing HTTP requests, and inspect the
//! JWTs behind them.
//!
//! This crate provides:
//! - An unverified JWT payload decoder and `exp` evaluation
//! - A route classifier driven by allowed domains and disallowed routes
//! - [`JwtInterceptor`], which decides per request whether to attach a credential
//! - [`JwtHelper`], standalone decode/expiry helpers for guards and the like
//! - With the `reqwest` feature, a `reqwest` pipeline and [`JwtClient`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jwtward_core::{HttpRequest, InterceptorConfig, JwtInterceptor};
//! use jwtward_core::token::{from_fn, TokenFetch};
//!
//! let config = InterceptorConfig::builder(from_fn(|_| TokenFetch::ready(read_token())))
//!     .allowed_domain("api.example.com")
//!     .disallowed_route("https://api.example.com/login")
//!     .skip_when_expired(true)
//!     .build();
//!
//! let interceptor = JwtInterceptor::new(config);
//! let response = interceptor
//!     .intercept(&HttpRequest::get("https://api.example.com/items"), &transport)
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod helper;
pub mod interceptor;
pub mod jwt;
pub mod request;
pub mod route;
pub mod token;

#[cfg(feature = "reqwest")]
pub mod pipeline;

// Re-export commonly used types at crate root
pub use config::{
    AuthScheme,
    ConfigError,
    InterceptorConfig,
    InterceptorSettings,
    RuleSetting,
};

pub use error::JwtwardError;

pub use helper::{
    HelperError,
    JwtHelper,
};

pub use interceptor::{
    InterceptError,
    JwtInterceptor,
};

pub use jwt::{
    Claims,
    DecodeError,
};

pub use request::{
    Handler,
    HttpRequest,
    OutgoingRequest,
    RequestView,
};

pub use route::{
    RouteClassifier,
    RouteRule,
};

pub use token::{
    BearerToken,
    TokenFetch,
    TokenSource,
};

#[cfg(feature = "reqwest")]
pub use pipeline::{
    ClientError,
    JwtClient,
};
