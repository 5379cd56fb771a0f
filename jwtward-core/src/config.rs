//! Interceptor configuration.
//!
//! [`InterceptorConfig`] is the runtime configuration, immutable once built.
//! [`InterceptorSettings`] is its serializable counterpart, loaded from TOML
//! or JSON and combined with a [`TokenSource`] via
//! [`InterceptorConfig::from_settings`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::request::RequestView;
use crate::route::{RouteClassifier, RouteRule};
use crate::token::TokenSource;

/// Default header carrying the credential.
pub const DEFAULT_HEADER_NAME: &str = "Authorization";

/// Default prefix placed before the token.
pub const DEFAULT_AUTH_SCHEME: &str = "Bearer ";

/// Error type for configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A route pattern is not a valid regular expression.
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// The document origin is not an absolute URL.
    #[error("invalid origin `{origin}`: {source}")]
    InvalidOrigin {
        origin: String,
        source: url::ParseError,
    },
}

/// The scheme string placed before the token in the header value.
#[derive(Clone)]
pub enum AuthScheme {
    /// The same prefix for every request. May be empty.
    Static(String),

    /// A prefix computed from the request being intercepted.
    Dynamic(Arc<dyn Fn(&dyn RequestView) -> String + Send + Sync>),
}

impl AuthScheme {
    /// Create a scheme computed per request.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&dyn RequestView) -> String + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Get the scheme for a request.
    pub fn resolve(&self, request: &dyn RequestView) -> String {
        match self {
            Self::Static(scheme) => scheme.clone(),
            Self::Dynamic(select) => select(request),
        }
    }
}

impl Default for AuthScheme {
    fn default() -> Self {
        Self::Static(DEFAULT_AUTH_SCHEME.to_string())
    }
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(scheme) => f.debug_tuple("Static").field(scheme).finish(),
            Self::Dynamic(_) => write!(f, "Dynamic(..)"),
        }
    }
}

impl From<&str> for AuthScheme {
    fn from(scheme: &str) -> Self {
        Self::Static(scheme.to_string())
    }
}

impl From<String> for AuthScheme {
    fn from(scheme: String) -> Self {
        Self::Static(scheme)
    }
}

/// Runtime configuration of the interceptor.
///
/// Resolved once at construction and shared read-only afterwards.
pub struct InterceptorConfig {
    token_source: Arc<dyn TokenSource>,
    header_name: String,
    auth_scheme: AuthScheme,
    routes: RouteClassifier,
    throw_no_token_error: bool,
    skip_when_expired: bool,
}

impl InterceptorConfig {
    /// Start building a configuration around a token source.
    pub fn builder(token_source: impl TokenSource + 'static) -> InterceptorConfigBuilder {
        InterceptorConfigBuilder::new(Arc::new(token_source))
    }

    /// Start building a configuration around a shared token source.
    pub fn builder_shared(token_source: Arc<dyn TokenSource>) -> InterceptorConfigBuilder {
        InterceptorConfigBuilder::new(token_source)
    }

    /// Build a configuration from serializable settings.
    pub fn from_settings(
        settings: &InterceptorSettings,
        token_source: Arc<dyn TokenSource>,
    ) -> Result<Self, ConfigError> {
        let allowed = settings
            .allowed_domains
            .iter()
            .map(RuleSetting::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let disallowed = settings
            .disallowed_routes
            .iter()
            .map(RuleSetting::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = Self::builder_shared(token_source)
            .header_name(settings.header_name.clone())
            .auth_scheme(settings.auth_scheme.clone())
            .allowed_domains(allowed)
            .disallowed_routes(disallowed)
            .throw_no_token_error(settings.throw_no_token_error)
            .skip_when_expired(settings.skip_when_expired);

        if let Some(origin) = &settings.origin {
            let parsed = Url::parse(origin).map_err(|source| ConfigError::InvalidOrigin {
                origin: origin.clone(),
                source,
            })?;
            builder = builder.origin(parsed);
        }

        Ok(builder.build())
    }

    /// The configured token source.
    pub fn token_source(&self) -> &Arc<dyn TokenSource> {
        &self.token_source
    }

    /// The header carrying the credential.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// The scheme placed before the token.
    pub fn auth_scheme(&self) -> &AuthScheme {
        &self.auth_scheme
    }

    /// The allow-list / deny-list classifier.
    pub fn routes(&self) -> &RouteClassifier {
        &self.routes
    }

    /// Whether a missing token fails the interception.
    pub fn throw_no_token_error(&self) -> bool {
        self.throw_no_token_error
    }

    /// Whether expired tokens are withheld.
    pub fn skip_when_expired(&self) -> bool {
        self.skip_when_expired
    }
}

impl fmt::Debug for InterceptorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorConfig")
            .field("header_name", &self.header_name)
            .field("auth_scheme", &self.auth_scheme)
            .field("routes", &self.routes)
            .field("throw_no_token_error", &self.throw_no_token_error)
            .field("skip_when_expired", &self.skip_when_expired)
            .finish_non_exhaustive()
    }
}

/// Builder for [`InterceptorConfig`].
pub struct InterceptorConfigBuilder {
    token_source: Arc<dyn TokenSource>,
    header_name: String,
    auth_scheme: AuthScheme,
    allowed_domains: Vec<RouteRule>,
    disallowed_routes: Vec<RouteRule>,
    origin: Option<Url>,
    throw_no_token_error: bool,
    skip_when_expired: bool,
}

impl InterceptorConfigBuilder {
    fn new(token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            token_source,
            header_name: DEFAULT_HEADER_NAME.to_string(),
            auth_scheme: AuthScheme::default(),
            allowed_domains: Vec::new(),
            disallowed_routes: Vec::new(),
            origin: None,
            throw_no_token_error: false,
            skip_when_expired: false,
        }
    }

    /// Set the header carrying the credential.
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Set the scheme placed before the token. An empty string sends the bare token.
    pub fn auth_scheme(mut self, scheme: impl Into<AuthScheme>) -> Self {
        self.auth_scheme = scheme.into();
        self
    }

    /// Add one allowed domain.
    pub fn allowed_domain(mut self, rule: impl Into<RouteRule>) -> Self {
        self.allowed_domains.push(rule.into());
        self
    }

    /// Add several allowed domains.
    pub fn allowed_domains<I, T>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RouteRule>,
    {
        self.allowed_domains.extend(rules.into_iter().map(Into::into));
        self
    }

    /// Add one disallowed route.
    pub fn disallowed_route(mut self, rule: impl Into<RouteRule>) -> Self {
        self.disallowed_routes.push(rule.into());
        self
    }

    /// Add several disallowed routes.
    pub fn disallowed_routes<I, T>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RouteRule>,
    {
        self.disallowed_routes.extend(rules.into_iter().map(Into::into));
        self
    }

    /// Set the origin of the document issuing requests.
    pub fn origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Fail the interception when no token is available.
    pub fn throw_no_token_error(mut self, enabled: bool) -> Self {
        self.throw_no_token_error = enabled;
        self
    }

    /// Forward requests without a credential when the token is expired.
    pub fn skip_when_expired(mut self, enabled: bool) -> Self {
        self.skip_when_expired = enabled;
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> InterceptorConfig {
        let mut routes = RouteClassifier::new(self.allowed_domains, self.disallowed_routes);
        if let Some(origin) = self.origin {
            routes = routes.with_origin(origin);
        }

        InterceptorConfig {
            token_source: self.token_source,
            header_name: self.header_name,
            auth_scheme: self.auth_scheme,
            routes,
            throw_no_token_error: self.throw_no_token_error,
            skip_when_expired: self.skip_when_expired,
        }
    }
}

/// A route rule as written in a settings file.
///
/// Plain strings are exact rules; `{ pattern = "..." }` tables are regexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    Exact(String),
    Pattern { pattern: String },
}

impl RuleSetting {
    /// Turn the setting into a rule, compiling patterns.
    pub fn compile(&self) -> Result<RouteRule, ConfigError> {
        match self {
            Self::Exact(value) => Ok(RouteRule::exact(value.clone())),
            Self::Pattern { pattern } => RouteRule::pattern(pattern),
        }
    }
}

/// Serializable interceptor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorSettings {
    /// Header carrying the credential.
    pub header_name: String,

    /// Prefix placed before the token.
    pub auth_scheme: String,

    /// Domains eligible for credential injection.
    pub allowed_domains: Vec<RuleSetting>,

    /// Routes exempted even when their domain is allowed.
    pub disallowed_routes: Vec<RuleSetting>,

    /// Fail when no token is available.
    pub throw_no_token_error: bool,

    /// Withhold expired tokens.
    pub skip_when_expired: bool,

    /// Origin of the document issuing requests.
    pub origin: Option<String>,
}

impl Default for InterceptorSettings {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_HEADER_NAME.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            allowed_domains: Vec::new(),
            disallowed_routes: Vec::new(),
            throw_no_token_error: false,
            skip_when_expired: false,
            origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpRequest;
    use crate::token::{TokenFetch, from_fn};

    fn source() -> Arc<dyn TokenSource> {
        Arc::new(from_fn(|_| TokenFetch::none()))
    }

    #[test]
    fn test_builder_defaults() {
        let config = InterceptorConfig::builder(from_fn(|_| TokenFetch::none())).build();

        assert_eq!(config.header_name(), "Authorization");
        assert!(matches!(config.auth_scheme(), AuthScheme::Static(s) if s == "Bearer "));
        assert!(config.routes().allowed_domains().is_empty());
        assert!(config.routes().disallowed_routes().is_empty());
        assert!(!config.throw_no_token_error());
        assert!(!config.skip_when_expired());
    }

    #[test]
    fn test_dynamic_scheme_sees_request() {
        let scheme = AuthScheme::dynamic(|request| {
            if request.url().contains("/legacy/") {
                "Token ".to_string()
            } else {
                "Bearer ".to_string()
            }
        });

        assert_eq!(scheme.resolve(&HttpRequest::get("/legacy/items")), "Token ");
        assert_eq!(scheme.resolve(&HttpRequest::get("/v2/items")), "Bearer ");
    }

    #[test]
    fn test_settings_from_json() {
        let settings: InterceptorSettings = serde_json::from_str(
            r#"{
                "allowed_domains": ["api.example.com", {"pattern": "^.*\\.example\\.org$"}],
                "skip_when_expired": true
            }"#,
        )
        .unwrap();

        assert_eq!(settings.header_name, "Authorization");
        assert_eq!(settings.auth_scheme, "Bearer ");
        assert_eq!(
            settings.allowed_domains,
            vec![
                RuleSetting::Exact("api.example.com".to_string()),
                RuleSetting::Pattern {
                    pattern: r"^.*\.example\.org$".to_string()
                },
            ]
        );
        assert!(settings.skip_when_expired);

        let config = InterceptorConfig::from_settings(&settings, source()).unwrap();
        assert!(config.routes().is_allowed_domain("https://api.example.com/x"));
        assert!(config.routes().is_allowed_domain("https://cdn.example.org/x"));
        assert!(config.skip_when_expired());
    }

    #[test]
    fn test_settings_empty_scheme_is_kept() {
        let settings = InterceptorSettings {
            auth_scheme: String::new(),
            ..Default::default()
        };
        let config = InterceptorConfig::from_settings(&settings, source()).unwrap();
        assert!(matches!(config.auth_scheme(), AuthScheme::Static(s) if s.is_empty()));
    }

    #[test]
    fn test_settings_invalid_pattern() {
        let settings = InterceptorSettings {
            disallowed_routes: vec![RuleSetting::Pattern {
                pattern: "(".to_string(),
            }],
            ..Default::default()
        };
        let err = InterceptorConfig::from_settings(&settings, source()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_settings_invalid_origin() {
        let settings = InterceptorSettings {
            origin: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = InterceptorConfig::from_settings(&settings, source()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin { .. }));
    }
}
