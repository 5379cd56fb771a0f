//! Deciding which outgoing requests receive a credential.
//!
//! A request is eligible when its host is on the allow-list (or it targets
//! the document's own origin) and it does not match any deny-list route.

use regex::Regex;
use tracing::trace;
use url::{ParseError, Url};

use crate::config::ConfigError;

/// Ports that are never appended to the host when matching allowed domains.
const STANDARD_PORTS: [u16; 2] = [80, 443];

/// Placeholder base used to normalize relative URLs when no origin is configured.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Host of [`RELATIVE_BASE`]. A joined URL keeps it only when the input named no host.
const RELATIVE_HOST: &str = "relative.invalid";

/// A single allow-list or deny-list entry.
#[derive(Debug, Clone)]
pub enum RouteRule {
    /// Compared for exact equality.
    Exact(String),

    /// Tested anywhere in the compared string.
    Pattern(Regex),
}

impl RouteRule {
    /// Create an exact-match rule.
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    /// Compile a pattern rule.
    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Exact(value) => value == candidate,
            Self::Pattern(regex) => regex.is_match(candidate),
        }
    }
}

impl From<&str> for RouteRule {
    fn from(value: &str) -> Self {
        Self::exact(value)
    }
}

impl From<String> for RouteRule {
    fn from(value: String) -> Self {
        Self::exact(value)
    }
}

impl From<Regex> for RouteRule {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

impl PartialEq for RouteRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// Where a request URL points once resolved.
#[derive(Debug)]
enum Target {
    /// An absolute URL, possibly resolved against the document origin.
    Absolute(Url),

    /// A relative URL with no origin to resolve against.
    Relative(Url),

    /// Not a URL at all.
    Invalid,
}

impl Target {
    fn hostname(&self) -> Option<&str> {
        match self {
            Self::Absolute(url) => url.host_str(),
            Self::Relative(_) | Self::Invalid => None,
        }
    }

    fn path(&self) -> Option<String> {
        match self {
            Self::Absolute(url) | Self::Relative(url) => Some(match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            }),
            Self::Invalid => None,
        }
    }
}

/// Classifies request URLs against an allow-list of domains and a deny-list
/// of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteClassifier {
    allowed_domains: Vec<RouteRule>,
    disallowed_routes: Vec<RouteRule>,
    origin: Option<Url>,
}

impl RouteClassifier {
    /// Create a classifier with no document origin.
    pub fn new(allowed_domains: Vec<RouteRule>, disallowed_routes: Vec<RouteRule>) -> Self {
        Self {
            allowed_domains,
            disallowed_routes,
            origin: None,
        }
    }

    /// Set the origin of the document issuing requests.
    ///
    /// Relative URLs resolve against it, and requests to it are always allowed.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The allow-list.
    pub fn allowed_domains(&self) -> &[RouteRule] {
        &self.allowed_domains
    }

    /// The deny-list.
    pub fn disallowed_routes(&self) -> &[RouteRule] {
        &self.disallowed_routes
    }

    /// The document origin, if configured.
    pub fn origin(&self) -> Option<&Url> {
        self.origin.as_ref()
    }

    /// Check whether the request targets an allowed domain.
    ///
    /// Same-origin requests are always allowed: relative URLs without a
    /// configured origin, and any URL whose origin equals the configured one.
    /// Otherwise the host (with `:port` for non-standard ports) must equal an
    /// exact rule or match a pattern rule.
    pub fn is_allowed_domain(&self, url: &str) -> bool {
        match self.resolve(url) {
            Target::Relative(_) => true,
            Target::Invalid => {
                trace!(url, "unparseable request URL is not an allowed domain");
                false
            }
            Target::Absolute(target) => {
                if self.is_same_origin(&target) {
                    return true;
                }

                match host_with_port(&target) {
                    Some(host) => self.allowed_domains.iter().any(|rule| rule.matches(&host)),
                    None => false,
                }
            }
        }
    }

    /// Check whether the request matches a deny-list route.
    ///
    /// Pattern rules are tested against the full request URL. Exact rules are
    /// resolved like the request and match when hostname and path (with
    /// query) are both equal.
    pub fn is_disallowed_route(&self, url: &str) -> bool {
        let requested = self.resolve(url);

        self.disallowed_routes.iter().any(|rule| match rule {
            RouteRule::Pattern(regex) => regex.is_match(url),
            RouteRule::Exact(route) => {
                let route = self.resolve(route);
                match (requested.path(), route.path()) {
                    (Some(requested_path), Some(route_path)) => {
                        requested.hostname() == route.hostname() && requested_path == route_path
                    }
                    _ => false,
                }
            }
        })
    }

    /// Check whether the request should receive a credential.
    pub fn is_eligible(&self, url: &str) -> bool {
        self.is_allowed_domain(url) && !self.is_disallowed_route(url)
    }

    fn is_same_origin(&self, target: &Url) -> bool {
        self.origin
            .as_ref()
            .is_some_and(|origin| origin.origin() == target.origin())
    }

    fn resolve(&self, raw: &str) -> Target {
        match Url::parse(raw) {
            Ok(url) => Target::Absolute(url),
            Err(ParseError::RelativeUrlWithoutBase) => {
                if let Some(origin) = &self.origin {
                    return origin.join(raw).map(Target::Absolute).unwrap_or(Target::Invalid);
                }

                let joined = Url::parse(RELATIVE_BASE).and_then(|base| base.join(raw));
                // Scheme-relative inputs (`//host`, `/\\host`, ` //host`) replace the host.
                match joined {
                    Ok(url) if url.host_str() == Some(RELATIVE_HOST) => Target::Relative(url),
                    Ok(url) => Target::Absolute(url),
                    Err(_) => Target::Invalid,
                }
            }
            Err(_) => Target::Invalid,
        }
    }
}

/// The hostname, suffixed with `:port` when the port is explicit and non-standard.
fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) if !STANDARD_PORTS.contains(&port) => format!("{}:{}", host, port),
        _ => host.to_string(),
    })
}
