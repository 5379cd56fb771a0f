//! Token sources for the CLI.
//!
//! Tokens are read from an environment variable or a file, fresh on every
//! fetch, so rotating the file or variable takes effect on the next request.

use std::path::PathBuf;
use std::sync::Arc;

use jwtward_core::TokenSource;
use jwtward_core::token::{TokenFetch, from_fn};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Environment variable consulted when nothing else is configured.
pub const DEFAULT_TOKEN_ENV: &str = "JWTWARD_TOKEN";

/// The `[token]` table of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Environment variable holding the token.
    pub env: Option<String>,

    /// File holding the token. Takes precedence over `env`.
    pub file: Option<PathBuf>,
}

/// Where to read the token from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLocation {
    /// Read an environment variable.
    Env(String),

    /// Read a file; surrounding whitespace is trimmed.
    File(PathBuf),
}

impl TokenSettings {
    /// Pick the location: file, then env, then [`DEFAULT_TOKEN_ENV`].
    pub fn location(&self) -> TokenLocation {
        match (&self.file, &self.env) {
            (Some(file), _) => TokenLocation::File(file.clone()),
            (None, Some(env)) => TokenLocation::Env(env.clone()),
            (None, None) => TokenLocation::Env(DEFAULT_TOKEN_ENV.to_string()),
        }
    }
}

/// Build a token source reading from the given location.
pub fn token_source(location: TokenLocation) -> Arc<dyn TokenSource> {
    match location {
        TokenLocation::Env(name) => Arc::new(from_fn(move |_| {
            let value = std::env::var(&name).ok();
            trace!(var = %name, present = value.is_some(), "read token from environment");
            TokenFetch::Immediate(value.map(|v| v.trim().to_string()))
        })),
        TokenLocation::File(path) => Arc::new(from_fn(move |_| {
            let path = path.clone();
            TokenFetch::deferred(async move {
                match tokio::fs::read_to_string(&path).await {
                    Ok(contents) => Ok(Some(contents.trim().to_string())),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        debug!("token file {:?} does not exist", path);
                        Ok(None)
                    }
                    Err(e) => Err(e.into()),
                }
            })
        })),
    }
}

/// Build a token source that always returns the given value.
pub fn literal_source(token: String) -> Arc<dyn TokenSource> {
    Arc::new(from_fn(move |_| TokenFetch::ready(token.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_precedence() {
        let settings = TokenSettings::default();
        assert_eq!(settings.location(), TokenLocation::Env(DEFAULT_TOKEN_ENV.to_string()));

        let settings = TokenSettings {
            env: Some("MY_TOKEN".to_string()),
            file: None,
        };
        assert_eq!(settings.location(), TokenLocation::Env("MY_TOKEN".to_string()));

        let settings = TokenSettings {
            env: Some("MY_TOKEN".to_string()),
            file: Some(PathBuf::from("/tmp/token")),
        };
        assert_eq!(settings.location(), TokenLocation::File(PathBuf::from("/tmp/token")));
    }

    #[tokio::test]
    async fn test_unset_env_yields_no_token() {
        let source = token_source(TokenLocation::Env(
            "JWTWARD_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
        ));
        assert!(source.fetch(None).resolve().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_literal_source() {
        let source = literal_source("a.b.c".to_string());
        let token = source.fetch(None).resolve().await.unwrap().unwrap();
        assert_eq!(token.expose(), "a.b.c");
    }
}
