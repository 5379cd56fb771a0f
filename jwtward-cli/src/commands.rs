//! Command implementations for the `jwtward` binary.
//!
//! Each command returns an [`Outcome`] instead of printing, so `main` owns
//! stdout and the exit code.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use jwtward_core::{InterceptorConfig, JwtClient, JwtHelper, JwtInterceptor, TokenFetch, jwt};
use reqwest::Method;
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::sources::{literal_source, token_source};

/// What a command printed and whether it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Text for stdout.
    pub output: String,

    /// `false` maps to exit code 1.
    pub success: bool,
}

impl Outcome {
    fn success(output: String) -> Self {
        Self {
            output,
            success: true,
        }
    }

    /// The process exit code for this outcome.
    pub fn exit_code(&self) -> ExitCode {
        if self.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// Arguments of the `request` command.
#[derive(Debug, Clone)]
pub struct RequestArgs {
    pub url: String,
    pub method: String,
    pub data: Option<String>,
    /// Overrides the configured token source.
    pub token: Option<String>,
}

/// A helper that falls back to the configured token source.
pub fn token_helper(config: &CliConfig) -> JwtHelper {
    JwtHelper::from_shared(token_source(config.token.location()))
}

/// Print a token's payload as `name: value` lines or pretty JSON.
pub async fn decode(helper: &JwtHelper, token: Option<String>, format: &str) -> Result<Outcome> {
    let claims = helper
        .decode_token_async(token.map(TokenFetch::from))
        .await
        .context("Failed to decode token")?
        .context("No token available")?;

    let output = match format {
        "json" => format!("{}\n", serde_json::to_string_pretty(&claims)?),
        "text" => claims
            .as_map()
            .iter()
            .map(|(name, value)| format!("{}: {}\n", name, value))
            .collect(),
        other => bail!("Unknown output format: {}", other),
    };
    Ok(Outcome::success(output))
}

/// Print the expiration instant relative to `now`, or "never".
pub async fn expiry(helper: &JwtHelper, token: Option<String>, now: DateTime<Utc>) -> Result<Outcome> {
    let claims = helper
        .decode_token_async(token.map(TokenFetch::from))
        .await
        .context("Failed to decode token")?
        .context("No token available")?;

    let output = match jwt::expiration_date(&claims).context("Failed to read expiration")? {
        Some(date) => {
            let remaining = (date - now).num_seconds();
            if remaining > 0 {
                format!("{} (in {}s)\n", date.to_rfc3339(), remaining)
            } else {
                format!("{} ({}s ago)\n", date.to_rfc3339(), -remaining)
            }
        }
        None => "never\n".to_string(),
    };
    Ok(Outcome::success(output))
}

/// Print `true`/`false`; an expired or missing token fails the command.
pub async fn is_expired(helper: &JwtHelper, token: Option<String>, offset: i64) -> Result<Outcome> {
    let expired = helper
        .is_token_expired_async(token.map(TokenFetch::from), offset)
        .await
        .context("Failed to decode token")?;

    Ok(Outcome {
        output: format!("{}\n", expired),
        success: !expired,
    })
}

/// Show how the configured routes classify a URL.
pub fn classify(config: &CliConfig, url: &str) -> Result<Outcome> {
    let interceptor = build_interceptor(config, None)?;
    let routes = interceptor.config().routes();

    let allowed = routes.is_allowed_domain(url);
    let disallowed = routes.is_disallowed_route(url);

    Ok(Outcome::success(format!(
        "allowed domain:    {}\ndisallowed route:  {}\neligible:          {}\n",
        allowed,
        disallowed,
        allowed && !disallowed
    )))
}

/// Send a request through the interceptor and report the response.
pub async fn send_request(config: &CliConfig, args: RequestArgs) -> Result<Outcome> {
    let interceptor = build_interceptor(config, args.token)?;
    let client = JwtClient::new(interceptor);
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {}", args.method))?;

    info!("{} {}", method, args.url);
    let response = client.request(method, args.url.as_str(), args.data).await?;
    let status = response.status();

    let mut output = format!("{}\n", status);
    let body = response.text().await?;
    if !body.is_empty() {
        output.push_str(&body);
        output.push('\n');
    }

    Ok(Outcome {
        output,
        success: status.is_success(),
    })
}

/// Build the interceptor from config, with an optional literal token override.
pub fn build_interceptor(config: &CliConfig, token: Option<String>) -> Result<JwtInterceptor> {
    let source = match token {
        Some(token) => literal_source(token),
        None => token_source(config.token.location()),
    };

    if let Some(path) = &config.config_path {
        debug!("Using configuration from {:?}", path);
    }

    let config = InterceptorConfig::from_settings(&config.interceptor, source)
        .context("Invalid interceptor configuration")?;
    Ok(JwtInterceptor::new(config))
}
