//! jwtward CLI
//!
//! Command-line interface for inspecting JWTs and sending requests through
//! the credential interceptor.
//!
//! # Usage
//!
//! ```bash
//! # Print a token's payload
//! jwtward decode eyJhbGciOi...
//!
//! # Check expiry with a 30 second safety margin
//! jwtward is-expired eyJhbGciOi... --offset 30
//!
//! # Same check against the token the configured source currently holds
//! jwtward is-expired
//!
//! # See whether a URL would receive a credential under the current config
//! jwtward classify https://api.example.com/items
//!
//! # Send a request with the configured token attached
//! JWTWARD_TOKEN=eyJhbGciOi... jwtward request https://api.example.com/items
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use jwtward_cli::commands::{self, RequestArgs};
use jwtward_cli::load_config;
use jwtward_core::JwtHelper;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "jwtward")]
#[command(about = "Inspect JWTs and send requests with bearer credentials")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the payload of a token
    Decode {
        /// The token to decode (defaults to the configured source)
        token: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print when a token expires
    Expiry {
        /// The token to inspect (defaults to the configured source)
        token: Option<String>,
    },

    /// Check whether a token is expired (exit code 1 when it is)
    IsExpired {
        /// The token to inspect (defaults to the configured source)
        token: Option<String>,

        /// Treat the token as expired this many seconds early
        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },

    /// Show whether a URL would receive a credential
    Classify {
        /// Request URL, absolute or relative
        url: String,
    },

    /// Send a request through the interceptor
    Request {
        /// Request URL
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request body
        #[arg(short, long)]
        data: Option<String>,

        /// Use this token instead of the configured source
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.as_deref();
    let outcome = match cli.command {
        Commands::Decode { token, format } => {
            let helper = helper_for(config_path, &token)?;
            commands::decode(&helper, token, &format).await?
        }
        Commands::Expiry { token } => {
            let helper = helper_for(config_path, &token)?;
            commands::expiry(&helper, token, Utc::now()).await?
        }
        Commands::IsExpired { token, offset } => {
            let helper = helper_for(config_path, &token)?;
            commands::is_expired(&helper, token, offset).await?
        }
        Commands::Classify { url } => commands::classify(&load_config(config_path)?, &url)?,
        Commands::Request {
            url,
            method,
            data,
            token,
        } => {
            let config = load_config(config_path)?;
            let args = RequestArgs {
                url,
                method,
                data,
                token,
            };
            commands::send_request(&config, args).await?
        }
    };

    print!("{}", outcome.output);
    Ok(outcome.exit_code())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// An explicit token needs no config; otherwise read the configured source.
fn helper_for(config_path: Option<&Path>, token: &Option<String>) -> Result<JwtHelper> {
    if token.is_some() {
        return Ok(JwtHelper::new());
    }
    Ok(commands::token_helper(&load_config(config_path)?))
}
