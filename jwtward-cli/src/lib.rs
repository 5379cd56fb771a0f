//! Support library for the `jwtward` binary: configuration loading, token
//! sources and the command implementations.

pub mod commands;
pub mod config;
pub mod sources;

pub use commands::{Outcome, RequestArgs};
pub use config::{CliConfig, load_config};
pub use sources::{TokenLocation, TokenSettings, literal_source, token_source};
