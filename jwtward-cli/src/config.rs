//! CLI configuration handling.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use jwtward_core::InterceptorSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sources::TokenSettings;

/// Contents of `jwtward.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Interceptor settings, written at the top level of the file.
    #[serde(flatten)]
    pub interceptor: InterceptorSettings,

    /// Where the token comes from.
    #[serde(default)]
    pub token: TokenSettings,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Load configuration from an explicit path, the default location, or defaults.
///
/// An explicit path must exist; a missing default file falls back to defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<CliConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_path(),
    };

    if explicit.is_none() && !path.exists() {
        return Ok(CliConfig::default());
    }

    let mut config = load_from_path(&path)?;
    config.config_path = Some(path);
    Ok(config)
}

/// Read and parse a configuration file.
pub fn load_from_path(path: &Path) -> Result<CliConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse config from {:?}", path))
}

/// Default location of `jwtward.toml`.
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("jwtward.toml"))
        .unwrap_or_else(|| PathBuf::from("jwtward.toml"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "jwtward", "jwtward")
}
