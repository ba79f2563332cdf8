//! XDG path resolution for global configuration and provider profiles.

use crate::error::BriefError;
use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs, BriefError> {
    ProjectDirs::from("", "", "briefsmith").ok_or_else(|| {
        BriefError::ConfigError("Unable to determine home directory for config paths".to_string())
    })
}

/// Directory holding the global config file.
pub fn config_dir() -> Result<PathBuf, BriefError> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Global config file: `$XDG_CONFIG_HOME/briefsmith/config.toml`.
pub fn global_config_file() -> Result<PathBuf, BriefError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Directory holding per-provider TOML profiles.
pub fn providers_dir() -> Result<PathBuf, BriefError> {
    Ok(config_dir()?.join("providers"))
}
