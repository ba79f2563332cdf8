//! Provider profiles: named TOML configurations that resolve to clients.

use crate::config::paths;
use crate::error::BriefError;
use crate::provider::{AnthropicBriefClient, BriefProvider, CompletionOptions, OpenAiBriefClient};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    /// OpenAI-compatible server at a custom endpoint (Ollama, llama.cpp, ...)
    LocalCustom,
}

/// One named provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name the profile is registered under; defaults to the file stem.
    pub provider_name: Option<String>,
    pub provider_type: ProviderType,
    pub model: String,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    #[serde(default)]
    pub default_options: CompletionOptions,
}

impl ProviderConfig {
    /// Validate the profile without performing network calls.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("endpoint '{}' is not a valid URL", endpoint));
            }
        }
        match self.provider_type {
            ProviderType::OpenAI | ProviderType::Anthropic => {
                if self.api_key.as_deref().map(str::trim).unwrap_or("").is_empty() {
                    return Err("api_key is required for hosted providers".to_string());
                }
            }
            ProviderType::LocalCustom => {
                if self.endpoint.is_none() {
                    return Err("endpoint is required for local providers".to_string());
                }
            }
        }
        Ok(())
    }

    /// Build a client for this profile.
    pub fn create_client(&self, name: &str) -> Result<Arc<dyn BriefProvider>, BriefError> {
        self.validate()
            .map_err(|e| BriefError::ProviderNotConfigured(format!("{}: {}", name, e)))?;
        let client: Arc<dyn BriefProvider> = match self.provider_type {
            ProviderType::OpenAI => Arc::new(OpenAiBriefClient::new(
                name.to_string(),
                self.model.clone(),
                self.api_key.clone(),
                self.endpoint.clone(),
                self.default_options.clone(),
            )?),
            ProviderType::Anthropic => Arc::new(AnthropicBriefClient::new(
                name.to_string(),
                self.model.clone(),
                self.api_key.clone().unwrap_or_default(),
                self.default_options.clone(),
            )?),
            ProviderType::LocalCustom => Arc::new(OpenAiBriefClient::new(
                name.to_string(),
                self.model.clone(),
                self.api_key.clone(),
                self.endpoint.clone(),
                self.default_options.clone(),
            )?),
        };
        Ok(client)
    }
}

fn profile_path(name: &str) -> Result<PathBuf, BriefError> {
    Ok(paths::providers_dir()?.join(format!("{}.toml", name)))
}

/// Load one provider profile by name from the XDG providers directory.
pub fn load_profile(name: &str) -> Result<ProviderConfig, BriefError> {
    let path = profile_path(name)?;
    let raw = std::fs::read_to_string(&path).map_err(|e| {
        BriefError::ProviderNotConfigured(format!(
            "provider '{}' not found at {}: {}",
            name,
            path.display(),
            e
        ))
    })?;
    let mut profile: ProviderConfig = toml::from_str(&raw)
        .map_err(|e| BriefError::ConfigError(format!("invalid provider profile '{}': {}", name, e)))?;
    if profile.provider_name.is_none() {
        profile.provider_name = Some(name.to_string());
    }
    Ok(profile)
}

/// Persist a provider profile.
pub fn save_profile(name: &str, profile: &ProviderConfig) -> Result<PathBuf, BriefError> {
    let dir = paths::providers_dir()?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| BriefError::ConfigError(format!("failed to create {}: {}", dir.display(), e)))?;
    let path = profile_path(name)?;
    let raw = toml::to_string_pretty(profile)
        .map_err(|e| BriefError::ConfigError(format!("failed to serialize profile: {}", e)))?;
    std::fs::write(&path, raw)
        .map_err(|e| BriefError::ConfigError(format!("failed to write {}: {}", path.display(), e)))?;
    Ok(path)
}

/// Names of all profiles present in the providers directory.
pub fn list_profiles() -> Result<Vec<String>, BriefError> {
    let dir = paths::providers_dir()?;
    let mut names = Vec::new();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(names),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
