//! Configuration system.
//!
//! Hierarchical configuration merged from built-in defaults, the global
//! XDG config file, the workspace file, and CLI overrides, with runtime
//! validation. Provider profiles live as individual TOML files under the
//! XDG config directory.

use crate::error::BriefError;
use crate::logging::LoggingConfig;
use crate::provider::profile::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod business;
mod merge;
pub mod paths;
mod sources;

pub use business::{merge_layers, BusinessContext, BusinessContextLayer};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BriefsmithConfig {
    /// Active topical map briefs are generated into
    pub active_map: Option<String>,

    /// Model provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Business context layered on top of built-in defaults
    #[serde(default)]
    pub business: BusinessContextLayer,

    /// System-wide settings
    #[serde(default)]
    pub system: SystemConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// System-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Storage paths
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the sled database holding brief records
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".briefsmith/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String, String),
    System(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::System(msg) => write!(f, "System: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl BriefsmithConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, provider) in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(name.clone(), e));
            }
        }

        if self.system.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::System(
                "Store path cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Fully merged business context (defaults < global < workspace).
    pub fn business_context(&self, cli_layer: Option<&BusinessContextLayer>) -> BusinessContext {
        let mut layers = vec![self.business.clone()];
        if let Some(cli) = cli_layer {
            layers.push(cli.clone());
        }
        merge_layers(&layers)
    }
}

/// Load configuration for a workspace.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(workspace_root: &Path) -> Result<BriefsmithConfig, BriefError> {
        let mut builder = merge::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder)?;
        builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let config = builder.build()?;
        let loaded: BriefsmithConfig = config.try_deserialize().map_err(BriefError::from)?;
        Ok(loaded)
    }
}
