//! Error types for the brief generation system.

use crate::types::BriefId;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Brief not found: {0}")]
    BriefNotFound(BriefId),

    #[error("Invalid store key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Domain errors for brief generation and batch orchestration
#[derive(Debug, Error)]
pub enum BriefError {
    #[error("No active map selected: {0}")]
    MissingContext(String),

    #[error("Topic import failed: {0}")]
    TopicImport(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Invalid brief payload: {0}")]
    InvalidBriefPayload(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for BriefError {
    fn from(err: config::ConfigError) -> Self {
        BriefError::ConfigError(err.to_string())
    }
}
