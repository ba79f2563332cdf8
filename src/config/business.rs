//! Business context layering.
//!
//! Several partial sources can each define a subset of the business
//! context fields. Precedence is a fixed, documented list and is merged
//! field-by-field, later layer wins:
//!
//!   1. built-in defaults
//!   2. global config file
//!   3. workspace / map file
//!   4. CLI overrides
//!
//! The order is load-bearing: callers build the layer list in exactly this
//! order and must not reorder it.

use serde::{Deserialize, Serialize};

/// Fully resolved business context handed to the provider per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessContext {
    pub domain: String,
    pub audience: String,
    pub tone: String,
    pub language: String,
}

impl Default for BusinessContext {
    fn default() -> Self {
        Self {
            domain: String::new(),
            audience: "general readers".to_string(),
            tone: "informative".to_string(),
            language: "en".to_string(),
        }
    }
}

impl BusinessContext {
    /// A context is usable once the domain is known; everything else has
    /// a default.
    pub fn is_complete(&self) -> bool {
        !self.domain.trim().is_empty()
    }
}

/// One partial source of business context fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessContextLayer {
    pub domain: Option<String>,
    pub audience: Option<String>,
    pub tone: Option<String>,
    pub language: Option<String>,
}

/// Merge layers over the built-in defaults. Field-by-field, later wins.
pub fn merge_layers(layers: &[BusinessContextLayer]) -> BusinessContext {
    let mut merged = BusinessContext::default();
    for layer in layers {
        if let Some(domain) = &layer.domain {
            merged.domain = domain.clone();
        }
        if let Some(audience) = &layer.audience {
            merged.audience = audience.clone();
        }
        if let Some(tone) = &layer.tone {
            merged.tone = tone.clone();
        }
        if let Some(language) = &layer.language {
            merged.language = language.clone();
        }
    }
    merged
}
