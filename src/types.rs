//! Core domain types shared across the crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identity assigned by the store on insert. Monotonic per database.
pub type BriefId = u64;

/// Identifier of a topical map (the collection briefs belong to).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(String);

impl MapId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a topic within a map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of batch work: a topic awaiting a brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
}

impl Topic {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: TopicId::new(id),
            title: title.into(),
        }
    }
}

/// Target collection captured at batch start. If the caller's active map
/// changes while the batch runs, the batch must notice and stop rather
/// than write into the wrong map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchContext {
    pub map_id: MapId,
}

/// Run-scoped progress counters. Reset at run start and again at run end
/// so a fresh run never inherits stale values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    pub cancelled: bool,
    pub current: usize,
    pub total: usize,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Provider output for one topic, prior to normalization and persistence.
///
/// `key_points` is declared one-or-many by the provider contract: it may
/// arrive as a single string, an array of strings, or an array mixing
/// strings with structured values. [`normalize_string_list`] flattens it
/// before the record is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedBrief {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub key_points: Value,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
    pub provider: String,
    pub model: String,
}

/// Flatten a one-or-many value into a uniform list of strings.
///
/// Strings pass through; any non-string entry is serialized to its textual
/// form. This is a hard invariant of the persistence contract: stored
/// briefs carry `Vec<String>` key points only.
pub fn normalize_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        other => vec![value_to_text(other)],
    }
}

fn value_to_text(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
