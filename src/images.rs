//! Placeholder image metadata for briefs.
//!
//! Real asset selection happens outside this tool; briefs carry stub
//! entries so downstream consumers know how many image slots a draft has
//! and what alt text to start from.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    /// File stem a downstream exporter should use, derived from the slug.
    pub file_stem: String,
    /// Starting alt text, derived from the brief title.
    pub alt: String,
    /// 1-based position within the article body.
    pub position: usize,
}

/// Build `count` placeholder entries for a brief.
pub fn placeholders(title: &str, slug: &str, count: usize) -> Vec<ImageMeta> {
    (1..=count)
        .map(|position| ImageMeta {
            file_stem: format!("{}-{}", slug, position),
            alt: title.to_string(),
            position,
        })
        .collect()
}
