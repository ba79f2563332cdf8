//! Topic list import.
//!
//! Accepts the loose CSV-ish exports topical-map tools produce: one topic
//! per line, first field is the title, optional header row, `#` comments.
//! This is deliberately tolerant rather than a conforming CSV reader.

use crate::error::BriefError;
use crate::sanitize;
use crate::types::Topic;
use std::collections::HashSet;
use std::path::Path;

/// Parse a topic list from text. Ids are derived from titles via slugify;
/// duplicate ids keep the first occurrence.
pub fn parse_topics(text: &str) -> Result<Vec<Topic>, BriefError> {
    let mut topics = Vec::new();
    let mut seen = HashSet::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let title = first_field(line);
        if title.is_empty() {
            continue;
        }
        if line_no == 0 && is_header(&title) {
            continue;
        }

        let id = sanitize::slugify(&title);
        if id.is_empty() {
            return Err(BriefError::TopicImport(format!(
                "line {}: title '{}' produces an empty id",
                line_no + 1,
                title
            )));
        }
        if seen.insert(id.clone()) {
            topics.push(Topic::new(id, title));
        }
    }

    Ok(topics)
}

/// Load topics from a file on disk.
pub fn load_topics(path: &Path) -> Result<Vec<Topic>, BriefError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| BriefError::TopicImport(format!("cannot read {}: {}", path.display(), e)))?;
    let topics = parse_topics(&text)?;
    if topics.is_empty() {
        return Err(BriefError::TopicImport(format!(
            "{} contains no topics",
            path.display()
        )));
    }
    Ok(topics)
}

/// First comma-separated field, honoring a simple double-quoted form so
/// titles may contain commas.
fn first_field(line: &str) -> String {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            return rest[..end].trim().to_string();
        }
    }
    match line.find(',') {
        Some(idx) => line[..idx].trim().to_string(),
        None => line.to_string(),
    }
}

fn is_header(field: &str) -> bool {
    matches!(field.to_ascii_lowercase().as_str(), "title" | "topic" | "name")
}
