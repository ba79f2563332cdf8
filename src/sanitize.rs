//! Post-processing utilities for briefs: slugs, headings, templates, and
//! the final fixup pass applied to a persisted record before it is handed
//! to the state layer.

use crate::images;
use crate::store::BriefRecord;
use unicode_normalization::UnicodeNormalization;

/// Number of image slots stubbed onto a brief that has none.
const DEFAULT_IMAGE_SLOTS: usize = 1;

/// Turn arbitrary text into a lowercase ASCII slug.
///
/// Unicode is NFKD-folded first so accented characters contribute their
/// base letter instead of disappearing.
pub fn slugify(input: &str) -> String {
    let folded: String = input.nfkd().filter(char::is_ascii).collect();
    let mut slug = String::with_capacity(folded.len());
    let mut last_dash = true;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Strip markdown heading markers and list numbering, trim, drop empties.
pub fn normalize_headings(headings: Vec<String>) -> Vec<String> {
    headings
        .into_iter()
        .map(|h| {
            let trimmed = h.trim().trim_start_matches('#').trim_start();
            let without_numbering = trimmed
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim_start();
            without_numbering.to_string()
        })
        .filter(|h| !h.is_empty())
        .collect()
}

/// Replace `{name}` placeholders. Unknown placeholders are left as-is so a
/// typo in a template is visible in the output rather than silently blank.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (name, value) in vars {
        rendered = rendered.replace(&format!("{{{}}}", name), value);
    }
    rendered
}

/// Final fixup pass for a persisted brief: slug fallback, whitespace
/// trims, heading normalization, case-insensitive keyword dedupe, image
/// stubs for briefs that came back without any.
pub fn finalize_brief(mut record: BriefRecord) -> BriefRecord {
    record.title = record.title.trim().to_string();
    record.meta_description = record.meta_description.trim().to_string();

    record.slug = slugify(&record.slug);
    if record.slug.is_empty() {
        record.slug = slugify(&record.title);
    }

    record.headings = normalize_headings(record.headings);

    let mut seen = std::collections::HashSet::new();
    let mut keywords = Vec::with_capacity(record.keywords.len());
    for kw in &record.keywords {
        let trimmed = kw.trim();
        if !trimmed.is_empty() && seen.insert(trimmed.to_lowercase()) {
            keywords.push(trimmed.to_string());
        }
    }
    record.keywords = keywords;

    if record.images.is_empty() {
        record.images = images::placeholders(&record.title, &record.slug, DEFAULT_IMAGE_SLOTS);
    }

    record
}
