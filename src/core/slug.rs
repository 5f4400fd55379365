//! Stable slugs for section anchors.
//!
//! Report section ids double as HTML anchor targets, so the same country
//! name must always produce the same slug.

/// Converts a free-text name into a lowercase, hyphen-separated slug.
///
/// Runs of non-alphanumeric characters collapse into a single hyphen and
/// leading/trailing hyphens are dropped. Returns an empty string when the
/// input has no alphanumeric characters.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
