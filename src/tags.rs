//! Tag normalization
//!
//! Tags are stored and matched in exactly one form: trimmed, lowercased,
//! deduplicated. Both entry persistence and filter parsing go through this
//! module so that `" Rust "` on an entry and `rust` in a query agree.

use std::collections::BTreeSet;

/// Normalizes raw client-supplied tags into the canonical set
///
/// Empty strings (and strings that trim to empty) are dropped rather than
/// rejected.
pub fn normalize_tags<I>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = String>,
{
    raw.into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Parses the comma-separated `tags` query parameter into a normalized set
pub fn parse_tag_filter(raw: &str) -> BTreeSet<String> {
    normalize_tags(raw.split(',').map(str::to_string))
}
