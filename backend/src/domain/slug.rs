//! Slug validation predicates shared by group identifiers.
//!
//! Slugs are trimmed, non-empty identifiers composed of lowercase ASCII
//! letters, digits, and hyphens. They never start or end with a hyphen.

/// Longest slug accepted in an upgrade path.
pub(crate) const SLUG_MAX_LEN: usize = 64;

/// Return `true` when `value` is a valid group slug.
pub(crate) fn is_valid_slug(value: &str) -> bool {
    is_bounded_non_empty(value) && has_allowed_slug_chars(value) && !has_edge_hyphen(value)
}

fn is_bounded_non_empty(value: &str) -> bool {
    !value.is_empty() && value.len() <= SLUG_MAX_LEN
}

fn has_allowed_slug_chars(value: &str) -> bool {
    value
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

fn has_edge_hyphen(value: &str) -> bool {
    value.starts_with('-') || value.ends_with('-')
}
