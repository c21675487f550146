//! Filesystem-safe cleanup for individual path components.
//!
//! Values substituted into a naming template pass through here before they are
//! spliced into a library path, so a metadata value can never introduce a
//! character that is illegal on common filesystems.

use std::sync::LazyLock;

use regex::Regex;

/// Default maximum length of a sanitized component, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 245;

/// Characters that are invalid in filenames on at least one common filesystem.
#[allow(clippy::expect_used)]
static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("invalid chars regex is valid"));
#[allow(clippy::expect_used)]
static UNDERSCORE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("underscore run regex is valid"));

/// Sanitizes a string for use as a filename or path component.
///
/// Equivalent to [`sanitize_with_limit`] with [`DEFAULT_MAX_LENGTH`].
#[must_use]
pub fn sanitize(name: &str) -> String {
    sanitize_with_limit(name, DEFAULT_MAX_LENGTH)
}

/// Sanitizes a string for use as a filename or path component.
///
/// - Replaces `\ / : * ? " < > |` with `_`
/// - Strips leading and trailing whitespace and dots
/// - Collapses runs of underscores into one
/// - Truncates to `max_length` characters (not bytes)
///
/// Empty input yields an empty string.
#[must_use]
pub fn sanitize_with_limit(name: &str, max_length: usize) -> String {
    if name.is_empty() {
        return String::new();
    }

    let replaced = INVALID_CHARS.replace_all(name, "_");
    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    let collapsed = UNDERSCORE_RUN.replace_all(trimmed, "_");

    collapsed.chars().take(max_length).collect()
}
