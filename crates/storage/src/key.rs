//! Blob key naming.

use chrono::Utc;

/// Build a storage key of the form `<unix-millis>-<sanitized name>`.
///
/// Path separators and anything outside `[A-Za-z0-9._-]` become `_`, so the
/// key is safe as both a file name and an object path segment.
pub fn blob_key(suggested_name: &str) -> String {
    blob_key_at(Utc::now().timestamp_millis(), suggested_name)
}

pub(crate) fn blob_key_at(millis: i64, suggested_name: &str) -> String {
    let sanitized: String = suggested_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    let name = if sanitized.is_empty() { "blob" } else { sanitized };
    format!("{millis}-{name}")
}
