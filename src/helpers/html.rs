//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Keep the first `length` characters of a string
pub fn truncate_chars(s: &str, length: usize) -> String {
    match s.char_indices().nth(length) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
