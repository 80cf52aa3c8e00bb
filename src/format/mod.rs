//! Body formatter - turns author-supplied post text into HTML
//!
//! Newlines become `<br>` markers, bare image URLs become inline images and
//! any other bare http(s) URL becomes a link. All remaining text is escaped.

use lazy_static::lazy_static;
use regex::Regex;

use crate::helpers::{html_escape, truncate_chars};

/// Characters of raw body kept in list-view summaries
pub const SUMMARY_LENGTH: usize = 500;

/// Marker inserted for each newline
pub const LINE_BREAK: &str = "<br>";

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\S+").unwrap();
    static ref URL: Regex = Regex::new(r"^https?://\S+$").unwrap();
    static ref IMAGE_URL: Regex = Regex::new(r"^https?://\S+\.(?:jpg|png|gif)$").unwrap();
}

/// Format a full post body
pub fn format_body(raw: &str) -> String {
    raw.split('\n')
        .map(|line| format_line(line.strip_suffix('\r').unwrap_or(line)))
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

/// Format the first `length` characters of a body for list views
///
/// The cut is made on the raw text, so it can land inside a URL.
pub fn summarize(raw: &str, length: usize) -> String {
    format_body(&truncate_chars(raw, length))
}

/// Format the default-length summary of a body
pub fn summarize_body(raw: &str) -> String {
    summarize(raw, SUMMARY_LENGTH)
}

fn format_line(line: &str) -> String {
    let mut html = String::with_capacity(line.len());
    let mut last = 0;

    for token in TOKEN.find_iter(line) {
        html.push_str(&html_escape(&line[last..token.start()]));
        html.push_str(&format_token(token.as_str()));
        last = token.end();
    }
    html.push_str(&html_escape(&line[last..]));

    html
}

fn format_token(token: &str) -> String {
    if IMAGE_URL.is_match(token) {
        format!(r#"<img src="{}">"#, html_escape(token))
    } else if URL.is_match(token) {
        let url = html_escape(token);
        format!(r#"<a href="{}">{}</a>"#, url, url)
    } else {
        html_escape(token)
    }
}
