//! Shared header parsing and formatting.
//!
//! # Header Formats
//!
//! | Header | Format | Example |
//! |--------|--------|---------|
//! | Accept-Charset | comma-separated, optional `;q=` weights | `UTF-8, ISO-8859-1;q=0.5` |
//! | Accept-Encoding | comma-separated | `gzip, deflate` |
//! | Content-Type | media type with optional charset | `text/xml; charset="UTF-8"` |
//!
//! # Examples
//!
//! ```
//! use http_rpc::protocol::{format_content_type, parse_charset_list, parse_content_type};
//!
//! let charsets = parse_charset_list("utf-8, ISO-8859-1;q=0.5");
//! assert_eq!(charsets, vec!["UTF-8", "ISO-8859-1"]);
//!
//! let header = format_content_type("text/xml", Some("UTF-8"));
//! assert_eq!(header, "text/xml; charset=UTF-8");
//!
//! let (mime, charset) = parse_content_type(r#"text/xml; charset="utf-8""#);
//! assert_eq!(mime, "text/xml");
//! assert_eq!(charset.as_deref(), Some("UTF-8"));
//! ```

/// Parse a comma-separated list of charset labels.
///
/// Labels are trimmed and uppercased; quality parameters and empty items are dropped.
pub fn parse_charset_list(value: &str) -> Vec<String> {
    parse_token_list(value)
        .into_iter()
        .map(|token| token.to_ascii_uppercase())
        .collect()
}

/// Parse a comma-separated token list such as `Accept-Encoding`.
///
/// Tokens are trimmed and lowercased; quality parameters and empty items are dropped.
pub fn parse_token_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|part| {
            let token = part.split(';').next().unwrap_or("").trim();
            if token.is_empty() {
                None
            } else {
                Some(token.to_ascii_lowercase())
            }
        })
        .collect()
}

/// Join list items into a header value.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| item.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a `Content-Type` value.
#[inline]
pub fn format_content_type(mime: &str, charset: Option<&str>) -> String {
    match charset {
        Some(charset) if !charset.is_empty() => format!("{}; charset={}", mime, charset),
        _ => mime.to_string(),
    }
}

/// Split a `Content-Type` value into its media type and uppercased charset.
pub fn parse_content_type(value: &str) -> (String, Option<String>) {
    let mut parts = value.split(';');
    let mime = parts.next().unwrap_or("").trim().to_ascii_lowercase();

    let charset = parts.find_map(|param| {
        let (key, val) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let val = val.trim().trim_matches('"').trim();
            (!val.is_empty()).then(|| val.to_ascii_uppercase())
        } else {
            None
        }
    });

    (mime, charset)
}
