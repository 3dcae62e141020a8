//! Helpers for building responses.

use crate::Headers;

/// The headers the server sends with responses it generates itself.
///
/// ```
/// let headers = raw_h1::response::default_headers(12);
/// assert_eq!(headers.get("content-length"), Some("12"));
/// assert_eq!(headers.get("connection"), Some("close"));
/// assert_eq!(headers.get("content-type"), Some("text/plain"));
/// ```
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Length", content_len.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}
