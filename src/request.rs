use crate::Headers;

/// The only protocol version this crate speaks.
pub(crate) const HTTP_1_1: &str = "HTTP/1.1";

/// A decoded HTTP request.
///
/// Produced by [`RequestParser`](crate::server::RequestParser) once the whole
/// message has arrived and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    target: String,
    headers: Headers,
    body: Vec<u8>,
}

impl Request {
    pub(crate) fn new(method: String, target: String, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            method,
            target,
            headers,
            body,
        }
    }

    /// The request method, e.g. `GET`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request-target exactly as sent.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The protocol version, always `HTTP/1.1`.
    pub fn version(&self) -> &'static str {
        HTTP_1_1
    }

    /// All header fields.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a single header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The body, empty unless `Content-Length` was sent.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Take the body out of the request.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}
