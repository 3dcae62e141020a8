use std::io;

use thiserror::Error;

use crate::server::WriterState;

/// A generic result type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors when handling a connection.
#[derive(Debug, Error)]
pub enum Error {
    /// The peer sent a request this server cannot decode.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The response writer rejected a call or failed to write.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Reading from or writing to the connection failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The peer stalled longer than the configured read timeout.
    #[error("read timed out")]
    Timeout,
}

/// Reasons a request could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The request line did not have three tokens.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// The method contained something other than uppercase letters.
    #[error("invalid method: {0:?}")]
    InvalidMethod(String),

    /// Only `HTTP/1.1` is accepted.
    #[error("unsupported HTTP version: {0:?}")]
    UnsupportedVersion(String),

    /// A header line had no colon.
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    /// A field-name was empty or contained whitespace, a colon or a control character.
    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// The head contained bytes that are not UTF-8.
    #[error("request head is not valid UTF-8")]
    InvalidUtf8,

    /// `Content-Length` was not a non-negative integer.
    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),

    /// The request head grew past the configured bound.
    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge {
        /// The configured bound.
        limit: usize,
    },

    /// The declared body is larger than the configured bound.
    #[error("declared body of {declared} bytes exceeds {limit} bytes")]
    BodyTooLarge {
        /// The declared `Content-Length`.
        declared: usize,
        /// The configured bound.
        limit: usize,
    },

    /// The stream ended before the request was complete.
    #[error("stream closed before the request was complete")]
    Incomplete,
}

/// Errors returned by [`ResponseWriter`](crate::server::ResponseWriter).
#[derive(Debug, Error)]
pub enum WriteError {
    /// The call is not valid in the writer's current state. Nothing was written.
    #[error("{call} called out of order: expected {expected}, writer is at {actual}")]
    OutOfOrder {
        /// The rejected call.
        call: &'static str,
        /// The state the call must follow.
        expected: WriterState,
        /// The state the writer was in.
        actual: WriterState,
    },

    /// The underlying sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl WriteError {
    /// Returns `true` if the error is a sequencing mistake rather than an I/O failure.
    pub fn is_out_of_order(&self) -> bool {
        matches!(self, WriteError::OutOfOrder { .. })
    }
}
