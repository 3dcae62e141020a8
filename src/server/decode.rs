//! Decode HTTP requests on the server.

use log::trace;

use crate::request::HTTP_1_1;
use crate::{Headers, ParseError, Request};

const CRLF: &[u8] = b"\r\n";

/// Where a [`RequestParser`] is in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for `METHOD SP TARGET SP VERSION CRLF`.
    AwaitingRequestLine,
    /// Waiting for header lines or the blank line ending them.
    AwaitingHeaders,
    /// Waiting for the rest of a `Content-Length` body.
    AwaitingBody,
    /// The request is complete.
    Done,
    /// The request is malformed; the parser will not make further progress.
    Failed,
}

/// Whether a call to [`RequestParser::feed`] completed the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More bytes are needed.
    Partial,
    /// The request is complete and can be taken with [`RequestParser::finish`].
    Complete,
}

/// Bounds on how much a [`RequestParser`] buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Maximum length of the request line plus headers, including line endings.
    pub max_head_len: Option<usize>,
    /// Maximum accepted `Content-Length`.
    pub max_body_len: Option<usize>,
}

/// An incremental HTTP/1.1 request decoder.
///
/// Bytes are handed over with [`feed`](RequestParser::feed) in whatever
/// fragments the transport produced them. The parser keeps the bytes it could
/// not use yet and picks up where it left off on the next call.
///
/// ```
/// use raw_h1::server::{RequestParser, Status};
///
/// let mut parser = RequestParser::new();
/// assert_eq!(parser.feed(b"GET / HT").unwrap().1, Status::Partial);
/// assert_eq!(parser.feed(b"TP/1.1\r\n\r\n").unwrap().1, Status::Complete);
///
/// let req = parser.finish().unwrap();
/// assert_eq!(req.method(), "GET");
/// assert_eq!(req.target(), "/");
/// ```
#[derive(Debug)]
pub struct RequestParser {
    /// Received bytes not yet turned into fields.
    buf: Vec<u8>,
    /// Start of the unparsed bytes in `buf`.
    pos: usize,
    /// Bytes of `buf` before this index are known not to start a CRLF.
    scanned: usize,
    phase: Phase,
    limits: Limits,
    /// Bytes of the head parsed so far.
    head_len: usize,
    method: String,
    target: String,
    headers: Headers,
    body: Vec<u8>,
    body_remaining: usize,
    error: Option<ParseError>,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    /// Create a parser that buffers without bound.
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create a parser that fails once the head or the declared body passes a bound.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            scanned: 0,
            phase: Phase::AwaitingRequestLine,
            limits,
            head_len: 0,
            method: String::new(),
            target: String::new(),
            headers: Headers::new(),
            body: Vec::new(),
            body_remaining: 0,
            error: None,
        }
    }

    /// Decode a request that is entirely contained in `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Request, ParseError> {
        let mut parser = Self::new();
        parser.feed(bytes)?;
        parser.finish()
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Bytes received after the end of a complete request.
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Hand the next fragment of the stream to the parser.
    ///
    /// Returns how many buffered bytes were turned into request fields during
    /// this call, and whether the request is now complete. Bytes past the end
    /// of the request are kept and available from
    /// [`remaining`](RequestParser::remaining).
    ///
    /// Once an error is returned the parser is in [`Phase::Failed`] and every
    /// later call returns the same error.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(usize, Status), ParseError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        self.buf.extend_from_slice(bytes);
        let start = self.pos;
        let res = self.advance();
        let consumed = self.pos - start;
        self.compact();

        match res {
            Ok(()) => Ok((consumed, self.status())),
            Err(err) => {
                trace!("request rejected: {}", err);
                self.phase = Phase::Failed;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Take the decoded request.
    ///
    /// Call this once [`feed`](RequestParser::feed) reported
    /// [`Status::Complete`], or when the stream ended: a request that is not
    /// complete by then is [`ParseError::Incomplete`].
    pub fn finish(self) -> Result<Request, ParseError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        match self.phase {
            Phase::Done => Ok(Request::new(
                self.method,
                self.target,
                self.headers,
                self.body,
            )),
            _ => Err(ParseError::Incomplete),
        }
    }

    fn status(&self) -> Status {
        if self.phase == Phase::Done {
            Status::Complete
        } else {
            Status::Partial
        }
    }

    /// Consume as many complete units as are buffered.
    fn advance(&mut self) -> Result<(), ParseError> {
        loop {
            match self.phase {
                Phase::AwaitingRequestLine => match self.next_line()? {
                    Some(line) => {
                        self.parse_request_line(&line)?;
                        self.phase = Phase::AwaitingHeaders;
                    }
                    None => return Ok(()),
                },
                Phase::AwaitingHeaders => match self.next_line()? {
                    Some(line) if line.is_empty() => self.start_body()?,
                    Some(line) => self.parse_header(&line)?,
                    None => return Ok(()),
                },
                Phase::AwaitingBody => {
                    let available = self.buf.len() - self.pos;
                    let n = available.min(self.body_remaining);
                    self.body.extend_from_slice(&self.buf[self.pos..self.pos + n]);
                    self.pos += n;
                    self.body_remaining -= n;
                    if self.body_remaining > 0 {
                        return Ok(());
                    }
                    trace!("body complete: {} bytes", self.body.len());
                    self.phase = Phase::Done;
                }
                Phase::Done | Phase::Failed => return Ok(()),
            }
        }
    }

    /// Take the next CRLF-terminated line, without its terminator.
    fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        let from = self.scanned.max(self.pos);
        let found = self.buf[from..]
            .windows(CRLF.len())
            .position(|window| window == CRLF);

        let end = match found {
            Some(offset) => from + offset,
            None => {
                // A trailing CR may still be followed by LF.
                self.scanned = self.buf.len().saturating_sub(1).max(self.pos);
                self.check_head_len(self.buf.len() - self.pos)?;
                return Ok(None);
            }
        };

        let line = std::str::from_utf8(&self.buf[self.pos..end])
            .map_err(|_| ParseError::InvalidUtf8)?
            .to_owned();
        let line_len = end + CRLF.len() - self.pos;
        self.check_head_len(line_len)?;
        self.head_len += line_len;
        self.pos = end + CRLF.len();
        self.scanned = self.pos;
        Ok(Some(line))
    }

    fn check_head_len(&self, pending: usize) -> Result<(), ParseError> {
        match self.limits.max_head_len {
            Some(limit) if self.head_len + pending > limit => {
                Err(ParseError::HeadTooLarge { limit })
            }
            _ => Ok(()),
        }
    }

    fn parse_request_line(&mut self, line: &str) -> Result<(), ParseError> {
        let parts: Vec<&str> = line.split_ascii_whitespace().collect();
        let (method, target, version) = match parts.as_slice() {
            [method, target, version] => (*method, *target, *version),
            _ => return Err(ParseError::MalformedRequestLine(line.to_owned())),
        };

        if !method.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ParseError::InvalidMethod(method.to_owned()));
        }
        if version != HTTP_1_1 {
            return Err(ParseError::UnsupportedVersion(version.to_owned()));
        }

        trace!("request line: {} {} {}", method, target, version);
        self.method = method.to_owned();
        self.target = target.to_owned();
        Ok(())
    }

    fn parse_header(&mut self, line: &str) -> Result<(), ParseError> {
        let colon = line
            .find(':')
            .ok_or_else(|| ParseError::MalformedHeader(line.to_owned()))?;
        let name = line[..colon].trim();
        let value = line[colon + 1..].trim();

        if !is_token(name) {
            return Err(ParseError::InvalidHeaderName(name.to_owned()));
        }

        trace!("header: {}: {}", name, value);
        self.headers.set(name, value);
        Ok(())
    }

    fn start_body(&mut self) -> Result<(), ParseError> {
        let len = match self.headers.get("Content-Length") {
            Some(value) => parse_content_length(value)?,
            None => 0,
        };
        if let Some(limit) = self.limits.max_body_len {
            if len > limit {
                return Err(ParseError::BodyTooLarge {
                    declared: len,
                    limit,
                });
            }
        }

        trace!("head complete: expecting {} body bytes", len);
        self.body_remaining = len;
        self.phase = if len == 0 {
            Phase::Done
        } else {
            Phase::AwaitingBody
        };
        Ok(())
    }

    /// Drop bytes that have been parsed.
    fn compact(&mut self) {
        if self.pos == 0 {
            return;
        }
        self.buf.drain(..self.pos);
        self.scanned = self.scanned.saturating_sub(self.pos);
        self.pos = 0;
    }
}

fn is_token(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_graphic() && b != b':')
}

fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    let invalid = || ParseError::InvalidContentLength(value.to_owned());
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}
