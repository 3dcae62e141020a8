//! Encode HTTP responses on the server.

use std::fmt;

use futures_lite::io::{AsyncWrite, AsyncWriteExt};
use log::trace;

use crate::chunked::{encode_chunk_size, CRLF, LAST_CHUNK};
use crate::request::HTTP_1_1;
use crate::{Headers, StatusCode, WriteError};

/// How far a [`ResponseWriter`] has progressed through a response.
///
/// States only move forward:
///
/// ```txt
/// Start -> StatusWritten -> HeadersWritten -+-> BodyWritten
///                                           |
///                                           +-> ChunkWriting -> ChunkDone -> TrailersWritten
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Nothing written yet.
    Start,
    /// The status line is on the wire.
    StatusWritten,
    /// The header section is on the wire.
    HeadersWritten,
    /// A fixed-length body is on the wire. Terminal.
    BodyWritten,
    /// At least one chunk is on the wire.
    ChunkWriting,
    /// The last chunk is on the wire.
    ChunkDone,
    /// The trailer section is on the wire. Terminal.
    TrailersWritten,
}

impl WriterState {
    /// Returns `true` once the response is complete.
    pub fn is_terminal(self) -> bool {
        matches!(self, WriterState::BodyWritten | WriterState::TrailersWritten)
    }
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WriterState::Start => "start",
            WriterState::StatusWritten => "status line written",
            WriterState::HeadersWritten => "headers written",
            WriterState::BodyWritten => "body written",
            WriterState::ChunkWriting => "writing chunks",
            WriterState::ChunkDone => "chunks done",
            WriterState::TrailersWritten => "trailers written",
        };
        f.write_str(s)
    }
}

/// A forward-only HTTP/1.1 response encoder.
///
/// Every call checks that it follows the previous one. A call made out of
/// order returns [`WriteError::OutOfOrder`] and writes nothing; what earlier
/// calls wrote stays on the wire.
///
/// ```
/// # futures_lite::future::block_on(async {
/// use raw_h1::server::ResponseWriter;
/// use raw_h1::{Headers, StatusCode};
///
/// let mut res = ResponseWriter::new(Vec::new());
/// let mut headers = Headers::new();
/// headers.set("Content-Length", "2");
///
/// res.write_status_line(StatusCode::OK).await?;
/// res.write_headers(&headers).await?;
/// res.write_body(b"OK").await?;
///
/// assert_eq!(res.into_inner(), b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK");
/// # Ok::<(), raw_h1::WriteError>(())
/// # }).unwrap();
/// ```
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
    state: WriterState,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    /// Create a new instance writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: WriterState::Start,
        }
    }

    /// The current state.
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Get back the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write `HTTP/1.1 <code> <reason>`.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        self.expect("write_status_line", &[WriterState::Start])?;

        let line = format!(
            "{} {} {}\r\n",
            HTTP_1_1,
            status,
            status.canonical_reason()
        );
        self.writer.write_all(line.as_bytes()).await?;
        self.state = WriterState::StatusWritten;
        Ok(())
    }

    /// Write the header section, including the blank line that ends it.
    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), WriteError> {
        self.expect("write_headers", &[WriterState::StatusWritten])?;

        self.writer.write_all(&encode_fields(headers)).await?;
        self.state = WriterState::HeadersWritten;
        Ok(())
    }

    /// Write a fixed-length body. This completes the response.
    ///
    /// The caller is responsible for having declared a matching `Content-Length`.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, WriteError> {
        self.expect("write_body", &[WriterState::HeadersWritten])?;

        self.writer.write_all(body).await?;
        self.writer.flush().await?;
        self.state = WriterState::BodyWritten;
        Ok(body.len())
    }

    /// Write one chunk of a chunked body.
    ///
    /// An empty chunk would end the body, so it is skipped: nothing is written
    /// and the state does not change.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize, WriteError> {
        self.expect(
            "write_chunk",
            &[WriterState::HeadersWritten, WriterState::ChunkWriting],
        )?;
        if chunk.is_empty() {
            return Ok(0);
        }

        trace!("writing chunk of {} bytes", chunk.len());
        let mut size = Vec::with_capacity(18);
        encode_chunk_size(&mut size, chunk.len());
        self.writer.write_all(&size).await?;
        self.writer.write_all(chunk).await?;
        self.writer.write_all(CRLF).await?;
        self.state = WriterState::ChunkWriting;
        Ok(chunk.len())
    }

    /// Write the last chunk. Trailers, if any, follow.
    pub async fn write_chunks_done(&mut self) -> Result<(), WriteError> {
        self.expect("write_chunks_done", &[WriterState::ChunkWriting])?;

        self.writer.write_all(LAST_CHUNK).await?;
        self.state = WriterState::ChunkDone;
        Ok(())
    }

    /// Write the trailer section, ending the message. This completes the response.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), WriteError> {
        self.expect("write_trailers", &[WriterState::ChunkDone])?;

        self.writer.write_all(&encode_fields(trailers)).await?;
        self.writer.flush().await?;
        self.state = WriterState::TrailersWritten;
        Ok(())
    }

    /// Check that the writer is in one of `allowed`.
    ///
    /// The first entry is reported as the expected predecessor.
    fn expect(&self, call: &'static str, allowed: &[WriterState]) -> Result<(), WriteError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(WriteError::OutOfOrder {
            call,
            expected: allowed[0],
            actual: self.state,
        })
    }
}

/// Serialize fields as `Name: Value` lines followed by a blank line.
fn encode_fields(fields: &Headers) -> Vec<u8> {
    let mut buf = Vec::new();
    for (name, value) in fields.iter() {
        buf.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    buf.extend_from_slice(CRLF);
    buf
}
