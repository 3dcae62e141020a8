//! Process HTTP connections on the server.

use std::future::Future;
use std::time::Duration;

use futures_lite::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use log::{debug, trace};

use crate::response::default_headers;
use crate::timeout::timeout;
use crate::{Error, Request, StatusCode, MAX_HEAD_LENGTH};

mod decode;
mod encode;
mod listener;

pub use decode::{Limits, Phase, RequestParser, Status};
pub use encode::{ResponseWriter, WriterState};
pub use listener::{Connection, Server};

const BAD_REQUEST_BODY: &[u8] = b"Bad Request\n";

/// Configure the server.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Size of each read from the connection. Defaults to 8kb.
    read_buffer_size: usize,
    /// Bound on the request head. Defaults to 8kb.
    max_head_len: Option<usize>,
    /// Bound on a declared request body. Unbounded by default.
    max_body_len: Option<usize>,
    /// Timeout for each read while decoding the request. Disabled by default.
    read_timeout: Option<Duration>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: 8 * 1024,
            max_head_len: Some(MAX_HEAD_LENGTH),
            max_body_len: None,
            read_timeout: None,
        }
    }
}

impl ServerOptions {
    /// Set the size of each read from the connection.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Bound the request line plus headers. `None` removes the bound.
    pub fn with_max_head_len(mut self, len: Option<usize>) -> Self {
        self.max_head_len = len;
        self
    }

    /// Bound the `Content-Length` a request may declare. `None` removes the bound.
    pub fn with_max_body_len(mut self, len: Option<usize>) -> Self {
        self.max_body_len = len;
        self
    }

    /// Give up on a connection whose peer stalls longer than `timeout` mid-request.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    fn limits(&self) -> Limits {
        Limits {
            max_head_len: self.max_head_len,
            max_body_len: self.max_body_len,
        }
    }
}

/// Serve a single request on an established connection, then close it.
///
/// The handler is only called for a well-formed request and is expected to
/// drive the writer to a terminal state. A malformed request is answered with
/// `400 Bad Request` without calling the handler.
pub async fn accept<RW, F, Fut>(io: RW, handler: F, opts: &ServerOptions) -> crate::Result<()>
where
    RW: AsyncRead + AsyncWrite + Clone + Unpin,
    F: FnOnce(ResponseWriter<RW>, Request) -> Fut,
    Fut: Future<Output = crate::Result<()>>,
{
    let res = respond(io.clone(), handler, opts).await;

    let mut io = io;
    if let Err(err) = io.close().await {
        trace!("error closing connection: {}", err);
    }
    res
}

async fn respond<RW, F, Fut>(io: RW, handler: F, opts: &ServerOptions) -> crate::Result<()>
where
    RW: AsyncRead + AsyncWrite + Clone + Unpin,
    F: FnOnce(ResponseWriter<RW>, Request) -> Fut,
    Fut: Future<Output = crate::Result<()>>,
{
    let mut reader = io.clone();
    let req = match decode(&mut reader, opts).await {
        Ok(req) => req,
        Err(Error::Parse(err)) => {
            debug!("rejecting request: {}", err);
            return reject(io).await;
        }
        Err(err) => return Err(err),
    };

    debug!("{} {}", req.method(), req.target());
    handler(ResponseWriter::new(io), req).await
}

/// Read from the connection until a complete request has been decoded.
async fn decode<R>(reader: &mut R, opts: &ServerOptions) -> crate::Result<Request>
where
    R: AsyncRead + Unpin,
{
    let mut parser = RequestParser::with_limits(opts.limits());
    let mut buf = vec![0; opts.read_buffer_size];

    loop {
        let n = match opts.read_timeout {
            Some(dur) => timeout(dur, reader.read(&mut buf)).await??,
            None => reader.read(&mut buf).await?,
        };

        // The peer closed its side before the request was complete.
        if n == 0 {
            trace!("stream ended in phase {:?}", parser.phase());
            return Ok(parser.finish()?);
        }

        if let (_, Status::Complete) = parser.feed(&buf[..n])? {
            return Ok(parser.finish()?);
        }
    }
}

async fn reject<W>(io: W) -> crate::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut res = ResponseWriter::new(io);
    res.write_status_line(StatusCode::BAD_REQUEST).await?;
    res.write_headers(&default_headers(BAD_REQUEST_BODY.len()))
        .await?;
    res.write_body(BAD_REQUEST_BODY).await?;
    Ok(())
}
