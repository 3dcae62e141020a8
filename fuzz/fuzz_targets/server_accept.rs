#![no_main]
use libfuzzer_sys::fuzz_target;

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures_lite::io::{AsyncRead, AsyncWrite, Cursor};
use raw_h1::server::{accept, RequestParser, ResponseWriter};
use raw_h1::{response, Request, ServerOptions, StatusCode};

/// Reads the fuzz input and discards everything written back. Clones share one cursor.
#[derive(Clone, Debug)]
struct RwWrapper(Arc<Mutex<Cursor<Vec<u8>>>>);

impl RwWrapper {
    fn new(input: Vec<u8>) -> Self {
        Self(Arc::new(Mutex::new(Cursor::new(input))))
    }
}

impl AsyncRead for RwWrapper {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut *self.0.lock().unwrap()).poll_read(cx, buf)
    }
}

impl AsyncWrite for RwWrapper {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

async fn echo(mut res: ResponseWriter<RwWrapper>, req: Request) -> raw_h1::Result<()> {
    res.write_status_line(StatusCode::OK).await?;
    res.write_headers(&response::default_headers(req.body().len()))
        .await?;
    res.write_body(req.body()).await?;
    Ok(())
}

fuzz_target!(|request: &[u8]| {
    // Splitting the input must not change the outcome.
    let whole = RequestParser::parse(request);
    let mut parser = RequestParser::new();
    let (a, b) = request.split_at(request.len() / 2);
    let split = match parser.feed(a).and_then(|_| parser.feed(b)) {
        Ok(_) => parser.finish(),
        Err(err) => Err(err),
    };
    assert_eq!(whole, split);

    let opts = ServerOptions::default().with_read_buffer_size(7);
    futures_lite::future::block_on(accept(RwWrapper::new(request.to_vec()), echo, &opts))
        .ok();
});
