#![allow(dead_code)]

use std::fmt::{self, Debug, Display};
use std::io;
use std::pin::Pin;
use std::sync::RwLock;
use std::task::{Context, Poll, Waker};

use async_dup::Arc;
use futures_lite::io::{AsyncRead, AsyncWrite};

/// One end of an in-memory connection.
#[derive(Default, Clone, Debug)]
pub struct TestIO {
    pub read: Arc<CloseableCursor>,
    pub write: Arc<CloseableCursor>,
}

#[derive(Default)]
pub struct CloseableCursor {
    data: RwLock<Vec<u8>>,
    cursor: RwLock<usize>,
    waker: RwLock<Option<Waker>>,
    closed: RwLock<bool>,
}

impl CloseableCursor {
    fn len(&self) -> usize {
        self.data.read().unwrap().len()
    }

    fn cursor(&self) -> usize {
        *self.cursor.read().unwrap()
    }

    fn close(&self) {
        *self.closed.write().unwrap() = true;
        if let Some(waker) = self.waker.write().unwrap().take() {
            waker.wake();
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read().unwrap()
    }

    fn push(&self, buf: &[u8]) {
        self.data.write().unwrap().extend_from_slice(buf);
        if let Some(waker) = self.waker.write().unwrap().take() {
            waker.wake();
        }
    }
}

impl Display for CloseableCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = &*self.data.read().unwrap();
        let s = std::str::from_utf8(data).unwrap_or("not utf8");
        write!(f, "{}", s)
    }
}

impl Debug for CloseableCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseableCursor")
            .field(
                "data",
                &std::str::from_utf8(&self.data.read().unwrap()).unwrap_or("not utf8"),
            )
            .field("closed", &*self.closed.read().unwrap())
            .field("cursor", &*self.cursor.read().unwrap())
            .finish()
    }
}

impl TestIO {
    /// Create a connected `(client, server)` pair.
    pub fn new() -> (TestIO, TestIO) {
        let client = Arc::new(CloseableCursor::default());
        let server = Arc::new(CloseableCursor::default());

        (
            TestIO {
                read: client.clone(),
                write: server.clone(),
            },
            TestIO {
                read: server,
                write: client,
            },
        )
    }

    /// Send bytes to the other end.
    pub fn send(&self, buf: &[u8]) {
        self.write.push(buf);
    }

    /// Close this end for writing; the other end reads EOF once it has drained the data.
    pub fn close(&mut self) {
        self.write.close();
    }

    /// Everything the other end wrote so far.
    pub fn received(&self) -> String {
        self.read.to_string()
    }
}

impl AsyncRead for &CloseableCursor {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let len = self.len();
        let cursor = self.cursor();
        if cursor < len {
            let data = &*self.data.read().unwrap();
            let bytes_to_copy = buf.len().min(len - cursor);
            buf[..bytes_to_copy].copy_from_slice(&data[cursor..cursor + bytes_to_copy]);
            *self.cursor.write().unwrap() += bytes_to_copy;
            Poll::Ready(Ok(bytes_to_copy))
        } else if *self.closed.read().unwrap() {
            Poll::Ready(Ok(0))
        } else {
            *self.waker.write().unwrap() = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl AsyncWrite for &CloseableCursor {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if *self.closed.read().unwrap() {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        } else {
            self.push(buf);
            Poll::Ready(Ok(buf.len()))
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.close();
        Poll::Ready(Ok(()))
    }
}

impl AsyncRead for TestIO {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut &*self.read).poll_read(cx, buf)
    }
}

impl AsyncWrite for TestIO {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut &*self.write).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut &*self.write).poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut &*self.write).poll_close(cx)
    }
}
