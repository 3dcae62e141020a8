use std::future::Future;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use async_global_executor::Task;
use async_io::{Async, Timer};
use futures_lite::future;
use log::{debug, error, warn};

use super::{accept, ResponseWriter, ServerOptions};
use crate::Request;

/// How long the accept loop waits after a failed accept.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A TCP connection as seen by a handler.
pub type Connection = async_dup::Arc<Async<TcpStream>>;

/// A running HTTP server.
///
/// Every accepted connection is served on its own task: one request is
/// decoded, passed to the handler, and the connection is closed once the
/// handler returns.
///
/// Dropping the server without calling [`stop`](Server::stop) cancels the
/// accept loop as well.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    closed: Arc<AtomicBool>,
    stop: Sender<()>,
    accept_loop: Task<()>,
}

impl Server {
    /// Listen on `port` on all interfaces and serve connections with `handler`.
    pub fn start<F, Fut>(port: u16, handler: F) -> io::Result<Self>
    where
        F: Fn(ResponseWriter<Connection>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<()>> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        Self::start_with_opts(addr, handler, ServerOptions::default())
    }

    /// Listen on `addr` and serve connections with `handler`.
    pub fn start_with_opts<F, Fut>(
        addr: SocketAddr,
        handler: F,
        opts: ServerOptions,
    ) -> io::Result<Self>
    where
        F: Fn(ResponseWriter<Connection>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<()>> + Send + 'static,
    {
        let listener = Async::<TcpListener>::bind(addr)?;
        let local_addr = listener.get_ref().local_addr()?;
        debug!("listening on {}", local_addr);

        let closed = Arc::new(AtomicBool::new(false));
        let (stop, stopped) = async_channel::bounded(1);
        let accept_loop = async_global_executor::spawn(accept_loop(
            listener,
            Arc::new(handler),
            opts,
            closed.clone(),
            stopped,
        ));

        Ok(Self {
            local_addr,
            closed,
            stop,
            accept_loop,
        })
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and close the listener.
    ///
    /// Connections that were already accepted are served to completion.
    pub async fn stop(self) {
        self.closed.store(true, Ordering::SeqCst);
        self.stop.close();
        self.accept_loop.await;
        debug!("stopped listening on {}", self.local_addr);
    }
}

async fn accept_loop<F, Fut>(
    listener: Async<TcpListener>,
    handler: Arc<F>,
    opts: ServerOptions,
    closed: Arc<AtomicBool>,
    stopped: Receiver<()>,
) where
    F: Fn(ResponseWriter<Connection>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = crate::Result<()>> + Send + 'static,
{
    loop {
        // Closing the stop channel stands in for closing the listener under a blocked accept.
        let accepted = future::or(async { Some(listener.accept().await) }, async {
            let _ = stopped.recv().await;
            None
        })
        .await;

        let (stream, peer) = match accepted {
            Some(Ok(conn)) => conn,
            Some(Err(_)) | None if closed.load(Ordering::SeqCst) => break,
            Some(Err(err)) => {
                accept_failed(err).await;
                continue;
            }
            // The server handle is gone.
            None => break,
        };

        debug!("accepted connection from {}", peer);
        let stream = async_dup::Arc::new(stream);
        let handler = handler.clone();
        let opts = opts.clone();
        async_global_executor::spawn(async move {
            let res = accept(stream, |res, req| handler(res, req), &opts).await;
            if let Err(err) = res {
                warn!("connection from {} failed: {}", peer, err);
            }
            debug!("closed connection from {}", peer);
        })
        .detach();
    }

    drop(listener);
}

/// Log a failed accept and pause, so that a persistent failure such as
/// running out of file descriptors does not spin the loop.
async fn accept_failed(err: io::Error) {
    error!("failed to accept connection: {}", err);
    Timer::after(ACCEPT_ERROR_BACKOFF).await;
}
