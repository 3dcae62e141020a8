//! HTTP/1.1 message framing over raw byte streams.
//!
//! A connection carries exactly one exchange: the server decodes a request,
//! hands it to a handler together with a response writer, and closes the
//! connection once the handler returns.
//!
//! - [`server::RequestParser`] decodes requests from fragments of any size.
//! - [`server::ResponseWriter`] encodes responses, fixed-length or chunked.
//! - [`Server`] accepts TCP connections and drives both.
//!
//! ```txt
//!            decode                    encode
//!   bytes  ---------->  Request  -->  Handler  ---------->  bytes
//!          RequestParser                    ResponseWriter
//! ```
//!
//! # Example
//!
//! ```no_run
//! use raw_h1::server::{Connection, ResponseWriter};
//! use raw_h1::{Headers, Request, Server, StatusCode};
//!
//! async fn handle(mut res: ResponseWriter<Connection>, _req: Request) -> raw_h1::Result<()> {
//!     let mut headers = Headers::new();
//!     headers.set("Content-Length", "2");
//!     res.write_status_line(StatusCode::OK).await?;
//!     res.write_headers(&headers).await?;
//!     res.write_body(b"OK").await?;
//!     Ok(())
//! }
//!
//! # fn main() -> std::io::Result<()> {
//! let server = Server::start(42069, handle)?;
//! # futures_lite::future::block_on(server.stop());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(future_incompatible, rust_2018_idioms)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

/// The maximum length of a request head the server buffers by default.
pub const MAX_HEAD_LENGTH: usize = 8 * 1024;

mod chunked;
mod error;
mod headers;
mod request;
mod status;
mod timeout;

pub mod response;
pub mod server;

pub use error::{Error, ParseError, Result, WriteError};
pub use headers::Headers;
pub use request::Request;
pub use server::{Server, ServerOptions};
pub use status::StatusCode;
