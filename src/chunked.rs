//! Chunked transfer coding framing.
//!
//! https://tools.ietf.org/html/rfc7230#section-4.1

pub(crate) const CRLF: &[u8] = b"\r\n";

/// The zero-size chunk. The CRLF closing the message is left to the trailer section.
pub(crate) const LAST_CHUNK: &[u8] = b"0\r\n";

/// Write the size line that precedes a chunk of `len` bytes.
pub(crate) fn encode_chunk_size(buf: &mut Vec<u8>, len: usize) {
    buf.extend_from_slice(format!("{:x}\r\n", len).as_bytes());
}
