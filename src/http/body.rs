//! Request-body decoding and chunked response encoding (spec §4.4).
//!
//! Grounded on the teacher's `Body`/`StreamBody` framing concept
//! (`body.rs`) — fixed-length vs. streamed bodies — reimplemented as raw
//! chunked-transfer-coding parsing/writing since this engine owns the wire
//! format itself instead of delegating to `http_body`.

use crate::error::{Error, Result};
use crate::http::framing::ByteSource;
use crate::http::request::BodyMode;

/// Read a full request body per `mode`, capped at `max_size` bytes.
pub fn read_body(src: &mut ByteSource, mode: BodyMode, max_size: usize, timeout_ms: u64) -> Result<Vec<u8>> {
    match mode {
        BodyMode::None => Ok(Vec::new()),
        BodyMode::Fixed(n) => {
            if n > max_size {
                return Err(Error::BadRequest);
            }
            src.read_exact(n, timeout_ms)
        }
        BodyMode::Chunked => read_chunked(src, max_size, timeout_ms),
    }
}

fn read_chunked(src: &mut ByteSource, max_size: usize, timeout_ms: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let size_line = src.read_line(timeout_ms)?;
        let size_line = std::str::from_utf8(&size_line).map_err(|_| Error::BadChunkedEncoding)?;
        // Chunk extensions after ';' are discarded (spec §4.4).
        let size_tok = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_tok, 16).map_err(|_| Error::BadChunkedEncoding)?;
        if size == 0 {
            // Optional trailers, terminated by an empty line.
            loop {
                let trailer = src.read_line(timeout_ms)?;
                if trailer.is_empty() {
                    break;
                }
            }
            break;
        }
        if out.len() + size > max_size {
            return Err(Error::BadRequest);
        }
        let chunk = src.read_exact(size, timeout_ms)?;
        out.extend_from_slice(&chunk);
        let crlf = src.read_exact(2, timeout_ms)?;
        if crlf != b"\r\n" {
            return Err(Error::BadChunkedEncoding);
        }
    }
    Ok(out)
}

/// Encode one chunk for the chunked *response* transfer coding.
pub fn encode_chunk(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 16);
    out.extend_from_slice(format!("{:x}\r\n", data.len()).as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

/// The terminating chunk for a chunked response.
pub fn final_chunk() -> &'static [u8] {
    b"0\r\n\r\n"
}

/// Decode a complete chunked body, as written by [`encode_chunk`]/
/// [`final_chunk`] — the inverse operation, used to test the round-trip
/// property from spec §8.
pub fn decode_chunked_bytes(mut data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let nl = data
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or(Error::BadChunkedEncoding)?;
        let size_line = std::str::from_utf8(&data[..nl]).map_err(|_| Error::BadChunkedEncoding)?;
        let size_tok = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_tok, 16).map_err(|_| Error::BadChunkedEncoding)?;
        data = &data[nl + 2..];
        if size == 0 {
            break;
        }
        if data.len() < size + 2 {
            return Err(Error::BadChunkedEncoding);
        }
        out.extend_from_slice(&data[..size]);
        data = &data[size..];
        if &data[..2] != b"\r\n" {
            return Err(Error::BadChunkedEncoding);
        }
        data = &data[2..];
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memnet::MemConn;

    #[test]
    fn chunked_request_body_decodes() {
        let (mut a, mut b) = MemConn::pair();
        b.send(b"5\r\nhello\r\n0\r\n\r\n", 0).unwrap();
        let mut src = ByteSource::new(&mut a, 4096);
        let body = read_body(&mut src, BodyMode::Chunked, 1024, 0).unwrap();
        assert_eq!(body, b"hello");
    }

    #[test]
    fn malformed_chunk_size_errors() {
        let (mut a, mut b) = MemConn::pair();
        b.send(b"zzz\r\nhello\r\n0\r\n\r\n", 0).unwrap();
        let mut src = ByteSource::new(&mut a, 4096);
        assert!(matches!(
            read_body(&mut src, BodyMode::Chunked, 1024, 0),
            Err(Error::BadChunkedEncoding)
        ));
    }

    #[test]
    fn encode_then_decode_roundtrips_for_arbitrary_body() {
        let body = b"the quick brown fox jumps over the lazy dog".to_vec();
        let mut wire = Vec::new();
        for chunk in body.chunks(7) {
            wire.extend(encode_chunk(chunk));
        }
        wire.extend_from_slice(final_chunk());
        assert_eq!(decode_chunked_bytes(&wire).unwrap(), body);
    }
}
